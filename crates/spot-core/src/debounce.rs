use std::time::{Duration, Instant};

pub const DEFAULT_SEARCH_DELAY: Duration = Duration::from_millis(50);

/// Coalesces bursts of values, releasing only the last one once `delay`
/// passed without a newer value.
///
/// The caller owns the clock: it polls whenever convenient, typically between
/// input events, and sleeps at most [`Debounce::time_until_ready`].
#[derive(Debug, Clone)]
pub struct Debounce<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debounce<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    #[inline]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replaces any pending value and restarts the delay.
    pub fn schedule(&mut self, value: T) {
        self.schedule_at(Instant::now(), value);
    }

    pub fn schedule_at(&mut self, now: Instant, value: T) {
        self.pending = Some((now + self.delay, value));
    }

    /// Drops the pending value, returning it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, value)| value)
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    /// Takes the pending value if its delay elapsed.
    pub fn poll(&mut self) -> Option<T> {
        self.poll_at(Instant::now())
    }

    pub fn poll_at(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((deadline, _)) if now >= *deadline => self.cancel(),
            _ => None,
        }
    }

    /// How long until [`poll_at`](Self::poll_at) would release a value.
    pub fn time_until_ready(&self, now: Instant) -> Option<Duration> {
        self.deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }
}

impl<T> Default for Debounce<T> {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_releases_after_delay() {
        let start = Instant::now();
        let mut debounce = Debounce::new(Duration::from_millis(50));
        debounce.schedule_at(start, "rep");

        assert_eq!(debounce.poll_at(start + Duration::from_millis(49)), None);
        assert_eq!(
            debounce.poll_at(start + Duration::from_millis(50)),
            Some("rep")
        );
        assert!(!debounce.is_pending());
        assert_eq!(debounce.poll_at(start + Duration::from_secs(1)), None);
    }

    #[test]
    fn test_reschedule_restarts_the_delay() {
        let start = Instant::now();
        let mut debounce = Debounce::new(Duration::from_millis(50));
        debounce.schedule_at(start, "r");
        debounce.schedule_at(start + Duration::from_millis(30), "re");

        assert_eq!(debounce.poll_at(start + Duration::from_millis(60)), None);
        assert_eq!(
            debounce.time_until_ready(start + Duration::from_millis(60)),
            Some(Duration::from_millis(20))
        );
        assert_eq!(
            debounce.poll_at(start + Duration::from_millis(80)),
            Some("re")
        );
    }

    #[test]
    fn test_cancel() {
        let mut debounce = Debounce::default();
        assert_eq!(debounce.delay(), DEFAULT_SEARCH_DELAY);

        debounce.schedule(1);
        assert!(debounce.deadline().is_some());
        assert_eq!(debounce.cancel(), Some(1));
        assert_eq!(debounce.time_until_ready(Instant::now()), None);
    }
}
