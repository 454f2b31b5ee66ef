//! One ranking session: a path stream pumped into an incremental ranker.

use crate::path_source::{PathStream, StopHandle, StreamPoll};
use crate::ranker::IncrementalRanker;
use crate::types::{RankedSnapshot, SessionId};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Paths drained per pump even when the budget is already spent, so a busy
/// caller still makes progress.
pub const MIN_DRAIN_BATCH: usize = 64;

#[derive(Debug)]
pub struct SearchSession {
    id: SessionId,
    ranker: IncrementalRanker,
    stream: PathStream,
    started_at: Instant,
}

impl SearchSession {
    pub fn new(id: SessionId, ranker: IncrementalRanker, stream: PathStream) -> Self {
        info!(session = %id, query = ranker.query(), "Search session started");
        Self {
            id,
            ranker,
            stream,
            started_at: Instant::now(),
        }
    }

    #[inline]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[inline]
    pub fn query(&self) -> &str {
        self.ranker.query()
    }

    #[inline]
    pub fn ranker(&self) -> &IncrementalRanker {
        &self.ranker
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.ranker.is_closed()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stream.stop_handle()
    }

    /// Latest ranked view without consuming anything.
    pub fn snapshot(&self) -> RankedSnapshot {
        self.ranker.snapshot()
    }

    /// Feeds one path. Once the ranker closes on its hard cap the producer is
    /// told to stop.
    pub fn feed(&mut self, path: impl Into<String>) -> Option<RankedSnapshot> {
        let snapshot = self.ranker.feed(path);
        if self.ranker.is_closed() && !self.stream.is_done() {
            debug!(session = %self.id, "Ranker closed, stopping producer");
            self.stream.cancel();
        }
        snapshot
    }

    /// Drains whatever the producer has ready into the ranker.
    ///
    /// Waits for more paths until `budget` runs out, draining at least
    /// [`MIN_DRAIN_BATCH`] ready paths regardless. Returns the newest snapshot
    /// emitted meanwhile; intermediate ones are dropped since only the latest
    /// is worth rendering.
    pub fn pump(&mut self, budget: Duration) -> Option<RankedSnapshot> {
        let deadline = Instant::now() + budget;
        let mut latest = None;
        let mut drained = 0usize;

        while !self.ranker.is_closed() {
            let now = Instant::now();
            if drained >= MIN_DRAIN_BATCH && now >= deadline {
                break;
            }

            let mut poll = self.stream.try_next();
            if poll == StreamPoll::Pending {
                let remaining = deadline.saturating_duration_since(now);
                if remaining.is_zero() {
                    break;
                }
                poll = self.stream.next_timeout(remaining);
            }

            match poll {
                StreamPoll::Path(path) => {
                    drained += 1;
                    if let Some(snapshot) = self.feed(path) {
                        latest = Some(snapshot);
                    }
                }
                StreamPoll::Pending => break,
                StreamPoll::Finished => {
                    latest = self.ranker.finish().or(latest);
                    self.log_completion("finished");
                }
                StreamPoll::Failed(message) => {
                    warn!(session = %self.id, %message, "Path producer failed, keeping partial results");
                    latest = self.ranker.finish().or(latest);
                    self.log_completion("failed");
                }
            }
        }

        latest
    }

    /// Pumps until the session closes or `timeout` elapses, then finalizes
    /// with whatever matched so far.
    pub fn run_to_end(&mut self, timeout: Duration) -> RankedSnapshot {
        let deadline = Instant::now() + timeout;
        while !self.ranker.is_closed() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                debug!(session = %self.id, ?timeout, "Session timed out");
                self.stream.cancel();
                if let Some(snapshot) = self.ranker.finish() {
                    return snapshot;
                }
                break;
            }
            self.pump(remaining.min(Duration::from_millis(100)));
        }
        self.ranker.snapshot()
    }

    /// Closes the session in favour of a newer one. Nothing is delivered
    /// afterwards.
    pub fn supersede(&mut self) {
        if !self.ranker.is_closed() {
            debug!(session = %self.id, total_seen = self.ranker.total_seen(), "Session superseded");
        }
        self.ranker.close();
        self.stream.cancel();
    }

    fn log_completion(&self, outcome: &str) {
        info!(
            session = %self.id,
            outcome,
            total_seen = self.ranker.total_seen(),
            total_matched = self.ranker.total_matched(),
            elapsed = ?self.started_at.elapsed(),
            "Search session completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_source::{PathSource, SourceRequest, StaticPathSource};
    use crate::ranker::RankerConfig;

    const WAIT: Duration = Duration::from_secs(5);

    fn open(source: &StaticPathSource, query: &str, config: RankerConfig) -> SearchSession {
        let request = SourceRequest {
            roots: Vec::new(),
            max_depth: 5,
            query: query.into(),
        };
        let stream = source.open(&request).unwrap();
        SearchSession::new(SessionId(1), IncrementalRanker::new(query, config), stream)
    }

    #[test]
    fn test_run_to_end_ranks_everything() {
        let source = StaticPathSource::new([
            "/home/u/Happy.txt",
            "/home/u/Application.docx",
            "/home/u/zebra.png",
        ]);
        let mut session = open(&source, "app", RankerConfig::default());

        let snapshot = session.run_to_end(WAIT);
        assert!(snapshot.is_final);
        assert!(session.is_closed());
        assert_eq!(snapshot.total_seen, 3);
        assert_eq!(snapshot.total_matched, 2);
        assert_eq!(snapshot.items[0].basename, "Application.docx");
    }

    #[test]
    fn test_producer_failure_keeps_partial_results() {
        let source = StaticPathSource::new(["/a/report.pdf", "/a/report.txt", "/a/report.md"])
            .failing_after(2, "permission denied");
        let mut session = open(&source, "report", RankerConfig::default());

        let snapshot = session.run_to_end(WAIT);
        assert!(snapshot.is_final);
        assert_eq!(snapshot.total_seen, 2);
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_hard_cap_stops_the_producer() {
        let paths: Vec<String> = (0..1000).map(|i| format!("/d/log{i:04}")).collect();
        let source = StaticPathSource::new(paths);
        let config = RankerConfig {
            max_results: 2,
            display_every: 1,
            hard_cap: 6,
        };
        let mut session = open(&source, "log", config);
        let stop = session.stop_handle();

        let snapshot = session.run_to_end(WAIT);
        assert!(snapshot.is_final);
        assert_eq!(snapshot.total_matched, 6);
        assert_eq!(snapshot.total_seen, 6);
        assert!(stop.is_stopped());
    }

    #[test]
    fn test_supersede_silences_the_session() {
        let source = StaticPathSource::new(["/x/alpha", "/x/alpine"]);
        let mut session = open(&source, "al", RankerConfig::default());

        session.supersede();
        assert!(session.is_closed());
        assert!(session.pump(Duration::from_millis(20)).is_none());
        assert!(session.feed("/x/also").is_none());
        assert_eq!(session.snapshot().total_seen, 0);
    }

    #[test]
    fn test_pump_returns_only_the_newest_snapshot() {
        let paths: Vec<String> = (0..20).map(|i| format!("/n/note{i:02}.md")).collect();
        let source = StaticPathSource::new(paths);
        let config = RankerConfig {
            max_results: 5,
            display_every: 1,
            hard_cap: 100,
        };
        let mut session = open(&source, "note", config);

        let mut last = None;
        while !session.is_closed() {
            if let Some(snapshot) = session.pump(Duration::from_millis(50)) {
                assert!(snapshot.len() <= 5);
                last = Some(snapshot);
            }
        }

        let last = last.expect("at least one snapshot");
        assert!(last.is_final);
        assert_eq!(last.total_seen, 20);
    }
}
