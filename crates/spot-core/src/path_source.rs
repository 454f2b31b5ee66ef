//! Producers of candidate paths.
//!
//! A [`PathSource`] starts a producer per query and hands back a
//! [`PathStream`]. Producers run on their own thread and push paths through a
//! bounded channel. Cancelling or dropping the stream raises the stop flag and
//! drops the receiver; producers observe either and quit.

use crate::error::{Error, Result};
use crate::path_utils::{existing_dirs, has_hidden_component};
use crate::score::contains_ignore_case;
use ignore::WalkBuilder;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TryRecvError};
use std::time::Duration;
use tracing::{debug, error, info};

pub const DEFAULT_MAX_DEPTH: usize = 5;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// What a path source is asked to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRequest {
    pub roots: Vec<PathBuf>,
    pub max_depth: usize,
    /// Substring the basename must contain, case-insensitively.
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    Path(String),
    /// The producer gave up. Nothing follows.
    Failed(String),
}

/// Result of polling a [`PathStream`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamPoll {
    Path(String),
    /// Nothing ready yet, the producer is still running.
    Pending,
    /// The producer finished normally.
    Finished,
    /// The producer failed mid-stream.
    Failed(String),
}

/// Shared stop flag between a stream and its producer.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Producer side of a [`PathStream`].
#[derive(Debug)]
pub struct PathSink {
    sender: SyncSender<SourceEvent>,
    stop: StopHandle,
}

impl PathSink {
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.stop.is_stopped()
    }

    /// Pushes a path, blocking while the channel is full.
    ///
    /// Returns false once the consumer is gone or asked to stop, at which
    /// point the producer should return.
    pub fn send(&self, path: String) -> bool {
        if self.is_cancelled() {
            return false;
        }
        self.sender.send(SourceEvent::Path(path)).is_ok()
    }

    /// Reports a failure. The consumer finalizes with what it has.
    pub fn fail(&self, message: impl Into<String>) {
        // nobody left to tell when the receiver is gone
        let _ = self.sender.send(SourceEvent::Failed(message.into()));
    }
}

/// Consumer side of a running producer.
#[derive(Debug)]
pub struct PathStream {
    receiver: Option<Receiver<SourceEvent>>,
    stop: StopHandle,
}

impl PathStream {
    /// Creates a connected sink and stream.
    pub fn channel(capacity: usize) -> (PathSink, PathStream) {
        let (sender, receiver) = mpsc::sync_channel(capacity.max(1));
        let stop = StopHandle::default();

        let sink = PathSink {
            sender,
            stop: stop.clone(),
        };
        let stream = PathStream {
            receiver: Some(receiver),
            stop,
        };
        (sink, stream)
    }

    /// Returns the next event without blocking.
    pub fn try_next(&mut self) -> StreamPoll {
        let Some(receiver) = self.receiver.as_ref() else {
            return StreamPoll::Finished;
        };

        match receiver.try_recv() {
            Ok(event) => self.on_event(event),
            Err(TryRecvError::Empty) => StreamPoll::Pending,
            Err(TryRecvError::Disconnected) => self.on_disconnect(),
        }
    }

    /// Waits up to `timeout` for the next event.
    pub fn next_timeout(&mut self, timeout: Duration) -> StreamPoll {
        let Some(receiver) = self.receiver.as_ref() else {
            return StreamPoll::Finished;
        };

        match receiver.recv_timeout(timeout) {
            Ok(event) => self.on_event(event),
            Err(RecvTimeoutError::Timeout) => StreamPoll::Pending,
            Err(RecvTimeoutError::Disconnected) => self.on_disconnect(),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Tells the producer to stop and abandons anything still in flight.
    /// Never blocks.
    pub fn cancel(&mut self) {
        self.stop.stop();
        self.receiver = None;
    }

    /// True once the producer finished, failed or the stream was cancelled.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.receiver.is_none()
    }

    fn on_event(&mut self, event: SourceEvent) -> StreamPoll {
        match event {
            SourceEvent::Path(path) => StreamPoll::Path(path),
            SourceEvent::Failed(message) => {
                self.cancel();
                StreamPoll::Failed(message)
            }
        }
    }

    fn on_disconnect(&mut self) -> StreamPoll {
        self.receiver = None;
        StreamPoll::Finished
    }
}

impl Drop for PathStream {
    fn drop(&mut self) {
        self.stop.stop();
    }
}

/// Starts a producer of candidate paths for a query.
pub trait PathSource {
    fn open(&self, request: &SourceRequest) -> Result<PathStream>;
}

/// Walks the search roots depth-first with the `ignore` walker.
///
/// Hidden entries (any component starting with `.`) are skipped together with
/// their subtrees. A root that is itself hidden or sits under a hidden
/// directory is dropped before walking. Ignore files are not honoured and
/// symlinks are not followed.
/// Entries are visited in file name order so runs are reproducible.
#[derive(Debug, Clone)]
pub struct WalkPathSource {
    channel_capacity: usize,
}

impl WalkPathSource {
    pub fn new(channel_capacity: usize) -> Self {
        Self { channel_capacity }
    }
}

impl Default for WalkPathSource {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl PathSource for WalkPathSource {
    fn open(&self, request: &SourceRequest) -> Result<PathStream> {
        let mut roots = existing_dirs(&request.roots);
        roots.retain(|root| {
            let hidden = has_hidden_component(root);
            if hidden {
                debug!(?root, "Skipping hidden search root");
            }
            !hidden
        });
        if roots.is_empty() {
            return Err(Error::NoSearchRoots);
        }

        let request = SourceRequest {
            roots,
            ..request.clone()
        };
        let (sink, stream) = PathStream::channel(self.channel_capacity);

        std::thread::Builder::new()
            .name("spot-walker".into())
            .spawn(move || {
                let walked = catch_unwind(AssertUnwindSafe(|| walk(&request, &sink)));
                if walked.is_err() {
                    error!(query = ?request.query, "Path walker panicked");
                    sink.fail("path walker panicked");
                }
            })
            .map_err(Error::ProducerSpawn)?;

        Ok(stream)
    }
}

#[tracing::instrument(skip(sink), level = "debug")]
fn walk(request: &SourceRequest, sink: &PathSink) {
    let Some((first, rest)) = request.roots.split_first() else {
        return;
    };

    let mut builder = WalkBuilder::new(first);
    for root in rest {
        builder.add(root);
    }

    let walker = builder
        .hidden(true)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .parents(false)
        .follow_links(false)
        .max_depth(Some(request.max_depth))
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let start = std::time::Instant::now();
    let mut sent = 0usize;

    for result in walker {
        if sink.is_cancelled() {
            debug!(sent, "Walker cancelled");
            return;
        }

        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                // unreadable directories are expected in a home folder
                debug!(?err, "Skipping entry");
                continue;
            }
        };

        if entry.depth() == 0 {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if !contains_ignore_case(&name, &request.query) {
            continue;
        }

        if !sink.send(entry.path().to_string_lossy().into_owned()) {
            debug!(sent, "Consumer gone, stopping walker");
            return;
        }
        sent += 1;
    }

    info!(sent, elapsed = ?start.elapsed(), "Walk completed");
}

/// Replays a fixed list of paths, unfiltered, from a producer thread.
///
/// Useful for demos and tests; can be told to fail after a number of paths.
#[derive(Debug, Clone, Default)]
pub struct StaticPathSource {
    paths: Vec<String>,
    fail_after: Option<(usize, String)>,
    channel_capacity: usize,
}

impl StaticPathSource {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            fail_after: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Emits `count` paths, then reports `message` as a producer failure.
    pub fn failing_after(mut self, count: usize, message: impl Into<String>) -> Self {
        self.fail_after = Some((count, message.into()));
        self
    }
}

impl PathSource for StaticPathSource {
    fn open(&self, _request: &SourceRequest) -> Result<PathStream> {
        let (sink, stream) = PathStream::channel(self.channel_capacity);
        let paths = self.paths.clone();
        let fail_after = self.fail_after.clone();

        std::thread::Builder::new()
            .name("spot-static-source".into())
            .spawn(move || {
                let limit = fail_after.as_ref().map_or(paths.len(), |(count, _)| *count);
                for path in paths.into_iter().take(limit) {
                    if !sink.send(path) {
                        return;
                    }
                }
                if let Some((_, message)) = fail_after {
                    sink.fail(message);
                }
            })
            .map_err(Error::ProducerSpawn)?;

        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(stream: &mut PathStream) -> (Vec<String>, StreamPoll) {
        let mut paths = Vec::new();
        loop {
            match stream.next_timeout(Duration::from_secs(5)) {
                StreamPoll::Path(path) => paths.push(path),
                StreamPoll::Pending => continue,
                end => return (paths, end),
            }
        }
    }

    fn request(query: &str) -> SourceRequest {
        SourceRequest {
            roots: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            query: query.into(),
        }
    }

    #[test]
    fn test_channel_reports_finish_on_disconnect() {
        let (sink, mut stream) = PathStream::channel(4);
        assert!(sink.send("/a".into()));
        drop(sink);

        assert_eq!(stream.try_next(), StreamPoll::Path("/a".into()));
        assert_eq!(stream.try_next(), StreamPoll::Finished);
        assert!(stream.is_done());
        assert_eq!(stream.try_next(), StreamPoll::Finished);
    }

    #[test]
    fn test_pending_while_producer_is_alive() {
        let (_sink, mut stream) = PathStream::channel(4);
        assert_eq!(stream.try_next(), StreamPoll::Pending);
        assert_eq!(
            stream.next_timeout(Duration::from_millis(5)),
            StreamPoll::Pending
        );
    }

    #[test]
    fn test_cancel_stops_the_sink() {
        let (sink, mut stream) = PathStream::channel(4);
        stream.cancel();
        assert!(sink.is_cancelled());
        assert!(!sink.send("/late".into()));
        assert_eq!(stream.try_next(), StreamPoll::Finished);
    }

    #[test]
    fn test_drop_stops_the_sink() {
        let (sink, stream) = PathStream::channel(4);
        let handle = stream.stop_handle();
        drop(stream);
        assert!(handle.is_stopped());
        assert!(!sink.send("/late".into()));
    }

    #[test]
    fn test_static_source_replays_paths() {
        let source = StaticPathSource::new(["/a/one", "/a/two"]);
        let mut stream = source.open(&request("o")).unwrap();
        let (paths, end) = drain(&mut stream);
        assert_eq!(paths, vec!["/a/one", "/a/two"]);
        assert_eq!(end, StreamPoll::Finished);
    }

    #[test]
    fn test_static_source_failure() {
        let source = StaticPathSource::new(["/a/one", "/a/two", "/a/three"])
            .failing_after(1, "disk vanished");
        let mut stream = source.open(&request("o")).unwrap();
        let (paths, end) = drain(&mut stream);
        assert_eq!(paths, vec!["/a/one"]);
        assert_eq!(end, StreamPoll::Failed("disk vanished".into()));
        assert!(stream.is_done());
    }

    #[test]
    fn test_walk_source_requires_existing_roots() {
        let source = WalkPathSource::default();
        let mut req = request("x");
        req.roots = vec![PathBuf::from("/definitely/not/a/real/dir")];
        assert!(matches!(source.open(&req), Err(Error::NoSearchRoots)));
    }
}
