//! The query engine behind the launcher window.
//!
//! An [`Engine`] owns at most one live [`SearchSession`]. Every keystroke
//! goes through [`Engine::on_input`], which answers the calculator part right
//! away and tells the caller whether to schedule a search. The caller debounces
//! and calls [`Engine::start_search`], then keeps calling [`Engine::pump`] to
//! render frames as the path source streams results in.

use crate::config::Config;
use crate::error::Result;
use crate::launcher::Launcher;
use crate::path_source::{PathSource, SourceRequest, StopHandle};
use crate::ranker::{IncrementalRanker, RankerConfig};
use crate::selection::Selection;
use crate::session::SearchSession;
use crate::types::{Frame, RankedItem, RankedSnapshot, SessionId};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub roots: Vec<PathBuf>,
    pub max_depth: usize,
    pub ranker: RankerConfig,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            roots: config.search_roots(),
            max_depth: config.max_depth,
            ranker: config.ranker_config(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// What the caller should do with the search after an input change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchAction {
    /// The input is empty. Results were cleared, drop any pending search.
    Clear,
    /// Debounce, then call [`Engine::start_search`] with this query.
    Schedule(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputUpdate {
    /// Calculator result worth showing, already gated on the input looking
    /// like an expression.
    pub calc_result: Option<String>,
    pub search: SearchAction,
}

/// Calculator result for `query`, if the query reads like an expression.
fn calculator_result(query: &str) -> Option<String> {
    spot_calc::evaluate(query).filter(|_| spot_calc::looks_like_expression(query))
}

pub struct Engine<S: PathSource> {
    source: S,
    settings: EngineSettings,
    launcher: Launcher,
    session: Option<SearchSession>,
    next_session: u64,
    calc_result: Option<String>,
    frame: Option<Frame>,
    selection: Selection,
}

impl<S: PathSource> Engine<S> {
    pub fn new(source: S, settings: EngineSettings) -> Self {
        Self {
            source,
            settings,
            launcher: Launcher::system(),
            session: None,
            next_session: 1,
            calc_result: None,
            frame: None,
            selection: Selection::default(),
        }
    }

    pub fn with_launcher(mut self, launcher: Launcher) -> Self {
        self.launcher = launcher;
        self
    }

    #[inline]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Handles an input change.
    pub fn on_input(&mut self, text: &str) -> InputUpdate {
        let query = text.trim();
        if query.is_empty() {
            self.cancel();
            self.calc_result = None;
            self.frame = None;
            self.selection.clear();
            return InputUpdate {
                calc_result: None,
                search: SearchAction::Clear,
            };
        }

        self.calc_result = calculator_result(query);

        InputUpdate {
            calc_result: self.calc_result.clone(),
            search: SearchAction::Schedule(query.to_owned()),
        }
    }

    /// Supersedes the live session and starts a new one for `query`.
    ///
    /// When the source cannot start, the results are cleared and the error
    /// returned; the engine stays usable.
    pub fn start_search(&mut self, query: &str) -> Result<SessionId> {
        self.cancel();

        let id = SessionId(self.next_session);
        self.next_session += 1;

        let request = SourceRequest {
            roots: self.settings.roots.clone(),
            max_depth: self.settings.max_depth,
            query: query.to_owned(),
        };

        let stream = match self.source.open(&request) {
            Ok(stream) => stream,
            Err(err) => {
                warn!(session = %id, query, error = %err, "Failed to start search");
                let empty = RankedSnapshot {
                    is_final: true,
                    ..RankedSnapshot::default()
                };
                self.publish(id, query, empty);
                return Err(err);
            }
        };

        let ranker = IncrementalRanker::new(query, self.settings.ranker);
        self.session = Some(SearchSession::new(id, ranker, stream));
        Ok(id)
    }

    /// Pumps the live session for at most `budget` and returns the newest
    /// frame, if the ranker produced one.
    pub fn pump(&mut self, budget: Duration) -> Option<Frame> {
        let session = self.session.as_mut()?;
        let snapshot = session.pump(budget)?;
        let id = session.id();
        let query = session.query().to_owned();

        if snapshot.is_final {
            self.session = None;
        }
        Some(self.publish(id, &query, snapshot))
    }

    /// Runs a whole search on the calling thread, giving up after `timeout`
    /// with whatever matched so far.
    pub fn search_to_end(&mut self, query: &str, timeout: Duration) -> Result<Frame> {
        let id = self.start_search(query)?;
        let snapshot = match self.session.take() {
            Some(mut session) => session.run_to_end(timeout),
            None => RankedSnapshot::default(),
        };
        Ok(self.publish(id, query, snapshot))
    }

    /// Closes the live session, if any. Its producer is told to stop.
    pub fn cancel(&mut self) {
        if let Some(mut session) = self.session.take() {
            debug!(session = %session.id(), "Cancelling live session");
            session.supersede();
        }
    }

    pub fn live_session(&self) -> Option<SessionId> {
        self.session.as_ref().map(SearchSession::id)
    }

    /// Stop flag of the live session's producer, for signal handlers.
    pub fn live_stop_handle(&self) -> Option<StopHandle> {
        self.session.as_ref().map(SearchSession::stop_handle)
    }

    #[inline]
    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    #[inline]
    pub fn calc_result(&self) -> Option<&str> {
        self.calc_result.as_deref()
    }

    #[inline]
    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn move_selection(&mut self, delta: isize) {
        let count = self.frame.as_ref().map_or(0, |f| f.snapshot.len());
        self.selection.move_by(delta, count);
    }

    pub fn selected(&self) -> Option<&RankedItem> {
        let frame = self.frame.as_ref()?;
        frame.snapshot.items.get(self.selection.index()?)
    }

    /// Opens the selected result. `Ok(None)` when nothing is selected.
    pub fn launch_selected(&self) -> Result<Option<String>> {
        let Some(item) = self.selected() else {
            return Ok(None);
        };
        self.launcher.launch(&item.path).map(Some)
    }

    fn publish(&mut self, session: SessionId, query: &str, snapshot: RankedSnapshot) -> Frame {
        self.selection.revalidate(snapshot.len());
        debug!(
            session = %session,
            items = snapshot.len(),
            total_seen = snapshot.total_seen,
            is_final = snapshot.is_final,
            "Frame"
        );

        // a session still streaming after newer input keeps its own line
        let frame = Frame {
            session,
            query: query.to_owned(),
            calc_result: calculator_result(query),
            snapshot,
        };
        self.frame = Some(frame.clone());
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::OpenCommand;
    use crate::path_source::StaticPathSource;

    const WAIT: Duration = Duration::from_secs(5);

    fn engine(paths: &[&str]) -> Engine<StaticPathSource> {
        Engine::new(
            StaticPathSource::new(paths.iter().copied()),
            EngineSettings::default(),
        )
    }

    #[test]
    fn test_on_input_gates_calculator_display() {
        let mut engine = engine(&[]);

        let update = engine.on_input(" 2+3*4 ");
        assert_eq!(update.calc_result.as_deref(), Some("14"));
        assert_eq!(update.search, SearchAction::Schedule("2+3*4".into()));

        let update = engine.on_input("42");
        assert_eq!(update.calc_result, None);
        assert_eq!(engine.calc_result(), None);

        let update = engine.on_input("   ");
        assert_eq!(update.search, SearchAction::Clear);
        assert!(engine.frame().is_none());
    }

    #[test]
    fn test_search_to_end_publishes_a_final_frame() {
        let mut engine = engine(&["/h/Happy.txt", "/h/Application.docx", "/h/zebra"]);
        engine.on_input("app");

        let frame = engine.search_to_end("app", WAIT).unwrap();
        assert_eq!(frame.session, SessionId(1));
        assert!(frame.snapshot.is_final);
        assert_eq!(frame.snapshot.items[0].basename, "Application.docx");
        assert_eq!(engine.selection().index(), Some(0));
        assert_eq!(engine.selected().unwrap().basename, "Application.docx");
        assert!(engine.live_session().is_none());
    }

    #[test]
    fn test_new_search_supersedes_the_old_one() {
        let mut engine = engine(&["/h/alpha", "/h/beta"]);

        let first = engine.start_search("alpha").unwrap();
        let stop = engine.live_stop_handle().unwrap();
        let second = engine.start_search("beta").unwrap();

        assert!(second > first);
        assert!(stop.is_stopped());
        assert_eq!(engine.live_session(), Some(second));

        let mut last = None;
        while engine.live_session().is_some() {
            if let Some(frame) = engine.pump(Duration::from_millis(50)) {
                assert_eq!(frame.session, second);
                last = Some(frame);
            }
        }
        let last = last.unwrap();
        assert_eq!(last.query, "beta");
        assert_eq!(last.snapshot.items.len(), 1);
    }

    #[test]
    fn test_frames_keep_the_calculator_line_of_their_query() {
        let mut engine = engine(&["/x/2+2.txt"]);
        engine.on_input("2+2");
        let id = engine.start_search("2+2").unwrap();

        // newer input arrives before the debounced search for it starts
        let update = engine.on_input("3*3");
        assert_eq!(update.calc_result.as_deref(), Some("9"));

        let mut frames = Vec::new();
        while engine.live_session().is_some() {
            if let Some(frame) = engine.pump(Duration::from_millis(50)) {
                frames.push(frame);
            }
        }
        assert!(!frames.is_empty());
        for frame in &frames {
            assert_eq!(frame.session, id);
            assert_eq!(frame.calc_result.as_deref(), Some("4"));
        }
        assert_eq!(engine.calc_result(), Some("9"));
    }

    #[test]
    fn test_move_selection_stays_in_bounds() {
        let mut engine = engine(&["/d/note1", "/d/note2", "/d/note3"]);
        engine.search_to_end("note", WAIT).unwrap();

        engine.move_selection(10);
        assert_eq!(engine.selection().index(), Some(2));
        engine.move_selection(-1);
        assert_eq!(engine.selected().unwrap().path, "/d/note2");
    }

    #[test]
    fn test_launch_without_selection() {
        let engine = engine(&[]);
        assert_eq!(engine.launch_selected().unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_launch_selected() {
        let launcher = Launcher::new(OpenCommand::new("true", std::iter::empty::<String>()), None);
        let mut engine = engine(&["/d/todo.txt"]).with_launcher(launcher);
        engine.search_to_end("todo", WAIT).unwrap();

        assert_eq!(
            engine.launch_selected().unwrap().as_deref(),
            Some("/d/todo.txt")
        );
    }
}
