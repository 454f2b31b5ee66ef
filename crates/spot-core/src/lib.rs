//! Query engine of the spotlight launcher.
//!
//! Turns keystrokes into a calculator line and a ranked, highlighted list of
//! files found under the search roots. The building blocks are usable on
//! their own:
//!
//! - [`score`] scores and highlights a basename against a query
//! - [`ranker`] keeps a stable top-K over an unbounded stream of paths
//! - [`path_source`] produces those paths on a background thread
//! - [`engine`] ties them together with session supersession and selection
//!
//! ```
//! use spot_core::score::{highlight, score};
//!
//! assert!(score("app", "Application.docx") > score("app", "Happy.txt"));
//! let segments = highlight("app", "Happy.txt");
//! assert_eq!(segments[1].text, "app");
//! assert!(segments[1].highlight);
//! ```

pub mod config;
pub mod debounce;
pub mod engine;
mod error;
pub mod file_kind;
pub mod launcher;
pub mod log;
pub mod path_source;
pub mod path_utils;
pub mod ranker;
pub mod score;
pub mod selection;
pub mod session;
pub mod types;

pub use config::Config;
pub use debounce::Debounce;
pub use engine::{Engine, EngineSettings, InputUpdate, SearchAction};
pub use error::{Error, Result};
pub use file_kind::FileKind;
pub use launcher::{Launcher, OpenCommand};
pub use path_source::{
    PathSource, PathStream, SourceRequest, StaticPathSource, StopHandle, WalkPathSource,
};
pub use ranker::{IncrementalRanker, RankerConfig};
pub use selection::Selection;
pub use session::SearchSession;
pub use types::{Candidate, Frame, RankedItem, RankedSnapshot, ScoredCandidate, Segment, SessionId};
