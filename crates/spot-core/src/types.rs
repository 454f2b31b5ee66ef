use crate::file_kind::FileKind;
use crate::path_utils;
use std::fmt;

/// A raw path discovered by the path source, paired with its basename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Full identifier handed to the launcher.
    pub path: String,
    /// Last path segment, used for matching and display.
    pub basename: String,
}

impl Candidate {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let basename = path_utils::basename(&path).to_owned();
        Self { path, basename }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: u32,
}

/// A piece of a basename. Segments of one label concatenate back to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub highlight: bool,
}

impl Segment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            highlight: false,
        }
    }

    pub fn highlighted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            highlight: true,
        }
    }
}

/// One row of a rendered result list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedItem {
    pub path: String,
    pub basename: String,
    pub score: u32,
    pub segments: Vec<Segment>,
}

impl RankedItem {
    /// Icon class of the item. Touches the filesystem to tell folders apart.
    pub fn kind(&self) -> FileKind {
        FileKind::of_path(&self.path)
    }

    /// Parent directory with the home prefix shortened to `~`.
    pub fn display_dir(&self) -> String {
        path_utils::display_dir(&self.path)
    }

    /// Basename with highlighted runs wrapped in `[` `]`, for plain text output.
    pub fn marked_basename(&self) -> String {
        self.segments
            .iter()
            .map(|segment| {
                if segment.highlight {
                    format!("[{}]", segment.text)
                } else {
                    segment.text.clone()
                }
            })
            .collect()
    }
}

/// Ranked view of a session at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankedSnapshot {
    /// Best matches, highest score first, at most `max_results` long.
    pub items: Vec<RankedItem>,
    /// Raw paths received so far, matched or not.
    pub total_seen: usize,
    pub total_matched: usize,
    /// No further snapshot will follow for this session.
    pub is_final: bool,
}

impl RankedSnapshot {
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Identifies one ranking session. Later sessions have larger ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the renderer receives: the calculator line plus the ranked list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub session: SessionId,
    pub query: String,
    pub calc_result: Option<String>,
    pub snapshot: RankedSnapshot,
}

impl Frame {
    /// Calculator line as shown above the results, e.g. `= 14`.
    pub fn calc_line(&self) -> Option<String> {
        self.calc_result.as_ref().map(|result| format!("= {result}"))
    }
}
