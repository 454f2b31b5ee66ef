//! User configuration, read from `<config_dir>/spotlight/config.toml`.

use crate::error::{Error, Result};
use crate::path_source::DEFAULT_MAX_DEPTH;
use crate::path_utils::{default_search_dirs, expand_tilde};
use crate::ranker::{
    DEFAULT_DISPLAY_EVERY, DEFAULT_HARD_CAP_MULTIPLIER, DEFAULT_MAX_RESULTS, RankerConfig,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_SEARCH_DELAY_MS: u64 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Number of results shown.
    pub max_results: usize,
    /// Re-rank after this many new matches.
    pub display_every: usize,
    /// Stop a search after `max_results * hard_cap_multiplier` matches.
    pub hard_cap_multiplier: usize,
    /// Debounce between the last keystroke and the search.
    pub search_delay_ms: u64,
    pub max_depth: usize,
    /// Directories to search. `~` expands to the home directory, an empty
    /// list means home, documents, downloads and desktop.
    pub search_dirs: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            display_every: DEFAULT_DISPLAY_EVERY,
            hard_cap_multiplier: DEFAULT_HARD_CAP_MULTIPLIER,
            search_delay_ms: DEFAULT_SEARCH_DELAY_MS,
            max_depth: DEFAULT_MAX_DEPTH,
            search_dirs: Vec::new(),
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("spotlight").join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Config = toml::from_str(&text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        debug!(?path, ?config, "Loaded config");
        Ok(config)
    }

    /// Loads `path`, or the default location when `None`. A missing file
    /// yields the defaults; a broken one is still an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            return Ok(Self::default());
        };

        if !path.exists() {
            info!(?path, "No config file, using defaults");
            return Ok(Self::default());
        }

        Self::load(&path)
    }

    pub fn validate(&self) -> Result<()> {
        let knobs = [
            ("max_results", self.max_results),
            ("display_every", self.display_every),
            ("hard_cap_multiplier", self.hard_cap_multiplier),
        ];

        for (name, value) in knobs {
            if value == 0 {
                return Err(Error::InvalidConfig(format!("{name} must be at least 1")));
            }
        }
        Ok(())
    }

    pub fn search_roots(&self) -> Vec<PathBuf> {
        if self.search_dirs.is_empty() {
            return default_search_dirs();
        }
        self.search_dirs
            .iter()
            .map(|dir| expand_tilde(dir))
            .collect()
    }

    pub fn ranker_config(&self) -> RankerConfig {
        RankerConfig {
            max_results: self.max_results,
            display_every: self.display_every,
            hard_cap: self.max_results.saturating_mul(self.hard_cap_multiplier),
        }
    }

    pub fn search_delay(&self) -> Duration {
        Duration::from_millis(self.search_delay_ms)
    }
}
