use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Invalid path {0}")]
    InvalidPath(PathBuf),
    #[error("None of the configured search directories exist")]
    NoSearchRoots,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Failed to spawn path producer: {0}")]
    ProducerSpawn(#[source] std::io::Error),
    #[error("Failed to open {path}: {primary}; fallback also failed: {fallback}")]
    Launch {
        path: String,
        primary: String,
        fallback: String,
    },
    #[error("Failed to initialize tracing: {0}")]
    TracingInit(String),
}

pub type Result<T> = std::result::Result<T, Error>;
