//! Hands a selected result to the desktop's default application.

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, error, info, warn};
use url::Url;

/// How the launched path is passed to the opener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchTarget {
    /// The literal filesystem path.
    Path,
    /// A percent-encoded `file://` URI.
    FileUri,
}

/// An external program that opens a path with its default association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenCommand {
    pub program: String,
    pub args: Vec<String>,
    pub target: LaunchTarget,
}

impl OpenCommand {
    pub fn new<I, A>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            target: LaunchTarget::Path,
        }
    }

    pub fn with_uri(mut self) -> Self {
        self.target = LaunchTarget::FileUri;
        self
    }

    fn command(&self, path: &str) -> Result<Command> {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        match self.target {
            LaunchTarget::Path => command.arg(path),
            LaunchTarget::FileUri => command.arg(file_uri(path)?),
        };
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        Ok(command)
    }

    /// Runs the opener and waits for it to report success.
    fn run(&self, path: &str) -> std::result::Result<(), String> {
        let mut command = self.command(path).map_err(|err| err.to_string())?;
        match command.status() {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(format!("{} exited with {status}", self.program)),
            Err(err) => Err(format!("{}: {err}", self.program)),
        }
    }

    /// Starts the opener without waiting for it.
    fn spawn_detached(&self, path: &str) -> std::result::Result<(), String> {
        let mut child = self
            .command(path)
            .map_err(|err| err.to_string())?
            .spawn()
            .map_err(|err| format!("{}: {err}", self.program))?;

        // reap the child so it does not linger as a zombie
        if let Err(err) = std::thread::Builder::new()
            .name("spot-launch-reaper".into())
            .spawn(move || child.wait())
        {
            debug!(?err, opener = %self.program, "Failed to spawn reaper thread");
        }
        Ok(())
    }
}

/// Primary opener plus a fire-and-forget fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launcher {
    primary: OpenCommand,
    fallback: Option<OpenCommand>,
}

impl Launcher {
    pub fn new(primary: OpenCommand, fallback: Option<OpenCommand>) -> Self {
        Self { primary, fallback }
    }

    /// The platform's default openers.
    #[cfg(target_os = "linux")]
    pub fn system() -> Self {
        Self::new(
            OpenCommand::new("gio", ["open"]).with_uri(),
            Some(OpenCommand::new("xdg-open", std::iter::empty::<String>())),
        )
    }

    #[cfg(target_os = "macos")]
    pub fn system() -> Self {
        Self::new(OpenCommand::new("open", std::iter::empty::<String>()), None)
    }

    #[cfg(windows)]
    pub fn system() -> Self {
        Self::new(
            OpenCommand::new("cmd", ["/C", "start", ""]),
            Some(OpenCommand::new("explorer", std::iter::empty::<String>())),
        )
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
    pub fn system() -> Self {
        Self::new(
            OpenCommand::new("xdg-open", std::iter::empty::<String>()),
            None,
        )
    }

    /// Opens `path`, returning it back on success.
    ///
    /// A failing primary opener is retried once with the fallback. When both
    /// fail the error is logged and returned.
    pub fn launch(&self, path: &str) -> Result<String> {
        let primary = match self.primary.run(path) {
            Ok(()) => {
                info!(path, opener = %self.primary.program, "Launched");
                return Ok(path.to_owned());
            }
            Err(err) => err,
        };
        warn!(path, error = %primary, "Primary opener failed, trying fallback");

        let fallback = match &self.fallback {
            Some(fallback) => match fallback.spawn_detached(path) {
                Ok(()) => {
                    info!(path, opener = %fallback.program, "Launched with fallback");
                    return Ok(path.to_owned());
                }
                Err(err) => err,
            },
            None => "no fallback opener".to_owned(),
        };

        error!(path, %primary, %fallback, "Failed to open result");
        Err(Error::Launch {
            path: path.to_owned(),
            primary,
            fallback,
        })
    }
}

impl Default for Launcher {
    fn default() -> Self {
        Self::system()
    }
}

/// Builds a percent-encoded `file://` URI. Only absolute paths have one.
pub fn file_uri(path: &str) -> Result<String> {
    Url::from_file_path(path)
        .map(String::from)
        .map_err(|()| Error::InvalidPath(PathBuf::from(path)))
}
