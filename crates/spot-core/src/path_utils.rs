//! Path helpers for candidates and search roots

use once_cell::sync::Lazy;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

static HOME_DIR: Lazy<Option<PathBuf>> = Lazy::new(dirs::home_dir);

/// Canonicalize a path, resolving symlinks and producing an absolute path.
///
/// On Windows, uses `dunce::canonicalize` to avoid the `\\?\` extended-length path prefix
/// that `std::fs::canonicalize` produces, external openers choke on it.
#[cfg(windows)]
pub fn canonicalize(path: impl AsRef<Path>) -> std::io::Result<PathBuf> {
    dunce::canonicalize(path)
}

#[cfg(not(windows))]
pub fn canonicalize(path: impl AsRef<Path>) -> std::io::Result<PathBuf> {
    std::fs::canonicalize(path)
}

/// Last segment of a path. Trailing separators are ignored, a path without
/// any segment (like `/`) is returned whole.
pub fn basename(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
}

pub fn home_dir() -> Option<&'static Path> {
    HOME_DIR.as_deref()
}

/// Expands a leading `~` to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    expand_tilde_with_home(path, home_dir())
}

fn expand_tilde_with_home(path: &str, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return PathBuf::from(path);
    };

    if path == "~" {
        return home.to_path_buf();
    }

    match path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        Some(rest) => home.join(rest),
        None => PathBuf::from(path),
    }
}

/// Parent directory of `path` for display, with the home prefix shortened to `~`.
pub fn display_dir(path: &str) -> String {
    display_dir_with_home(path, home_dir())
}

fn display_dir_with_home(path: &str, home: Option<&Path>) -> String {
    let parent = Path::new(path).parent().unwrap_or(Path::new(""));

    if let Some(home) = home
        && let Ok(rest) = parent.strip_prefix(home)
    {
        if rest.as_os_str().is_empty() {
            return "~".to_owned();
        }
        return format!("~{}{}", MAIN_SEPARATOR, rest.display());
    }

    parent.display().to_string()
}

/// Home, Documents, Downloads and Desktop, in that order.
pub fn default_search_dirs() -> Vec<PathBuf> {
    [
        dirs::home_dir(),
        dirs::document_dir(),
        dirs::download_dir(),
        dirs::desktop_dir(),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Keeps the directories that exist, canonicalized and without duplicates.
pub fn existing_dirs(dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut existing: Vec<PathBuf> = Vec::with_capacity(dirs.len());
    for dir in dirs {
        if !dir.is_dir() {
            tracing::debug!(?dir, "Skipping missing search directory");
            continue;
        }

        let dir = canonicalize(dir).unwrap_or_else(|_| dir.clone());
        if !existing.contains(&dir) {
            existing.push(dir);
        }
    }
    existing
}

/// True when any component of the path starts with a dot.
pub fn has_hidden_component(path: impl AsRef<Path>) -> bool {
    path.as_ref().components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .is_some_and(|name| name.starts_with('.') && name != "." && name != "..")
    })
}
