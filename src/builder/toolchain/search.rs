//! Executable search.

use std::ffi::OsString;
use std::path::PathBuf;

/// Looks up an executable by name.
///
/// Symlink handling and platform extension rules (`.exe`) belong to the
/// implementation; the resolver only cares whether a name exists.
pub trait PathSearch: Send + Sync {
    /// Return the full path of `name`, or `None` if it is not installed.
    fn which(&self, name: &str) -> Option<PathBuf>;
}

/// Searches the process `PATH` (or an explicit path list) using the `which` crate.
#[derive(Debug, Clone, Default)]
pub struct WhichSearch {
    paths: Option<OsString>,
}

impl WhichSearch {
    /// Search the process `PATH`.
    pub fn new() -> Self {
        WhichSearch { paths: None }
    }

    /// Search an explicit, platform-separated path list instead of `PATH`.
    pub fn with_paths(paths: impl Into<OsString>) -> Self {
        WhichSearch {
            paths: Some(paths.into()),
        }
    }
}

impl PathSearch for WhichSearch {
    fn which(&self, name: &str) -> Option<PathBuf> {
        let found = match &self.paths {
            Some(paths) => {
                let cwd = std::env::current_dir().unwrap_or_default();
                which::which_in(name, Some(paths), cwd)
            }
            None => which::which(name),
        };

        match found {
            Ok(path) => {
                tracing::debug!("found `{}` at {}", name, path.display());
                Some(path)
            }
            Err(_) => {
                tracing::debug!("`{}` not found", name);
                None
            }
        }
    }
}
