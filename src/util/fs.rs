//! Filesystem utilities.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

fn create_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Write bytes to a file, creating parent directories if needed.
pub fn write_bytes(path: &Path, contents: &[u8]) -> io::Result<()> {
    create_parent(path)?;
    fs::write(path, contents)
}

/// Move a file, creating the destination's parent directories.
///
/// Falls back to copy and remove when a rename is not possible (for example
/// across filesystems). An existing destination is replaced.
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    create_parent(to)?;

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            tracing::debug!(
                "rename {} -> {} failed ({}), copying instead",
                from.display(),
                to.display(),
                rename_err
            );
            if fs::copy(from, to).is_err() {
                return Err(rename_err);
            }
            fs::remove_file(from)
        }
    }
}

/// Whether two paths name the same existing file.
///
/// Returns false if either path does not exist.
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
