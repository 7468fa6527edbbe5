//! Session snapshot persistence.
//!
//! Snapshots are written to an exclusively created temporary file next to
//! the target and renamed over it once fully synced, so a reader never sees
//! a half-written snapshot and a failed write leaves the previous one intact.

use super::SessionState;
use crate::executor::error::{Error, Result};
use log::{debug, info};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Reads a session snapshot.
///
/// The parent directory is created if it does not exist yet.
///
/// # Returns
///
/// * `Ok(None)` - no snapshot at `path`
/// * `Ok(Some(state))` - a valid snapshot
/// * `Err(Error::Configuration)` - unreadable, malformed, or invalid snapshot
pub fn load_storage_state(path: &Path) -> Result<Option<SessionState>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            Error::Configuration(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No session snapshot at {}", path.display());
            return Ok(None);
        }
        Err(e) => {
            return Err(Error::Configuration(format!(
                "Failed to read session snapshot {}: {}",
                path.display(),
                e
            )))
        }
    };

    let state: SessionState = serde_json::from_str(&content).map_err(|e| {
        Error::Configuration(format!(
            "Malformed session snapshot {}: {}",
            path.display(),
            e
        ))
    })?;

    state.validate().map_err(|e| {
        Error::Configuration(format!(
            "Invalid session snapshot {}: {}",
            path.display(),
            e
        ))
    })?;

    Ok(Some(state))
}

/// Writes a session snapshot atomically.
pub fn save_storage_state(path: &Path, state: &SessionState) -> Result<()> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent,
        None => Path::new("."),
    };

    write_atomic(dir, path, state).map_err(|e| {
        Error::Configuration(format!(
            "Failed to write session snapshot {}: {}",
            path.display(),
            e
        ))
    })?;

    info!("Saved session snapshot to {}", path.display());
    Ok(())
}

fn write_atomic(dir: &Path, path: &Path, state: &SessionState) -> io::Result<()> {
    fs::create_dir_all(dir)?;

    // Dropping the temp file on any early return deletes it.
    let mut file = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut file, state)?;
    file.write_all(b"\n")?;
    file.flush()?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;

    Ok(())
}
