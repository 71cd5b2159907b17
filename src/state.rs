//! Session state persisted between invocations.
//!
//! Two tiny files under the base directory:
//! - `active`: single line with the active profile name, absent when inactive.
//! - `path.backup`: single line with the PATH value captured at first activation,
//!   absent when no reset is pending.
//!
//! Both are written with the same write-temp-then-rename discipline as the
//! registry, so a crash mid-write never leaves a truncated file behind.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::error::Error;
use crate::paths::Paths;

/// Atomic write: write to a sibling temp file, then rename over the target.
/// An unwritable target is a `Persistence` error, fatal to the operation.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let persistence = |source: std::io::Error| Error::Persistence {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(persistence)?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).map_err(persistence)?;
    fs::rename(&temp_path, path).map_err(persistence)?;
    Ok(())
}

/// Read a single-line state file, `None` when absent.
fn read_line(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read state file: {:?}", path))?;
    let line = content.lines().next().unwrap_or("").to_string();
    if line.is_empty() { Ok(None) } else { Ok(Some(line)) }
}

/// The currently active profile name, if any.
pub fn active_profile(paths: &Paths) -> Result<Option<String>> {
    read_line(&paths.active_file)
}

/// Persist the active profile marker.
pub fn set_active_profile(paths: &Paths, name: &str) -> Result<()> {
    write_atomic(&paths.active_file, &format!("{}\n", name))
}

/// Remove the active profile marker. Absent marker is fine.
pub fn clear_active_profile(paths: &Paths) -> Result<()> {
    remove_if_exists(&paths.active_file)
}

/// The PATH value snapshotted at first activation, if a reset is pending.
/// Unlike the marker, an empty snapshot is meaningful here: it records that
/// PATH was unset or empty before activation.
pub fn path_backup(paths: &Paths) -> Result<Option<String>> {
    if !paths.path_backup_file.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&paths.path_backup_file).with_context(|| {
        format!("Failed to read state file: {:?}", paths.path_backup_file)
    })?;
    Ok(Some(content.lines().next().unwrap_or("").to_string()))
}

/// Snapshot PATH, only when no backup exists yet. Repeated activations must not
/// overwrite the original snapshot with an already-mutated PATH.
pub fn backup_path_once(paths: &Paths, current_path: &str) -> Result<()> {
    if paths.path_backup_file.exists() {
        return Ok(());
    }
    write_atomic(&paths.path_backup_file, &format!("{}\n", current_path))
}

/// Remove the PATH backup. Absent backup is fine.
pub fn clear_path_backup(paths: &Paths) -> Result<()> {
    remove_if_exists(&paths.path_backup_file)
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove state file: {:?}", path)),
    }
}
