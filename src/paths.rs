use anyhow::{Context, Result};
use directories::BaseDirs;
use std::path::PathBuf;

/// All computed paths used by crossenv
#[derive(Debug, Clone)]
pub struct Paths {
    /// ~/.crossenv
    pub base_dir: PathBuf,
    /// ~/.crossenv/sysroots.json
    pub registry_file: PathBuf,
    /// ~/.crossenv/active
    pub active_file: PathBuf,
    /// ~/.crossenv/path.backup
    pub path_backup_file: PathBuf,
    /// ~/.crossenv/flags.backup
    pub flags_backup_file: PathBuf,
    /// ~/.crossenv/session.sh
    pub session_file: PathBuf,
}

impl Paths {
    pub fn new() -> Result<Self> {
        let base_dirs = BaseDirs::new().context("Failed to determine home directory")?;
        let home = base_dirs.home_dir();
        Ok(Self::under(home.join(".crossenv")))
    }

    /// Build the path set under an explicit base directory.
    pub fn under(base_dir: PathBuf) -> Self {
        let registry_file = base_dir.join("sysroots.json");
        let active_file = base_dir.join("active");
        let path_backup_file = base_dir.join("path.backup");
        let flags_backup_file = base_dir.join("flags.backup");
        let session_file = base_dir.join("session.sh");

        Self {
            base_dir,
            registry_file,
            active_file,
            path_backup_file,
            flags_backup_file,
            session_file,
        }
    }

    /// Ensure the base directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.base_dir)
            .with_context(|| format!("Failed to create base directory: {:?}", self.base_dir))?;
        Ok(())
    }
}
