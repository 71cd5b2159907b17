//! Profile registry.
//!
//! Durable JSON store of named sysroot profiles. Every mutation reads the whole
//! file, rewrites it in memory, and replaces the file atomically (temp file then
//! rename), so an interrupted write never truncates the registry. There is no
//! cross-process locking: concurrent mutations are last-writer-wins on the whole
//! file, which is the documented model for this tool.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::paths::Paths;
use crate::probe::{self, ToolchainProbe};
use crate::state::write_atomic;

/// A registered sysroot profile. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SysrootProfile {
    pub name: String,
    pub path: PathBuf,
    pub gcc_version: String,
    pub target_triplet: String,
    pub added_date: DateTime<Utc>,
}

/// The registry file contents: an ordered sequence of profiles.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Registry {
    pub sysroots: Vec<SysrootProfile>,
}

impl Registry {
    /// Read the registry, returning an empty one when the file is absent.
    pub fn load(paths: &Paths) -> Result<Self> {
        let path = &paths.registry_file;
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read registry: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse registry: {:?}", path))
    }

    /// Persist the whole registry atomically.
    pub fn save(&self, paths: &Paths) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize registry")?;
        write_atomic(&paths.registry_file, &content)
            .with_context(|| format!("Failed to write registry: {:?}", paths.registry_file))
    }

    pub fn lookup(&self, name: &str) -> Option<&SysrootProfile> {
        self.sysroots.iter().find(|p| p.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.sysroots.is_empty()
    }
}

/// Outcome of registering a profile, for user-facing reporting.
#[derive(Debug)]
pub struct AddOutcome {
    pub profile: SysrootProfile,
    /// Set when the sysroot was registered without a detectable compiler.
    pub toolchain_missing: bool,
}

/// Register a sysroot. Canonicalizes the path, enforces path and name
/// uniqueness, probes the toolchain, and persists the registry.
///
/// A missing compiler is a warning condition, not an error: the profile is
/// registered with version/triplet `"unknown"` and `toolchain_missing` set.
pub fn add(paths: &Paths, path: &Path, name: Option<&str>) -> Result<AddOutcome> {
    if !path.exists() {
        bail!(Error::Validation(format!(
            "Path does not exist: {}",
            path.display()
        )));
    }
    if !path.is_dir() {
        bail!(Error::Validation(format!(
            "Path is not a directory: {}",
            path.display()
        )));
    }

    let canonical = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve path: {}", path.display()))?;

    let name = match name {
        Some(n) => n.to_string(),
        None => canonical
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_string())
            .ok_or_else(|| {
                Error::Validation(format!(
                    "Cannot derive a profile name from path: {}",
                    canonical.display()
                ))
            })?,
    };
    validate_profile_name(&name)?;

    let mut registry = Registry::load(paths)?;

    if let Some(existing) = registry.sysroots.iter().find(|p| p.path == canonical) {
        bail!(Error::Duplicate(format!(
            "Sysroot already registered as '{}': {}",
            existing.name,
            canonical.display()
        )));
    }
    if registry.lookup(&name).is_some() {
        bail!(Error::Duplicate(format!(
            "A profile named '{}' already exists",
            name
        )));
    }

    let ToolchainProbe {
        compiler_path,
        version,
        triplet,
    } = probe::probe(&canonical);

    let profile = SysrootProfile {
        name,
        path: canonical,
        gcc_version: version,
        target_triplet: triplet,
        added_date: Utc::now(),
    };

    registry.sysroots.push(profile.clone());
    registry.save(paths)?;

    Ok(AddOutcome {
        profile,
        toolchain_missing: compiler_path.is_none(),
    })
}

/// Remove a profile by name. The file is untouched when the name is unknown.
pub fn remove(paths: &Paths, name: &str) -> Result<()> {
    let mut registry = Registry::load(paths)?;

    let before = registry.sysroots.len();
    registry.sysroots.retain(|p| p.name != name);
    if registry.sysroots.len() == before {
        bail!(Error::NotFound(name.to_string()));
    }

    registry.save(paths)
}

/// Validate a profile name.
///
/// Only allows alphanumeric characters, underscores, hyphens, and dots. Names
/// are used as lookup keys and land in file contents, so they stay simple.
pub fn validate_profile_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!(Error::Validation("Profile name cannot be empty".to_string()));
    }
    if name.chars().count() > 64 {
        bail!(Error::Validation(
            "Profile name cannot be longer than 64 characters".to_string()
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        bail!(Error::Validation(format!(
            "Invalid profile name '{}'. Only alphanumeric characters, hyphens, underscores, and dots are allowed.",
            name
        )));
    }
    Ok(())
}
