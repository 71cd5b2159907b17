//! Error kinds for crossenv.
//!
//! The command layer reports everything through `anyhow`, but operations that
//! callers need to distinguish (duplicate registration, unknown profile,
//! undetectable toolchain) return these typed kinds so they stay matchable.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Bad user input: invalid path, bad selection, unsupported standard.
    #[error("{0}")]
    Validation(String),

    /// No profile registered under this name.
    #[error("Profile '{0}' does not exist")]
    NotFound(String),

    /// A profile already covers this name or canonical path.
    #[error("{0}")]
    Duplicate(String),

    /// No usable compiler under the sysroot. Warning on add, hard error on select.
    #[error("No compiler found under sysroot: {0}")]
    ToolchainNotFound(PathBuf),

    /// Registry or state file could not be read or written.
    #[error("Failed to persist {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
