//! Explicit environment context.
//!
//! All activation and flag logic mutates an `EnvContext` rather than the ambient
//! process environment. A child process cannot change its parent shell, so the CLI
//! boundary flushes the touched keys to a session script of `export`/`unset` lines
//! that the shell wrapper sources after each invocation.

use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::state::write_atomic;

#[derive(Debug, Clone, Default)]
pub struct EnvContext {
    vars: BTreeMap<String, String>,
    /// Keys set or unset during this invocation, in touch order semantics
    /// (a key is either exported or unset in the flushed script, never both).
    touched: BTreeSet<String>,
}

impl EnvContext {
    /// Seed the context from the current process environment.
    pub fn from_process() -> Self {
        let vars = std::env::vars().collect();
        Self {
            vars,
            touched: BTreeSet::new(),
        }
    }

    /// An empty context, for tests and for generation-from-profile-data paths.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|v| v.as_str())
    }

    pub fn is_set(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
        self.touched.insert(key.to_string());
    }

    pub fn unset(&mut self, key: &str) {
        self.vars.remove(key);
        self.touched.insert(key.to_string());
    }

    /// Whether any key was set or unset this invocation.
    pub fn dirty(&self) -> bool {
        !self.touched.is_empty()
    }

    /// Render the touched keys as a sourcable shell fragment.
    pub fn session_script(&self) -> String {
        let mut out = String::from("# generated by crossenv - sourced by the shell wrapper\n");
        for key in &self.touched {
            match self.vars.get(key) {
                Some(value) => {
                    out.push_str(&format!("export {}={}\n", key, shell_quote(value)));
                }
                None => {
                    out.push_str(&format!("unset {}\n", key));
                }
            }
        }
        out
    }

    /// Flush the touched keys to the session script at `path`.
    pub fn flush(&self, path: &Path) -> Result<()> {
        write_atomic(path, &self.session_script())
            .with_context(|| format!("Failed to write session script: {:?}", path))
    }
}

/// Single-quote a value for POSIX shells, escaping embedded single quotes.
pub fn shell_quote(value: &str) -> String {
    if !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | '+' | ':' | ',' | '='))
    {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', r"'\''"))
}
