//! Compiler-flag set management.
//!
//! Independent of the profile registry and activator: manages CFLAGS/CXXFLAGS/
//! ASFLAGS around C and C++ standard selection, with a write-once backup of the
//! prior flag state. The supported-standards set is discovered by asking the
//! host compiler whether it accepts each candidate `-std=` flag on empty input.

use anyhow::{Context, Result, bail};
use std::process::{Command, Stdio};

use crate::envctx::{EnvContext, shell_quote};
use crate::error::Error;
use crate::paths::Paths;
use crate::state::write_atomic;

/// Candidate C standards, probed in this order.
pub const C_STANDARDS: [&str; 14] = [
    "c89", "c90", "c99", "c11", "c17", "c18", "c2x", "gnu89", "gnu90", "gnu99", "gnu11", "gnu17",
    "gnu18", "gnu2x",
];

/// Candidate C++ standards, probed in this order.
pub const CPP_STANDARDS: [&str; 18] = [
    "c++98", "c++03", "c++11", "c++14", "c++17", "c++20", "c++23", "c++2a", "c++2b", "gnu++98",
    "gnu++03", "gnu++11", "gnu++14", "gnu++17", "gnu++20", "gnu++23", "gnu++2a", "gnu++2b",
];

const FLAG_VARS: [&str; 3] = ["CFLAGS", "CXXFLAGS", "ASFLAGS"];

/// Standards the host compiler accepts, split by language.
#[derive(Debug, Clone, Default)]
pub struct SupportedStandards {
    pub c: Vec<String>,
    pub cpp: Vec<String>,
}

impl SupportedStandards {
    pub fn contains(&self, token: &str) -> bool {
        let list = if is_cpp_standard(token) { &self.cpp } else { &self.c };
        list.iter().any(|s| s == token)
    }
}

/// Probe which candidate standards the given compilers accept.
pub fn probe_supported(cc: &str, cxx: &str) -> SupportedStandards {
    SupportedStandards {
        c: C_STANDARDS
            .iter()
            .filter(|s| accepts_standard(cc, "c", s))
            .map(|s| s.to_string())
            .collect(),
        cpp: CPP_STANDARDS
            .iter()
            .filter(|s| accepts_standard(cxx, "c++", s))
            .map(|s| s.to_string())
            .collect(),
    }
}

/// Probe the host `gcc`/`g++` from PATH.
pub fn supported_standards() -> SupportedStandards {
    probe_supported("gcc", "g++")
}

/// Whether the compiler accepts `-std=<std>` without erroring on empty input.
fn accepts_standard(compiler: &str, lang: &str, std: &str) -> bool {
    Command::new(compiler)
        .args(["-x", lang, &format!("-std={}", std), "-fsyntax-only", "-"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Classify a token as a C++ standard (vs C) by its prefix.
pub fn is_cpp_standard(token: &str) -> bool {
    token.starts_with("c++") || token.starts_with("gnu++")
}

/// The per-language standard selection parsed from user tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StandardSelection {
    pub c_std: Option<String>,
    pub cxx_std: Option<String>,
}

/// Validate tokens against the supported set and split them by language.
/// Within a category the last token wins.
pub fn classify_tokens(
    tokens: &[String],
    supported: &SupportedStandards,
) -> Result<StandardSelection> {
    if tokens.is_empty() {
        bail!(Error::Validation(
            "No standard given. Expected e.g. 'c11' or 'c++17'.".to_string()
        ));
    }

    let mut selection = StandardSelection::default();
    for token in tokens {
        if !supported.contains(token) {
            let list = if is_cpp_standard(token) {
                supported.cpp.join(", ")
            } else {
                supported.c.join(", ")
            };
            bail!(Error::Validation(format!(
                "Unsupported standard '{}'. Supported: {}",
                token, list
            )));
        }
        if is_cpp_standard(token) {
            selection.cxx_std = Some(token.clone());
        } else {
            selection.c_std = Some(token.clone());
        }
    }
    Ok(selection)
}

/// Flags composed from a selection. A language without a standard keeps its
/// existing variable untouched; ASFLAGS is always set (possibly to empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedFlags {
    pub cflags: Option<String>,
    pub cxxflags: Option<String>,
    pub asflags: String,
}

/// Pure flag composition: `-std=<s>`, plus `-fpermissive` when permissive,
/// plus the 32-bit triple when requested. ASFLAGS is set once for the whole
/// set, not per language.
pub fn compose(selection: &StandardSelection, permissive: bool, m32: bool) -> ComposedFlags {
    let build = |std: &str| {
        let mut flags = format!("-std={}", std);
        if permissive {
            flags.push_str(" -fpermissive");
        }
        if m32 {
            flags.push_str(" -m32 -Wa,--32 -Wl,-m,elf_i386");
        }
        flags
    };

    ComposedFlags {
        cflags: selection.c_std.as_deref().map(build),
        cxxflags: selection.cxx_std.as_deref().map(build),
        asflags: if m32 { "-Wa,--32".to_string() } else { String::new() },
    }
}

/// Render the currently set flag variables as `export` lines, for `eval` or a
/// sourcable script. Unset variables are omitted.
pub fn render_exports(env: &EnvContext) -> String {
    let mut out = String::new();
    for var in FLAG_VARS {
        if let Some(value) = env.get(var) {
            out.push_str(&format!("export {}={}\n", var, shell_quote(value)));
        }
    }
    out
}

/// Snapshot the prior flag variables, only when no backup exists yet.
/// Format: three `KEY=value` lines, empty value for an unset variable.
pub fn backup_flags_once(paths: &Paths, env: &EnvContext) -> Result<()> {
    if paths.flags_backup_file.exists() {
        return Ok(());
    }

    let mut content = String::new();
    for var in FLAG_VARS {
        content.push_str(&format!("{}={}\n", var, env.get(var).unwrap_or("")));
    }
    write_atomic(&paths.flags_backup_file, &content)
        .with_context(|| format!("Failed to write flag backup: {:?}", paths.flags_backup_file))
}

/// Apply a composed flag set, backing up the prior state first.
pub fn apply(paths: &Paths, env: &mut EnvContext, composed: &ComposedFlags) -> Result<()> {
    backup_flags_once(paths, env)?;

    if let Some(cflags) = &composed.cflags {
        env.set("CFLAGS", cflags);
    }
    if let Some(cxxflags) = &composed.cxxflags {
        env.set("CXXFLAGS", cxxflags);
    }
    env.set("ASFLAGS", &composed.asflags);
    Ok(())
}

/// Unset all three flag variables. Does not touch the backup.
pub fn clear(env: &mut EnvContext) {
    for var in FLAG_VARS {
        env.unset(var);
    }
}

/// Restore the flag variables from the backup and delete it. Returns false
/// (after falling back to `clear`) when no backup exists; callers report that
/// as a warning, not an error.
pub fn reset(paths: &Paths, env: &mut EnvContext) -> Result<bool> {
    if !paths.flags_backup_file.exists() {
        clear(env);
        return Ok(false);
    }

    let content = std::fs::read_to_string(&paths.flags_backup_file)
        .with_context(|| format!("Failed to read flag backup: {:?}", paths.flags_backup_file))?;

    for line in content.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        if !FLAG_VARS.contains(&key) {
            continue;
        }
        // An empty recorded value means the variable was not set before.
        if value.is_empty() {
            env.unset(key);
        } else {
            env.set(key, value);
        }
    }

    std::fs::remove_file(&paths.flags_backup_file).with_context(|| {
        format!("Failed to remove flag backup: {:?}", paths.flags_backup_file)
    })?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_paths;
    use tempfile::TempDir;

    fn all_supported() -> SupportedStandards {
        SupportedStandards {
            c: C_STANDARDS.iter().map(|s| s.to_string()).collect(),
            cpp: CPP_STANDARDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_is_cpp_standard() {
        assert!(is_cpp_standard("c++17"));
        assert!(is_cpp_standard("gnu++2b"));
        assert!(!is_cpp_standard("c11"));
        assert!(!is_cpp_standard("gnu99"));
    }

    #[test]
    fn test_classify_tokens() {
        let selection =
            classify_tokens(&["c11".to_string(), "c++17".to_string()], &all_supported()).unwrap();
        assert_eq!(selection.c_std.as_deref(), Some("c11"));
        assert_eq!(selection.cxx_std.as_deref(), Some("c++17"));
    }

    #[test]
    fn test_classify_tokens_last_wins() {
        let selection =
            classify_tokens(&["c99".to_string(), "c11".to_string()], &all_supported()).unwrap();
        assert_eq!(selection.c_std.as_deref(), Some("c11"));
    }

    #[test]
    fn test_classify_tokens_rejects_unsupported() {
        let supported = SupportedStandards {
            c: vec!["c11".to_string()],
            cpp: vec![],
        };
        let err = classify_tokens(&["c77".to_string()], &supported).unwrap_err();
        assert!(err.to_string().contains("c77"));
        assert!(err.to_string().contains("c11"));
    }

    #[test]
    fn test_classify_tokens_empty_is_error() {
        assert!(classify_tokens(&[], &all_supported()).is_err());
    }

    #[test]
    fn test_compose_plain() {
        let selection = StandardSelection {
            c_std: Some("c11".to_string()),
            cxx_std: Some("c++17".to_string()),
        };
        let composed = compose(&selection, false, false);

        assert_eq!(composed.cflags.as_deref(), Some("-std=c11"));
        assert_eq!(composed.cxxflags.as_deref(), Some("-std=c++17"));
        assert_eq!(composed.asflags, "");
    }

    #[test]
    fn test_compose_32bit() {
        let selection = StandardSelection {
            c_std: Some("c99".to_string()),
            cxx_std: None,
        };
        let composed = compose(&selection, false, true);

        assert_eq!(
            composed.cflags.as_deref(),
            Some("-std=c99 -m32 -Wa,--32 -Wl,-m,elf_i386")
        );
        assert_eq!(composed.cxxflags, None);
        assert_eq!(composed.asflags, "-Wa,--32");
    }

    #[test]
    fn test_compose_permissive() {
        let selection = StandardSelection {
            c_std: None,
            cxx_std: Some("c++14".to_string()),
        };
        let composed = compose(&selection, true, false);

        assert_eq!(composed.cflags, None);
        assert_eq!(composed.cxxflags.as_deref(), Some("-std=c++14 -fpermissive"));
    }

    #[test]
    fn test_apply_backs_up_prior_flags_once() {
        let temp = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp);

        let mut env = EnvContext::empty();
        env.set("CFLAGS", "-O2");

        let first = compose(
            &StandardSelection {
                c_std: Some("c11".to_string()),
                cxx_std: None,
            },
            false,
            false,
        );
        apply(&paths, &mut env, &first).unwrap();
        assert_eq!(env.get("CFLAGS"), Some("-std=c11"));
        assert_eq!(env.get("ASFLAGS"), Some(""));

        // Second apply must not overwrite the original backup
        let second = compose(
            &StandardSelection {
                c_std: Some("c99".to_string()),
                cxx_std: None,
            },
            false,
            false,
        );
        apply(&paths, &mut env, &second).unwrap();

        let backup = std::fs::read_to_string(&paths.flags_backup_file).unwrap();
        assert!(backup.contains("CFLAGS=-O2\n"));
        assert!(backup.contains("CXXFLAGS=\n"));
        assert!(backup.contains("ASFLAGS=\n"));
    }

    #[test]
    fn test_reset_restores_backup() {
        let temp = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp);

        let mut env = EnvContext::empty();
        env.set("CFLAGS", "-O2 -g");

        let composed = compose(
            &StandardSelection {
                c_std: Some("c11".to_string()),
                cxx_std: Some("c++17".to_string()),
            },
            false,
            false,
        );
        apply(&paths, &mut env, &composed).unwrap();

        let restored = reset(&paths, &mut env).unwrap();
        assert!(restored);
        assert_eq!(env.get("CFLAGS"), Some("-O2 -g"));
        assert!(!env.is_set("CXXFLAGS"));
        assert!(!env.is_set("ASFLAGS"));
        assert!(!paths.flags_backup_file.exists());

        // No backup left: falls back to clear
        let restored = reset(&paths, &mut env).unwrap();
        assert!(!restored);
        assert!(!env.is_set("CFLAGS"));
    }

    #[test]
    fn test_render_exports_skips_unset_vars() {
        let mut env = EnvContext::empty();
        env.set("CFLAGS", "-std=c11 -m32 -Wa,--32 -Wl,-m,elf_i386");
        env.set("ASFLAGS", "-Wa,--32");

        let exports = render_exports(&env);
        assert!(exports.contains("export CFLAGS='-std=c11 -m32 -Wa,--32 -Wl,-m,elf_i386'\n"));
        assert!(exports.contains("export ASFLAGS=-Wa,--32\n"));
        assert!(!exports.contains("CXXFLAGS"));

        assert_eq!(render_exports(&EnvContext::empty()), "");
    }

    #[test]
    fn test_clear_unsets_all() {
        let mut env = EnvContext::empty();
        env.set("CFLAGS", "-std=c11");
        env.set("CXXFLAGS", "-std=c++17");
        env.set("ASFLAGS", "");

        clear(&mut env);
        assert!(!env.is_set("CFLAGS"));
        assert!(!env.is_set("CXXFLAGS"));
        assert!(!env.is_set("ASFLAGS"));
    }

    // `true` accepts anything, `false` accepts nothing; keeps the probe test
    // independent of an installed gcc.
    #[cfg(unix)]
    #[test]
    fn test_probe_supported_with_stub_compilers() {
        let supported = probe_supported("true", "true");
        assert_eq!(supported.c.len(), C_STANDARDS.len());
        assert_eq!(supported.cpp.len(), CPP_STANDARDS.len());

        let none = probe_supported("false", "false");
        assert!(none.c.is_empty());
        assert!(none.cpp.is_empty());
    }
}
