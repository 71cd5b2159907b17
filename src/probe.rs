//! Toolchain probing.
//!
//! Given a sysroot directory, locate a C compiler binary, ask it for its version
//! and target triplet, and derive the full companion-tool set from the compiler's
//! filename. Detection failure is not fatal here: profiles may be registered for
//! sysroots whose compiler is missing or not runnable on this host.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;

const COMPILER: &str = "gcc";

/// Placeholder recorded when version or triplet cannot be detected.
pub const UNKNOWN: &str = "unknown";

/// Result of probing a sysroot for a toolchain.
#[derive(Debug, Clone)]
pub struct ToolchainProbe {
    /// Full path to the located compiler, `None` when detection failed.
    pub compiler_path: Option<PathBuf>,
    /// Compiler version as `MAJOR.MINOR.PATCH`, or `"unknown"`.
    pub version: String,
    /// Normalized target triplet from the compiler, or `"unknown"`.
    pub triplet: String,
}

/// Companion tools derived from a compiler path. All paths live in the
/// compiler's own directory and share its cross prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSet {
    /// Cross prefix, e.g. `arm-linux-gnueabihf-`. Empty for a native toolchain.
    pub prefix: String,
    pub cc: PathBuf,
    pub cxx: PathBuf,
    pub r#as: PathBuf,
    pub ar: PathBuf,
    pub ld: PathBuf,
    pub nm: PathBuf,
    pub strip: PathBuf,
    pub objcopy: PathBuf,
    pub objdump: PathBuf,
    pub ranlib: PathBuf,
    pub size: PathBuf,
    pub strings: PathBuf,
    pub readelf: PathBuf,
}

/// Probe a sysroot directory for a toolchain.
pub fn probe(sysroot: &Path) -> ToolchainProbe {
    let Some(compiler) = find_compiler(sysroot) else {
        return ToolchainProbe {
            compiler_path: None,
            version: UNKNOWN.to_string(),
            triplet: UNKNOWN.to_string(),
        };
    };

    let version = compiler_version(&compiler);
    let triplet = compiler_triplet(&compiler);

    ToolchainProbe {
        compiler_path: Some(compiler),
        version,
        triplet,
    }
}

/// Locate the compiler binary: `bin/gcc`, then `usr/bin/gcc`, then the first
/// executable `bin/*-gcc` in lexicographic order. The sort makes the tie-break
/// deterministic when several cross compilers share the bin directory.
pub fn find_compiler(sysroot: &Path) -> Option<PathBuf> {
    for fixed in [
        sysroot.join("bin").join(COMPILER),
        sysroot.join("usr").join("bin").join(COMPILER),
    ] {
        if is_executable_file(&fixed) {
            return Some(fixed);
        }
    }

    let bin = sysroot.join("bin");
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(&bin)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(&format!("-{}", COMPILER)))
        })
        .collect();
    candidates.sort();

    candidates.into_iter().find(|p| is_executable_file(p))
}

fn is_executable_file(path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// First `MAJOR.MINOR.PATCH` pattern on the first line of `<cc> --version`.
fn compiler_version(compiler: &Path) -> String {
    let Ok(output) = Command::new(compiler).arg("--version").output() else {
        return UNKNOWN.to_string();
    };
    if !output.status.success() {
        return UNKNOWN.to_string();
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let first_line = stdout.lines().next().unwrap_or("");
    let pattern = Regex::new(r"\d+\.\d+\.\d+").expect("valid version pattern");
    pattern
        .find(first_line)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Target triplet from `<cc> -dumpmachine`.
fn compiler_triplet(compiler: &Path) -> String {
    let Ok(output) = Command::new(compiler).arg("-dumpmachine").output() else {
        return UNKNOWN.to_string();
    };
    if !output.status.success() {
        return UNKNOWN.to_string();
    }

    let triplet = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if triplet.is_empty() {
        UNKNOWN.to_string()
    } else {
        triplet
    }
}

/// Derive the companion-tool set from a compiler path. Pure: no filesystem access.
///
/// `bin/gcc` means a native toolchain (empty prefix, companions named `g++`,
/// `as`, ...); `bin/arm-linux-gnueabihf-gcc` means prefix `arm-linux-gnueabihf-`
/// prepended to every companion name.
pub fn companion_tools(compiler_path: &Path) -> ToolSet {
    let dir = compiler_path.parent().unwrap_or_else(|| Path::new(""));
    let file_name = compiler_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(COMPILER);

    let prefix = if file_name == COMPILER {
        String::new()
    } else {
        file_name
            .strip_suffix(COMPILER)
            .unwrap_or("")
            .to_string()
    };

    let tool = |name: &str| dir.join(format!("{}{}", prefix, name));

    ToolSet {
        cc: compiler_path.to_path_buf(),
        cxx: tool("g++"),
        r#as: tool("as"),
        ar: tool("ar"),
        ld: tool("ld"),
        nm: tool("nm"),
        strip: tool("strip"),
        objcopy: tool("objcopy"),
        objdump: tool("objdump"),
        ranlib: tool("ranlib"),
        size: tool("size"),
        strings: tool("strings"),
        readelf: tool("readelf"),
        prefix,
    }
}
