//! Environment activation.
//!
//! Computing the variable set for a profile is a pure function over the sysroot
//! path, the located compiler, and the incoming PATH. Activation applies that
//! set to the `EnvContext`, snapshots the prior PATH exactly once, and persists
//! the active-profile marker; `reset` reverses all of it.

use anyhow::{Result, bail};
use std::path::Path;

use crate::envctx::{EnvContext, shell_quote};
use crate::error::Error;
use crate::paths::Paths;
use crate::probe;
use crate::registry::{Registry, SysrootProfile};
use crate::state;

/// Every variable the activator owns, in export order. PATH is last; on reset
/// it is restored from the backup instead of unset.
pub const EXPORTED_VARS: [&str; 22] = [
    "CC",
    "CXX",
    "AS",
    "AR",
    "LD",
    "NM",
    "STRIP",
    "OBJCOPY",
    "OBJDUMP",
    "RANLIB",
    "SIZE",
    "STRINGS",
    "READELF",
    "SYSROOT",
    "CROSS_COMPILE",
    "PKG_CONFIG_SYSROOT_DIR",
    "PKG_CONFIG_PATH",
    "PKG_CONFIG_LIBDIR",
    "CFLAGS",
    "CXXFLAGS",
    "LDFLAGS",
    "PATH",
];

/// Compute the full variable set for a sysroot and its compiler.
///
/// `current_path` is the PATH the toolchain bin directory gets prepended to;
/// `None` when the caller has no PATH at all.
pub fn profile_environment(
    sysroot: &Path,
    compiler: &Path,
    current_path: Option<&str>,
) -> Vec<(String, String)> {
    let tools = probe::companion_tools(compiler);
    let sysroot_str = sysroot.display().to_string();

    let mut pkgconfig = format!(
        "{0}/usr/lib/pkgconfig:{0}/usr/share/pkgconfig",
        sysroot_str
    );
    if sysroot.join("lib").join("pkgconfig").is_dir() {
        pkgconfig.push_str(&format!(":{}/lib/pkgconfig", sysroot_str));
    }

    let bin_dir = compiler
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .display()
        .to_string();
    let path_value = match current_path {
        Some(p) if !p.is_empty() => format!("{}:{}", bin_dir, p),
        _ => bin_dir,
    };

    let sysroot_flag = format!("--sysroot={}", sysroot_str);
    let p = |path: &Path| path.display().to_string();

    vec![
        ("CC".into(), p(&tools.cc)),
        ("CXX".into(), p(&tools.cxx)),
        ("AS".into(), p(&tools.r#as)),
        ("AR".into(), p(&tools.ar)),
        ("LD".into(), p(&tools.ld)),
        ("NM".into(), p(&tools.nm)),
        ("STRIP".into(), p(&tools.strip)),
        ("OBJCOPY".into(), p(&tools.objcopy)),
        ("OBJDUMP".into(), p(&tools.objdump)),
        ("RANLIB".into(), p(&tools.ranlib)),
        ("SIZE".into(), p(&tools.size)),
        ("STRINGS".into(), p(&tools.strings)),
        ("READELF".into(), p(&tools.readelf)),
        ("SYSROOT".into(), sysroot_str.clone()),
        ("CROSS_COMPILE".into(), tools.prefix),
        ("PKG_CONFIG_SYSROOT_DIR".into(), sysroot_str),
        ("PKG_CONFIG_PATH".into(), pkgconfig.clone()),
        ("PKG_CONFIG_LIBDIR".into(), pkgconfig),
        ("CFLAGS".into(), sysroot_flag.clone()),
        ("CXXFLAGS".into(), sysroot_flag.clone()),
        ("LDFLAGS".into(), sysroot_flag),
        ("PATH".into(), path_value),
    ]
}

/// Recompute the variable set for a profile, re-probing its sysroot.
///
/// Fails with `ToolchainNotFound` when no compiler is detectable; callers must
/// not mutate any state before this returns.
pub fn environment_for(
    profile: &SysrootProfile,
    env: &EnvContext,
) -> Result<Vec<(String, String)>> {
    let Some(compiler) = probe::find_compiler(&profile.path) else {
        bail!(Error::ToolchainNotFound(profile.path.clone()));
    };
    Ok(profile_environment(&profile.path, &compiler, env.get("PATH")))
}

/// Activate a profile: snapshot PATH (first activation only), export the full
/// variable set, and persist the active marker.
pub fn activate(paths: &Paths, env: &mut EnvContext, profile: &SysrootProfile) -> Result<()> {
    let vars = environment_for(profile, env)?;

    // An absent PATH is snapshotted as empty; the backup file must exist
    // whenever a reset is pending.
    state::backup_path_once(paths, env.get("PATH").unwrap_or(""))?;

    for (key, value) in &vars {
        env.set(key, value);
    }
    state::set_active_profile(paths, &profile.name)?;

    Ok(())
}

/// The activator's view of the current session.
#[derive(Debug)]
pub enum CurrentStatus {
    Inactive,
    Active(SysrootProfile),
    /// The marker names a profile that is no longer registered.
    Dangling(String),
}

pub fn current(paths: &Paths, registry: &Registry) -> Result<CurrentStatus> {
    match state::active_profile(paths)? {
        None => Ok(CurrentStatus::Inactive),
        Some(name) => match registry.lookup(&name) {
            Some(profile) => Ok(CurrentStatus::Active(profile.clone())),
            None => Ok(CurrentStatus::Dangling(name)),
        },
    }
}

/// Outcome of a reset, for user-facing reporting.
#[derive(Debug)]
pub struct ResetOutcome {
    /// PATH was restored from the backup. False means no backup existed.
    pub path_restored: bool,
}

/// Deactivate: restore PATH from the backup, unset every exported variable,
/// and clear the marker and backup files. Idempotent; resetting an inactive
/// session is a no-op, not an error.
pub fn reset(paths: &Paths, env: &mut EnvContext) -> Result<ResetOutcome> {
    let path_restored = match state::path_backup(paths)? {
        Some(prior_path) => {
            env.set("PATH", &prior_path);
            true
        }
        None => false,
    };

    for var in EXPORTED_VARS {
        if var != "PATH" && env.is_set(var) {
            env.unset(var);
        }
    }

    state::clear_active_profile(paths)?;
    state::clear_path_backup(paths)?;

    Ok(ResetOutcome { path_restored })
}

/// Render plain `export` lines, for `eval "$(crossenv env)"`.
pub fn render_exports(vars: &[(String, String)]) -> String {
    let mut out = String::new();
    for (key, value) in vars {
        out.push_str(&format!("export {}={}\n", key, shell_quote(value)));
    }
    out
}

/// Render a standalone sourcable script: the export lines plus a
/// `crossenv_reset` function restoring the PATH captured at generation time.
pub fn render_env_script(
    profile: &SysrootProfile,
    vars: &[(String, String)],
    prior_path: &str,
) -> String {
    let mut unset_list: Vec<&str> = EXPORTED_VARS
        .iter()
        .filter(|v| **v != "PATH")
        .copied()
        .collect();
    unset_list.sort_unstable();

    format!(
        "#!/bin/sh\n\
         # crossenv environment for profile '{name}' ({triplet})\n\
         # source this file, then call crossenv_reset to undo\n\n\
         {exports}\n\
         crossenv_reset() {{\n    \
             export PATH={prior}\n    \
             unset {unsets}\n\
         }}\n",
        name = profile.name,
        triplet = profile.target_triplet,
        exports = render_exports(vars),
        prior = shell_quote(prior_path),
        unsets = unset_list.join(" "),
    )
}
