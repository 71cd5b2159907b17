//! Diagnostics for crossenv.
//!
//! Implements the `crossenv doctor` command: checks the base directory, the
//! registry file, each profile's sysroot and compiler, the consistency of the
//! active marker and PATH backup, and the host compiler used for flag probing.

use anstyle::AnsiColor;
use std::process::{Command, Stdio};

use crate::paths::Paths;
use crate::probe;
use crate::registry::Registry;
use crate::state;
use crate::ui::Ui;

/// Run the doctor diagnostics
pub fn run_doctor(paths: &Paths, ui: &Ui) {
    ui.section("crossenv Doctor");
    ui.newline();

    // 1. Base directory
    check_step(ui, "Directories", || {
        if paths.base_dir.exists() {
            ui.println(format!(
                "  {} Base directory exists: {}",
                ui.icon_ok(),
                paths.base_dir.display()
            ));
            true
        } else {
            ui.println(format!(
                "  {} Base directory missing (fresh install?): {}",
                ui.icon_warn(),
                paths.base_dir.display()
            ));
            true
        }
    });

    // 2. Registry
    let registry = Registry::load(paths);
    check_step(ui, "Registry", || match &registry {
        Ok(registry) => {
            if !paths.registry_file.exists() {
                ui.println(format!("  {} No registry file yet", ui.icon_info()));
                return true;
            }
            ui.println(format!(
                "  {} Registry readable ({} profile(s))",
                ui.icon_ok(),
                registry.sysroots.len()
            ));
            true
        }
        Err(e) => {
            ui.println(format!("  {} Registry corrupt: {}", ui.icon_err(), e));
            false
        }
    });

    // 3. Per-profile sysroot and compiler
    check_step(ui, "Profiles", || {
        let Ok(registry) = &registry else {
            ui.println(format!("  {} Skipped (registry unreadable)", ui.icon_warn()));
            return true;
        };
        if registry.is_empty() {
            ui.println(format!("  {} No profiles registered", ui.icon_info()));
            return true;
        }

        let mut all_valid = true;
        for profile in &registry.sysroots {
            if !profile.path.is_dir() {
                ui.println(format!(
                    "    {} {} (sysroot missing: {})",
                    ui.icon_err(),
                    profile.name,
                    profile.path.display()
                ));
                all_valid = false;
            } else if probe::find_compiler(&profile.path).is_none() {
                ui.println(format!(
                    "    {} {} (no compiler found; select will fail)",
                    ui.icon_warn(),
                    profile.name
                ));
            } else {
                ui.println(format!("    {} {}", ui.icon_ok(), profile.name));
            }
        }
        all_valid
    });

    // 4. Session state consistency
    check_step(ui, "Session state", || {
        let active = state::active_profile(paths).unwrap_or(None);
        let backup = state::path_backup(paths).unwrap_or(None);

        match &active {
            Some(name) => {
                ui.println(format!("  {} Active profile: {}", ui.icon_info(), name));
                let registered = registry
                    .as_ref()
                    .map(|r| r.lookup(name).is_some())
                    .unwrap_or(false);
                if !registered {
                    ui.println(format!(
                        "  {} Active marker names an unregistered profile",
                        ui.icon_err()
                    ));
                    return false;
                }
                if backup.is_none() {
                    ui.println(format!(
                        "  {} Active but no PATH backup; reset cannot restore PATH",
                        ui.icon_warn()
                    ));
                }
            }
            None => {
                ui.println(format!("  {} No active profile", ui.icon_info()));
                if backup.is_some() {
                    ui.println(format!(
                        "  {} Stale PATH backup with no active profile; 'crossenv reset' will clean it up",
                        ui.icon_warn()
                    ));
                }
            }
        }
        true
    });

    // 5. Host compiler for flag probing
    check_step(ui, "Host compiler", || {
        let found = Command::new("gcc")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false);

        if found {
            ui.println(format!("  {} gcc found on PATH", ui.icon_ok()));
        } else {
            ui.println(format!(
                "  {} gcc not found on PATH; 'crossenv flags' cannot probe standards",
                ui.icon_warn()
            ));
        }
        true
    });
}

fn check_step<F>(ui: &Ui, name: &str, check_fn: F)
where
    F: FnOnce() -> bool,
{
    ui.println(ui.bold(format!("Checking {}...", name)));
    let success = check_fn();
    if !success {
        ui.println(ui.colored("  Issues detected!", AnsiColor::Red));
    }
    ui.newline();
}
