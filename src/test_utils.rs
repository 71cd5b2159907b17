//! Test utilities shared across test modules.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::PathBuf;

use anyhow::Result;
use tempfile::TempDir;

use crate::paths::Paths;
use crate::prompt::Prompt;

/// Create a Paths struct rooted in a temporary directory, mimicking the real
/// ~/.crossenv layout.
pub fn setup_test_paths(temp_dir: &TempDir) -> Paths {
    Paths::under(temp_dir.path().join(".crossenv"))
}

/// Create a fake cross-toolchain sysroot: `<temp>/<dir>/bin/<triplet>-gcc`
/// as an executable stub. Returns the sysroot path.
#[cfg(unix)]
pub fn make_cross_sysroot(temp_dir: &TempDir, dir: &str, triplet: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let sysroot = temp_dir.path().join(dir);
    let bin = sysroot.join("bin");
    std::fs::create_dir_all(&bin).unwrap();

    let compiler = bin.join(format!("{}-gcc", triplet));
    std::fs::write(&compiler, "#!/bin/sh\nexit 1\n").unwrap();
    std::fs::set_permissions(&compiler, std::fs::Permissions::from_mode(0o755)).unwrap();

    sysroot
}

/// Scripted stand-in for the interactive prompts.
pub struct ScriptedPrompt {
    picks: RefCell<VecDeque<Option<usize>>>,
    confirms: RefCell<VecDeque<bool>>,
}

impl ScriptedPrompt {
    pub fn new(picks: Vec<Option<usize>>, confirms: Vec<bool>) -> Self {
        Self {
            picks: RefCell::new(picks.into()),
            confirms: RefCell::new(confirms.into()),
        }
    }
}

impl Prompt for ScriptedPrompt {
    fn pick(&self, _title: &str, _options: &[String]) -> Result<Option<usize>> {
        Ok(self
            .picks
            .borrow_mut()
            .pop_front()
            .expect("unexpected pick prompt"))
    }

    fn confirm(&self, _question: &str, default: bool) -> Result<bool> {
        Ok(self.confirms.borrow_mut().pop_front().unwrap_or(default))
    }
}
