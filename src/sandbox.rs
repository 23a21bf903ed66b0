//! Scratch-area management under `out/.hex`.

use std::fs;
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};

use camino::{Utf8Path, Utf8PathBuf};

use crate::path::SCRATCH_ROOT;

/// Hands out fresh per-task build directories under the scratch root.
///
/// The scratch tree is wiped once at the start of every run; sandboxes of
/// failed rules are kept afterwards so the wreckage can be inspected.
pub struct SandboxManager {
    root: Utf8PathBuf,
    next_id: AtomicU32,
}

impl SandboxManager {
    /// Manager for the workspace rooted at `workspace`.
    pub fn new(workspace: &Utf8Path) -> SandboxManager {
        SandboxManager {
            root: workspace.join(SCRATCH_ROOT),
            next_id: AtomicU32::new(0),
        }
    }

    /// Delete the entire scratch tree, including directories left behind by
    /// prior runs, and recreate it empty.
    pub fn clean(&self) -> io::Result<()> {
        if fs::metadata(&self.root).is_ok() {
            fs::remove_dir_all(&self.root)?;
        }

        fs::create_dir_all(&self.root)?;

        Ok(())
    }

    /// Create a new build directory and return its path. Concurrent callers
    /// always receive distinct directories.
    pub fn make_build_dir(&self) -> io::Result<Utf8PathBuf> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let dir = self.root.join(format!("build{id}"));
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}
