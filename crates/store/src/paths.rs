//! Workspace file layout.
//!
//! Everything the engine persists lives under a single workspace directory:
//!
//! ```text
//! <workspace>/
//!   project-snapshot.json     live canonical snapshot
//!   pending-edits.json        bounded edit queue
//!   sync-input.json           secondary push channel into the stream
//!   history/                  rolling snapshot backups
//!   projects/<id>/snapshot.json   durable per-project archive
//! ```

use std::path::{Path, PathBuf};

use crate::error::StoreResult;

pub const SNAPSHOT_FILE: &str = "project-snapshot.json";
pub const PENDING_EDITS_FILE: &str = "pending-edits.json";
pub const SYNC_INPUT_FILE: &str = "sync-input.json";
pub const HISTORY_DIR: &str = "history";
pub const PROJECTS_DIR: &str = "projects";

/// Resolved locations of the engine's on-disk documents.
#[derive(Clone, Debug)]
pub struct WorkspacePaths {
    root: PathBuf,
}

impl WorkspacePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn snapshot_file(&self) -> PathBuf {
        self.root.join(SNAPSHOT_FILE)
    }

    pub fn pending_edits_file(&self) -> PathBuf {
        self.root.join(PENDING_EDITS_FILE)
    }

    pub fn sync_input_file(&self) -> PathBuf {
        self.root.join(SYNC_INPUT_FILE)
    }

    pub fn history_dir(&self) -> PathBuf {
        self.root.join(HISTORY_DIR)
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.root.join(PROJECTS_DIR)
    }

    pub fn project_snapshot_file(&self, project_id: &str) -> PathBuf {
        self.projects_dir().join(project_id).join("snapshot.json")
    }

    /// Create the workspace directory tree if it does not exist yet.
    pub fn ensure_layout(&self) -> StoreResult<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.history_dir())?;
        std::fs::create_dir_all(self.projects_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_rooted() {
        let paths = WorkspacePaths::new("/tmp/cutsync-ws");
        assert_eq!(
            paths.snapshot_file(),
            PathBuf::from("/tmp/cutsync-ws/project-snapshot.json")
        );
        assert_eq!(
            paths.project_snapshot_file("p1"),
            PathBuf::from("/tmp/cutsync-ws/projects/p1/snapshot.json")
        );
    }

    #[test]
    fn ensure_layout_creates_dirs() {
        let root = std::env::temp_dir().join("cs_store_layout_test");
        let _ = std::fs::remove_dir_all(&root);

        let paths = WorkspacePaths::new(&root);
        paths.ensure_layout().expect("layout");
        assert!(paths.history_dir().is_dir());
        assert!(paths.projects_dir().is_dir());

        let _ = std::fs::remove_dir_all(&root);
    }
}
