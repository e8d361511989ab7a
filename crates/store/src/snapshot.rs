//! The snapshot store — the canonical on-disk project document.
//!
//! One live snapshot, a rolling history of the last 20 backups, and a
//! durable per-project archive keyed by project id. The live slot and the
//! archive are decoupled so switching projects never loses unsaved state.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use cs_common::types::Snapshot;

use crate::atomic::write_atomic;
use crate::error::{StoreError, StoreResult};
use crate::paths::WorkspacePaths;

/// History backups retained, newest first.
pub const MAX_HISTORY_ENTRIES: usize = 20;

/// Archived-project summary returned by `list_projects`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SnapshotStore {
    paths: WorkspacePaths,
}

impl SnapshotStore {
    pub fn new(paths: WorkspacePaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &WorkspacePaths {
        &self.paths
    }

    /// Atomically overwrite the live snapshot.
    pub fn write(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(snapshot)?;
        write_atomic(&self.paths.snapshot_file(), &json)?;
        debug!(
            tracks = snapshot.tracks.len(),
            assets = snapshot.assets.len(),
            "wrote live snapshot"
        );
        Ok(())
    }

    /// The last-written live snapshot, or `None` if never written.
    pub fn read(&self) -> StoreResult<Option<Snapshot>> {
        let path = self.paths.snapshot_file();
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Copy the live snapshot into a timestamped history slot, then prune
    /// history to the most recent [`MAX_HISTORY_ENTRIES`]. A missing live
    /// snapshot is a no-op.
    pub fn backup(&self) -> StoreResult<()> {
        let live = self.paths.snapshot_file();
        if !live.exists() {
            return Ok(());
        }
        let history = self.paths.history_dir();
        std::fs::create_dir_all(&history)?;

        let slot = cs_common::history_slot_name();
        let mut target = history.join(format!("snapshot_{slot}.json"));
        // Same-second backups get a numeric suffix instead of overwriting.
        let mut bump = 1u32;
        while target.exists() {
            target = history.join(format!("snapshot_{slot}-{bump}.json"));
            bump += 1;
        }
        std::fs::copy(&live, &target)?;
        debug!(slot = %target.display(), "backed up snapshot");

        self.prune_history()
    }

    fn prune_history(&self) -> StoreResult<()> {
        let mut slots: Vec<_> = std::fs::read_dir(self.paths.history_dir())?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with("snapshot_") && n.ends_with(".json"))
                    .unwrap_or(false)
            })
            .collect();
        // Filenames sort chronologically; newest last.
        slots.sort();
        while slots.len() > MAX_HISTORY_ENTRIES {
            let oldest = slots.remove(0);
            if let Err(error) = std::fs::remove_file(&oldest) {
                warn!(path = %oldest.display(), %error, "failed to prune history slot");
            }
        }
        Ok(())
    }

    /// Copy the live snapshot into the durable per-project archive.
    pub fn archive(&self, project_id: &str) -> StoreResult<()> {
        let live = self.paths.snapshot_file();
        if !live.exists() {
            return Err(StoreError::SnapshotMissing);
        }
        let target = self.paths.project_snapshot_file(project_id);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(&live, &target)?;
        info!(project_id, "archived project snapshot");
        Ok(())
    }

    /// Back up the current live snapshot, then copy the archived project's
    /// snapshot into the live slot. Returns the loaded snapshot.
    pub fn load_into_live(&self, project_id: &str) -> StoreResult<Snapshot> {
        let archived = self.paths.project_snapshot_file(project_id);
        let contents = match std::fs::read_to_string(&archived) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::ProjectNotArchived {
                    project_id: project_id.to_string(),
                })
            }
            Err(e) => return Err(StoreError::Io(e)),
        };
        let snapshot: Snapshot = serde_json::from_str(&contents)?;

        self.backup()?;
        write_atomic(&self.paths.snapshot_file(), &contents)?;
        info!(project_id, "loaded archived project into live slot");
        Ok(snapshot)
    }

    /// Scan the archive for project summaries. Unparsable entries are
    /// skipped with a warning, never fatal.
    pub fn list_projects(&self) -> StoreResult<Vec<ProjectSummary>> {
        let projects_dir = self.paths.projects_dir();
        if !projects_dir.exists() {
            return Ok(Vec::new());
        }
        let mut summaries = Vec::new();
        for entry in std::fs::read_dir(&projects_dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(_) => continue,
            };
            let snapshot_file = entry.path().join("snapshot.json");
            let snapshot: Snapshot = match std::fs::read_to_string(&snapshot_file)
                .map_err(StoreError::Io)
                .and_then(|c| serde_json::from_str(&c).map_err(StoreError::Json))
            {
                Ok(snapshot) => snapshot,
                Err(error) => {
                    warn!(path = %snapshot_file.display(), %error, "skipping unreadable archived project");
                    continue;
                }
            };
            if let Some(project) = snapshot.project {
                summaries.push(ProjectSummary {
                    id: project.id,
                    name: project.name,
                    created_at: project.created_at,
                    updated_at: project.updated_at,
                    thumbnail: project.thumbnail,
                });
            }
        }
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    /// Persist a reported state: back up the previous live snapshot, merge
    /// the report over it, write, and archive under the reported project id.
    ///
    /// A report carrying no assets keeps the assets already on disk; a
    /// browser-side reporter may not track the media library at all, and an
    /// overwrite would silently drop every import.
    pub fn update_from_report(&self, reported: &Snapshot) -> StoreResult<Snapshot> {
        let previous = self.read().unwrap_or_else(|error| {
            warn!(%error, "live snapshot unreadable, replacing it");
            None
        });

        let mut merged = reported.clone();
        if let Some(previous) = previous {
            if merged.assets.is_empty() {
                merged.assets = previous.assets;
            }
            if merged.project.is_none() {
                merged.project = previous.project;
            }
        }

        self.backup()?;
        self.write(&merged)?;
        if let Some(project) = &merged.project {
            self.archive(&project.id)?;
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cs_common::types::{Asset, AssetType, ProjectMeta};

    fn temp_store(name: &str) -> (SnapshotStore, std::path::PathBuf) {
        let root = std::env::temp_dir().join(format!("cs_snapshot_{name}"));
        let _ = std::fs::remove_dir_all(&root);
        let paths = WorkspacePaths::new(&root);
        paths.ensure_layout().expect("layout");
        (SnapshotStore::new(paths), root)
    }

    fn sample_snapshot(project_id: &str) -> Snapshot {
        Snapshot {
            project: Some(ProjectMeta::new(project_id, "Demo")),
            tracks: vec![],
            assets: vec![],
        }
    }

    fn sample_asset(id: &str) -> Asset {
        Asset {
            id: id.into(),
            name: "clip".into(),
            asset_type: AssetType::Video,
            url: format!("file:///media/{id}.mp4"),
            file_path: None,
            thumbnail_url: None,
            width: None,
            height: None,
            duration: None,
        }
    }

    #[test]
    fn read_absent_is_none() {
        let (store, root) = temp_store("absent");
        assert!(store.read().expect("read").is_none());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn write_then_read_roundtrip() {
        let (store, root) = temp_store("roundtrip");
        let snapshot = sample_snapshot("p1");
        store.write(&snapshot).expect("write");

        let back = store.read().expect("read").expect("present");
        assert_eq!(back, snapshot);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn history_is_bounded() {
        let (store, root) = temp_store("history");
        store.write(&sample_snapshot("p1")).expect("write");

        for _ in 0..25 {
            store.backup().expect("backup");
        }
        let slots = std::fs::read_dir(store.paths().history_dir())
            .expect("read dir")
            .count();
        assert_eq!(slots, MAX_HISTORY_ENTRIES);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn backup_without_live_snapshot_is_noop() {
        let (store, root) = temp_store("no_live");
        store.backup().expect("backup");
        assert_eq!(
            std::fs::read_dir(store.paths().history_dir())
                .expect("read dir")
                .count(),
            0
        );
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn archive_and_load_into_live() {
        let (store, root) = temp_store("archive");
        store.write(&sample_snapshot("p1")).expect("write p1");
        store.archive("p1").expect("archive p1");

        // switch live to a different project
        store.write(&sample_snapshot("p2")).expect("write p2");

        let loaded = store.load_into_live("p1").expect("load p1");
        assert_eq!(loaded.project.as_ref().expect("project").id, "p1");
        let live = store.read().expect("read").expect("present");
        assert_eq!(live.project.expect("project").id, "p1");

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn load_unknown_project_fails() {
        let (store, root) = temp_store("unknown");
        let err = store.load_into_live("ghost").unwrap_err();
        assert!(matches!(err, StoreError::ProjectNotArchived { .. }));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn list_projects_returns_summaries() {
        let (store, root) = temp_store("list");
        store.write(&sample_snapshot("p1")).expect("write p1");
        store.archive("p1").expect("archive p1");
        store.write(&sample_snapshot("p2")).expect("write p2");
        store.archive("p2").expect("archive p2");

        let projects = store.list_projects().expect("list");
        assert_eq!(projects.len(), 2);
        assert!(projects.iter().any(|p| p.id == "p1"));
        assert!(projects.iter().any(|p| p.id == "p2"));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn list_projects_skips_garbage_entries() {
        let (store, root) = temp_store("list_garbage");
        store.write(&sample_snapshot("p1")).expect("write");
        store.archive("p1").expect("archive");

        let bad_dir = store.paths().projects_dir().join("broken");
        std::fs::create_dir_all(&bad_dir).expect("mkdir");
        std::fs::write(bad_dir.join("snapshot.json"), "{nope").expect("write garbage");

        let projects = store.list_projects().expect("list");
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].id, "p1");

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn report_without_assets_preserves_existing() {
        let (store, root) = temp_store("report_merge");
        let mut on_disk = sample_snapshot("p1");
        on_disk.assets.push(sample_asset("a1"));
        store.write(&on_disk).expect("write");

        let reported = sample_snapshot("p1");
        let merged = store.update_from_report(&reported).expect("report");
        assert_eq!(merged.assets.len(), 1);
        assert_eq!(merged.assets[0].id, "a1");

        // and the archive was refreshed
        assert!(store.paths().project_snapshot_file("p1").exists());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn report_with_assets_replaces() {
        let (store, root) = temp_store("report_replace");
        let mut on_disk = sample_snapshot("p1");
        on_disk.assets.push(sample_asset("a1"));
        store.write(&on_disk).expect("write");

        let mut reported = sample_snapshot("p1");
        reported.assets.push(sample_asset("a2"));
        let merged = store.update_from_report(&reported).expect("report");
        assert_eq!(merged.assets.len(), 1);
        assert_eq!(merged.assets[0].id, "a2");

        let _ = std::fs::remove_dir_all(&root);
    }
}
