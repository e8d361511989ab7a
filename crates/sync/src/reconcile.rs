//! The reconciler — merging an external snapshot into live state.
//!
//! Order matters: the project-identity gate runs first and rejects the
//! whole document on mismatch (no partial application). Asset
//! reconciliation runs before any element-level consequence; elements left
//! with a dangling `media_id` are retained and treated as a render-time
//! skip, never structurally deleted.

use cs_common::types::{Asset, CanvasSize, ProjectMeta};
use cs_common::EditorState;
use cs_timeline::normalize_tracks;
use serde_json::Value;
use tracing::{debug, info, warn};

/// What a reconciliation pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// False when the identity gate rejected the snapshot.
    pub accepted: bool,
    pub tracks_replaced: bool,
    pub assets_changed: bool,
    pub project_updated: bool,
}

impl ReconcileOutcome {
    fn rejected() -> Self {
        Self::default()
    }

    /// Whether local state was mutated at all.
    pub fn changed(&self) -> bool {
        self.tracks_replaced || self.assets_changed || self.project_updated
    }
}

/// Merge an incoming snapshot document (raw JSON) into the live state.
pub fn reconcile(state: &mut EditorState, incoming: &Value) -> ReconcileOutcome {
    let incoming_project_id = incoming
        .get("project")
        .and_then(|p| p.get("id"))
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty());

    // Identity gate: a snapshot for a different project is an expected race
    // during project switches, not an error.
    if let (Some(local), Some(incoming_id)) = (&state.project, incoming_project_id) {
        if !local.id.is_empty() && local.id != incoming_id {
            info!(
                local = %local.id,
                incoming = %incoming_id,
                "rejecting snapshot for different project"
            );
            return ReconcileOutcome::rejected();
        }
    }

    let mut outcome = ReconcileOutcome {
        accepted: true,
        ..Default::default()
    };

    if let Some(raw_tracks) = incoming.get("tracks").and_then(Value::as_array) {
        let normalized = normalize_tracks(raw_tracks);
        if normalized != state.tracks {
            debug!(
                tracks = normalized.len(),
                "replacing track list from snapshot"
            );
            state.tracks = normalized;
            outcome.tracks_replaced = true;
        }
    }

    if let Some(raw_assets) = incoming.get("assets").and_then(Value::as_array) {
        outcome.assets_changed = reconcile_assets(state, raw_assets);
    }

    if let Some(raw_project) = incoming.get("project").filter(|p| p.is_object()) {
        outcome.project_updated = reconcile_project(state, raw_project);
    }

    outcome
}

/// Incoming asset list is authoritative: local assets absent from it are
/// removed; known assets get enrichment-field patches; unknown assets with a
/// usable url are added.
fn reconcile_assets(state: &mut EditorState, raw_assets: &[Value]) -> bool {
    let incoming: Vec<Asset> = raw_assets
        .iter()
        .filter_map(|raw| match serde_json::from_value::<Asset>(raw.clone()) {
            Ok(asset) if !asset.url.is_empty() => Some(asset),
            Ok(asset) => {
                warn!(asset_id = %asset.id, "skipping asset without a usable url");
                None
            }
            Err(error) => {
                warn!(%error, "skipping malformed asset in snapshot");
                None
            }
        })
        .collect();

    let mut changed = false;

    // Authoritative delete: anything local the incoming list no longer
    // carries (matched by id, else url) is gone. Referencing elements stay.
    let before = state.assets.len();
    state.assets.retain(|local| {
        incoming
            .iter()
            .any(|inc| inc.id == local.id || inc.url == local.url)
    });
    if state.assets.len() != before {
        debug!(removed = before - state.assets.len(), "removed assets absent from snapshot");
        changed = true;
    }

    for inc in incoming {
        match state
            .assets
            .iter_mut()
            .find(|local| local.id == inc.id || local.url == inc.url)
        {
            Some(local) => {
                changed |= patch_enrichment(local, &inc);
            }
            None => {
                debug!(asset_id = %inc.id, "adding new asset from snapshot");
                state.assets.push(inc);
                changed = true;
            }
        }
    }
    changed
}

/// Patch only the fields that richer metadata fills in later.
fn patch_enrichment(local: &mut Asset, incoming: &Asset) -> bool {
    let mut changed = false;
    if let Some(thumbnail) = &incoming.thumbnail_url {
        if !thumbnail.is_empty() && local.thumbnail_url.as_ref() != Some(thumbnail) {
            local.thumbnail_url = Some(thumbnail.clone());
            changed = true;
        }
    }
    if let Some(duration) = incoming.duration {
        if duration > 0.0 && local.duration != Some(duration) {
            local.duration = Some(duration);
            changed = true;
        }
    }
    if let Some(width) = incoming.width {
        if width > 0 && local.width != Some(width) {
            local.width = Some(width);
            changed = true;
        }
    }
    if let Some(height) = incoming.height {
        if height > 0 && local.height != Some(height) {
            local.height = Some(height);
            changed = true;
        }
    }
    changed
}

/// Field-level last-writer-wins over project metadata. Only fields the
/// incoming document actually carries are applied.
fn reconcile_project(state: &mut EditorState, raw_project: &Value) -> bool {
    let local = match &mut state.project {
        Some(local) => local,
        None => {
            return match serde_json::from_value::<ProjectMeta>(raw_project.clone()) {
                Ok(meta) => {
                    debug!(project_id = %meta.id, "adopting project metadata from snapshot");
                    state.project = Some(meta);
                    true
                }
                Err(error) => {
                    warn!(%error, "ignoring malformed project metadata");
                    false
                }
            };
        }
    };

    let mut changed = false;
    if let Some(name) = raw_project.get("name").and_then(Value::as_str) {
        if !name.is_empty() && local.name != name {
            local.name = name.to_string();
            changed = true;
        }
    }
    if let Some(fps) = raw_project.get("fps").and_then(Value::as_f64) {
        if fps > 0.0 && local.fps != fps {
            local.fps = fps;
            changed = true;
        }
    }
    if let Some(canvas) = raw_project.get("canvasSize") {
        if let Ok(canvas) = serde_json::from_value::<CanvasSize>(canvas.clone()) {
            if local.canvas_size != canvas {
                local.canvas_size = canvas;
                changed = true;
            }
        }
    }
    if let Some(color) = raw_project.get("backgroundColor").and_then(Value::as_str) {
        if !color.is_empty() && local.background_color.as_deref() != Some(color) {
            local.background_color = Some(color.to_string());
            changed = true;
        }
    }
    if let Some(thumbnail) = raw_project.get("thumbnail").and_then(Value::as_str) {
        if !thumbnail.is_empty() && local.thumbnail.as_deref() != Some(thumbnail) {
            local.thumbnail = Some(thumbnail.to_string());
            changed = true;
        }
    }
    if let Some(updated_at) = raw_project.get("updatedAt").and_then(Value::as_str) {
        if !updated_at.is_empty() && local.updated_at.as_deref() != Some(updated_at) {
            local.updated_at = Some(updated_at.to_string());
            changed = true;
        }
    }
    changed
}
