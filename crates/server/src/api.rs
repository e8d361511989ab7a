//! The edit API — request handling, transport-agnostic.
//!
//! `EditApi` owns the queue and the snapshot store and turns parsed
//! requests into JSON responses with HTTP-ish status codes. The tiny_http
//! loop in `http.rs` is a thin shell around it, which keeps every endpoint
//! testable without sockets.

use serde_json::{json, Value};
use tracing::{info, warn};

use cs_common::types::Snapshot;
use cs_store::{write_atomic, EditQueue, SnapshotStore, StoreResult, WorkspacePaths};
use cs_timeline::EditAction;

/// A status code and JSON body, ready for any transport.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn bad_request(error: impl std::fmt::Display) -> Self {
        Self {
            status: 400,
            body: json!({"success": false, "error": error.to_string()}),
        }
    }

    fn not_found(error: &str) -> Self {
        Self {
            status: 404,
            body: json!({"success": false, "error": error}),
        }
    }

    fn server_error(error: impl std::fmt::Display) -> Self {
        Self {
            status: 500,
            body: json!({"success": false, "error": error.to_string()}),
        }
    }
}

pub struct EditApi {
    paths: WorkspacePaths,
    queue: EditQueue,
    store: SnapshotStore,
}

impl EditApi {
    pub fn new(paths: WorkspacePaths) -> StoreResult<Self> {
        paths.ensure_layout()?;
        let queue = EditQueue::new(paths.pending_edits_file());
        let store = SnapshotStore::new(paths.clone());
        Ok(Self {
            paths,
            queue,
            store,
        })
    }

    /// `POST /edits` with `{action, data}`.
    pub fn handle_post(&self, body: &Value) -> ApiResponse {
        let action = match body.get("action").and_then(Value::as_str) {
            Some(action) if !action.is_empty() => action,
            _ => return ApiResponse::bad_request("action is required"),
        };
        let data = body.get("data").cloned().unwrap_or_else(|| json!({}));

        // Control actions manage the stores directly and never queue.
        match action {
            "updateSnapshot" => return self.update_snapshot(&data),
            "loadProject" => return self.load_project(&data),
            "archiveProject" => return self.archive_project(&data),
            "switchProject" => return self.switch_project(&data),
            _ => {}
        }

        // Everything else must be a valid edit action before it queues.
        let parsed = match EditAction::from_parts(action, &data) {
            Ok(parsed) => parsed,
            Err(error) => {
                warn!(action, %error, "rejecting edit request");
                return ApiResponse::bad_request(error);
            }
        };

        // setFullState additionally feeds the live stream via the
        // sync-input file.
        if matches!(parsed, EditAction::SetFullState { .. }) {
            let mut payload = data.clone();
            if let Some(map) = payload.as_object_mut() {
                map.insert("action".into(), Value::String(action.to_string()));
            }
            if let Err(error) = write_atomic(&self.paths.sync_input_file(), &payload.to_string()) {
                warn!(%error, "failed to write sync input");
            }
        }

        match self.queue.enqueue(action, data) {
            Ok(edit) => ApiResponse::ok(json!({"success": true, "editId": edit.id})),
            Err(error) => ApiResponse::server_error(error),
        }
    }

    /// `GET /edits?action=...`.
    pub fn handle_get(&self, params: &[(String, String)]) -> ApiResponse {
        let action = params
            .iter()
            .find(|(key, _)| key == "action")
            .map(|(_, value)| value.as_str());
        match action {
            Some("poll") => {
                ApiResponse::ok(json!({"success": true, "edits": self.queue.list_unprocessed()}))
            }
            Some("markProcessed") => {
                let ids: Vec<String> = params
                    .iter()
                    .find(|(key, _)| key == "ids")
                    .map(|(_, value)| {
                        value
                            .split(',')
                            .filter(|id| !id.is_empty())
                            .map(|id| id.to_string())
                            .collect()
                    })
                    .unwrap_or_default();
                match self.queue.mark_processed(&ids) {
                    Ok(marked) => ApiResponse::ok(json!({"success": true, "marked": marked})),
                    Err(error) => ApiResponse::server_error(error),
                }
            }
            Some("clear") => match self.queue.clear() {
                Ok(()) => ApiResponse::ok(json!({"success": true})),
                Err(error) => ApiResponse::server_error(error),
            },
            Some("getSnapshot") => match self.store.read() {
                Ok(Some(snapshot)) => {
                    ApiResponse::ok(json!({"success": true, "snapshot": snapshot}))
                }
                Ok(None) => ApiResponse::not_found("snapshot not available"),
                Err(error) => ApiResponse::server_error(error),
            },
            Some("listProjects") => match self.store.list_projects() {
                Ok(projects) => ApiResponse::ok(json!({"success": true, "projects": projects})),
                Err(error) => ApiResponse::server_error(error),
            },
            Some(other) => ApiResponse::bad_request(format!("unknown query action: {other}")),
            None => ApiResponse::bad_request("action query parameter is required"),
        }
    }

    /// Persist a reported snapshot: backup, merge over live, archive.
    fn update_snapshot(&self, data: &Value) -> ApiResponse {
        let reported: Snapshot = match serde_json::from_value(data.clone()) {
            Ok(reported) => reported,
            Err(error) => return ApiResponse::bad_request(format!("invalid snapshot: {error}")),
        };
        match self.store.update_from_report(&reported) {
            Ok(merged) => {
                info!(
                    tracks = merged.tracks.len(),
                    assets = merged.assets.len(),
                    "snapshot updated from report"
                );
                ApiResponse::ok(json!({"success": true}))
            }
            Err(error) => ApiResponse::server_error(error),
        }
    }

    fn load_project(&self, data: &Value) -> ApiResponse {
        let project_id = match data.get("projectId").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id,
            _ => return ApiResponse::bad_request("projectId is required"),
        };
        match self.store.load_into_live(project_id) {
            Ok(snapshot) => ApiResponse::ok(json!({"success": true, "snapshot": snapshot})),
            Err(error @ cs_store::StoreError::ProjectNotArchived { .. }) => {
                ApiResponse::not_found(&error.to_string())
            }
            Err(error) => ApiResponse::server_error(error),
        }
    }

    /// Archive by explicit id, or the live project's own id when none is
    /// given.
    fn archive_project(&self, data: &Value) -> ApiResponse {
        let project_id = match data.get("projectId").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => match self.store.read() {
                Ok(Some(live)) => match live.project {
                    Some(project) => project.id,
                    None => return ApiResponse::bad_request("projectId is required"),
                },
                Ok(None) => return ApiResponse::bad_request("projectId is required"),
                Err(error) => return ApiResponse::server_error(error),
            },
        };
        match self.store.archive(&project_id) {
            Ok(()) => ApiResponse::ok(json!({"success": true, "projectId": project_id})),
            Err(error) => ApiResponse::server_error(error),
        }
    }

    /// Archive the live project under its own id, then load the requested
    /// one. Switching never loses unsaved live state.
    fn switch_project(&self, data: &Value) -> ApiResponse {
        if let Ok(Some(live)) = self.store.read() {
            if let Some(project) = &live.project {
                if let Err(error) = self.store.archive(&project.id) {
                    warn!(project_id = %project.id, %error, "failed to archive live project before switch");
                }
            }
        }
        self.load_project(data)
    }
}

/// Split a raw query string into key/value pairs. No percent-decoding;
/// edit ids and action names never need it.
pub fn parse_query(url: &str) -> Vec<(String, String)> {
    let query = match url.split_once('?') {
        Some((_, query)) => query,
        None => return Vec::new(),
    };
    query
        .split('&')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cs_common::types::ProjectMeta;

    fn temp_api(name: &str) -> (EditApi, std::path::PathBuf) {
        let root = std::env::temp_dir().join(format!("cs_api_{name}"));
        let _ = std::fs::remove_dir_all(&root);
        let api = EditApi::new(WorkspacePaths::new(&root)).expect("api");
        (api, root)
    }

    fn snapshot_data(project_id: &str) -> Value {
        serde_json::to_value(Snapshot {
            project: Some(ProjectMeta::new(project_id, "Demo")),
            tracks: vec![],
            assets: vec![],
        })
        .expect("value")
    }

    #[test]
    fn post_valid_edit_returns_edit_id() {
        let (api, root) = temp_api("post_valid");
        let response = api.handle_post(&json!({
            "action": "addSubtitle",
            "data": {"text": "hi", "startTime": 0, "duration": 3}
        }));
        assert_eq!(response.status, 200);
        assert_eq!(response.body["success"], true);
        assert!(response.body["editId"]
            .as_str()
            .expect("editId")
            .starts_with("edit_"));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn post_missing_required_field_is_400() {
        let (api, root) = temp_api("post_invalid");
        let response = api.handle_post(&json!({"action": "addSubtitle", "data": {}}));
        assert_eq!(response.status, 400);
        assert_eq!(response.body["success"], false);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn post_unknown_action_is_400() {
        let (api, root) = temp_api("post_unknown");
        let response = api.handle_post(&json!({"action": "transmogrify", "data": {}}));
        assert_eq!(response.status, 400);
        assert!(response.body["error"]
            .as_str()
            .expect("error")
            .contains("unknown action"));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn poll_then_mark_processed() {
        let (api, root) = temp_api("poll_mark");
        let response = api.handle_post(&json!({
            "action": "addSubtitle",
            "data": {"text": "hi"}
        }));
        let edit_id = response.body["editId"].as_str().expect("editId").to_string();

        let response = api.handle_get(&parse_query("/edits?action=poll"));
        assert_eq!(response.body["edits"].as_array().expect("edits").len(), 1);

        let response = api.handle_get(&parse_query(&format!(
            "/edits?action=markProcessed&ids={edit_id}"
        )));
        assert_eq!(response.body["marked"], 1);

        let response = api.handle_get(&parse_query("/edits?action=poll"));
        assert!(response.body["edits"].as_array().expect("edits").is_empty());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn get_snapshot_absent_is_404() {
        let (api, root) = temp_api("get_snapshot");
        let response = api.handle_get(&parse_query("/edits?action=getSnapshot"));
        assert_eq!(response.status, 404);

        api.handle_post(&json!({"action": "updateSnapshot", "data": snapshot_data("p1")}));
        let response = api.handle_get(&parse_query("/edits?action=getSnapshot"));
        assert_eq!(response.status, 200);
        assert_eq!(response.body["snapshot"]["project"]["id"], "p1");

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn set_full_state_writes_sync_input() {
        let (api, root) = temp_api("sync_input");
        let response = api.handle_post(&json!({
            "action": "setFullState",
            "data": {"tracks": []}
        }));
        assert_eq!(response.status, 200);

        let contents =
            std::fs::read_to_string(root.join("sync-input.json")).expect("sync input written");
        let value: Value = serde_json::from_str(&contents).expect("json");
        assert_eq!(value["action"], "setFullState");
        assert!(value["tracks"].as_array().expect("tracks").is_empty());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn project_lifecycle_roundtrip() {
        let (api, root) = temp_api("projects");

        api.handle_post(&json!({"action": "updateSnapshot", "data": snapshot_data("p1")}));
        let response =
            api.handle_post(&json!({"action": "archiveProject", "data": {"projectId": "p1"}}));
        assert_eq!(response.status, 200);

        api.handle_post(&json!({"action": "updateSnapshot", "data": snapshot_data("p2")}));

        // switch back to p1; p2 gets archived on the way out
        let response =
            api.handle_post(&json!({"action": "switchProject", "data": {"projectId": "p1"}}));
        assert_eq!(response.status, 200);
        assert_eq!(response.body["snapshot"]["project"]["id"], "p1");

        let response = api.handle_get(&parse_query("/edits?action=listProjects"));
        let projects = response.body["projects"].as_array().expect("projects");
        assert_eq!(projects.len(), 2);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn archive_without_id_uses_live_project() {
        let (api, root) = temp_api("archive_fallback");

        // nothing live yet, nothing to fall back to
        let response = api.handle_post(&json!({"action": "archiveProject", "data": {}}));
        assert_eq!(response.status, 400);

        api.handle_post(&json!({"action": "updateSnapshot", "data": snapshot_data("p1")}));
        let response = api.handle_post(&json!({"action": "archiveProject", "data": {}}));
        assert_eq!(response.status, 200);
        assert_eq!(response.body["projectId"], "p1");
        assert!(api
            .paths
            .project_snapshot_file("p1")
            .exists());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn load_unknown_project_is_404() {
        let (api, root) = temp_api("load_unknown");
        let response =
            api.handle_post(&json!({"action": "loadProject", "data": {"projectId": "ghost"}}));
        assert_eq!(response.status, 404);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn parse_query_splits_pairs() {
        let params = parse_query("/edits?action=markProcessed&ids=a,b,c");
        assert_eq!(params.len(), 2);
        assert_eq!(params[0], ("action".into(), "markProcessed".into()));
        assert_eq!(params[1], ("ids".into(), "a,b,c".into()));
        assert!(parse_query("/edits").is_empty());
    }
}
