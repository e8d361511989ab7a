//! Edit actions — the closed set of external mutations the engine accepts.
//!
//! Raw requests arrive as `{action: string, data: object}` with untyped
//! payloads. `EditAction::from_parts` is the ingestion boundary: it validates
//! per-action required fields and produces a typed variant, so everything
//! past this point works with known shapes. Unknown actions are a distinct
//! error, not a crash.

use cs_common::types::{AssetType, PendingEdit};
use serde_json::{Map, Value};

use crate::error::{TimelineError, TimelineResult};

/// A validated external edit, ready for the applicator.
#[derive(Clone, Debug, PartialEq)]
pub enum EditAction {
    /// `addSubtitle` / `addText`: append one text element to a text track.
    AddText { data: Value },
    /// `addMultipleSubtitles`: append a batch of text elements to a fresh track.
    AddMultipleSubtitles { subtitles: Vec<Value> },
    /// `clearSubtitles`: remove text elements, optionally range-scoped.
    ClearSubtitles { range: Option<TimeRange> },
    /// `removeElement`: delete one element by track and element id.
    RemoveElement {
        track_id: String,
        element_id: String,
    },
    /// `updateElement`: shallow-merge updates into one element.
    UpdateElement {
        element_id: String,
        updates: Map<String, Value>,
    },
    /// `setFullState`: replace the entire track list.
    SetFullState { tracks: Vec<Value> },
    /// `importMedia` / `importImage` / `importVideo` / `importAudio`.
    Import(ImportRequest),
    /// `importAudioBatch`: fan out into independent audio imports.
    ImportAudioBatch { items: Vec<Value> },
}

/// A half-open time range `[start_time, start_time + duration)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TimeRange {
    pub start_time: f64,
    pub duration: f64,
}

impl TimeRange {
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Interval-overlap test against an element span `[start, end)`.
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        !(end <= self.start_time || start >= self.end_time())
    }
}

/// A validated media import: what to register and where to place it.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportRequest {
    pub asset_type: AssetType,
    pub file_path: String,
    pub url: Option<String>,
    pub name: Option<String>,
    /// Placement start supplied directly on the payload.
    pub start_time: Option<f64>,
    /// Placement start carried in imported metadata; wins over `start_time`.
    pub metadata_start_time: Option<f64>,
    pub duration: Option<f64>,
    /// Explicitly preferred target track.
    pub track_id: Option<String>,
}

impl ImportRequest {
    /// Parse an import payload. `forced_type` pins the media type when the
    /// action name decides it (`importImage`, `importAudio`, `importVideo`);
    /// otherwise the payload's `type` field, then extension sniffing, then
    /// video decide.
    pub fn from_data(
        action: &'static str,
        forced_type: Option<AssetType>,
        data: &Value,
    ) -> TimelineResult<ImportRequest> {
        let file_path = require_str(action, data, "filePath")?;
        let asset_type = forced_type
            .or_else(|| declared_asset_type(data))
            .or_else(|| AssetType::sniff_from_path(&file_path))
            .unwrap_or(AssetType::Video);

        Ok(ImportRequest {
            asset_type,
            url: opt_str(data, "url"),
            name: opt_str(data, "name"),
            start_time: opt_f64(data, "startTime"),
            metadata_start_time: data
                .get("metadata")
                .and_then(|m| m.get("startTime"))
                .and_then(Value::as_f64),
            duration: opt_f64(data, "duration"),
            track_id: opt_str(data, "trackId"),
            file_path,
        })
    }
}

impl EditAction {
    /// Validate and type a raw `{action, data}` pair.
    pub fn from_parts(action: &str, data: &Value) -> TimelineResult<EditAction> {
        match action {
            "addSubtitle" | "addText" => {
                let has_text = opt_str(data, "text")
                    .or_else(|| opt_str(data, "content"))
                    .map(|s| !s.is_empty())
                    .unwrap_or(false);
                if !has_text {
                    return Err(TimelineError::MissingField {
                        action: "addSubtitle",
                        field: "text",
                    });
                }
                Ok(EditAction::AddText { data: data.clone() })
            }
            "addMultipleSubtitles" => {
                let subtitles = require_array("addMultipleSubtitles", data, "subtitles")?;
                Ok(EditAction::AddMultipleSubtitles { subtitles })
            }
            "clearSubtitles" => {
                let start = opt_f64(data, "startTime");
                let duration = opt_f64(data, "duration");
                let range = match (start, duration) {
                    (Some(start_time), Some(duration)) => Some(TimeRange {
                        start_time,
                        duration,
                    }),
                    _ => None,
                };
                Ok(EditAction::ClearSubtitles { range })
            }
            "removeElement" => Ok(EditAction::RemoveElement {
                track_id: require_str("removeElement", data, "trackId")?,
                element_id: require_str("removeElement", data, "elementId")?,
            }),
            "updateElement" => {
                let element_id = require_str("updateElement", data, "elementId")?;
                let updates = match data.get("updates") {
                    Some(Value::Object(map)) => map.clone(),
                    Some(Value::Null) | None => {
                        return Err(TimelineError::MissingField {
                            action: "updateElement",
                            field: "updates",
                        })
                    }
                    Some(_) => {
                        return Err(TimelineError::InvalidField {
                            action: "updateElement",
                            field: "updates",
                            reason: "must be an object",
                        })
                    }
                };
                Ok(EditAction::UpdateElement {
                    element_id,
                    updates,
                })
            }
            "setFullState" => Ok(EditAction::SetFullState {
                tracks: require_array("setFullState", data, "tracks")?,
            }),
            "importMedia" => Ok(EditAction::Import(ImportRequest::from_data(
                "importMedia",
                None,
                data,
            )?)),
            "importImage" => Ok(EditAction::Import(ImportRequest::from_data(
                "importImage",
                Some(AssetType::Image),
                data,
            )?)),
            "importVideo" => Ok(EditAction::Import(ImportRequest::from_data(
                "importVideo",
                Some(AssetType::Video),
                data,
            )?)),
            "importAudio" => Ok(EditAction::Import(ImportRequest::from_data(
                "importAudio",
                Some(AssetType::Audio),
                data,
            )?)),
            "importAudioBatch" => Ok(EditAction::ImportAudioBatch {
                items: require_array("importAudioBatch", data, "items")?,
            }),
            other => Err(TimelineError::UnknownAction(other.to_string())),
        }
    }

    /// Validate a queued edit.
    pub fn from_pending(edit: &PendingEdit) -> TimelineResult<EditAction> {
        EditAction::from_parts(&edit.action, &edit.data)
    }

    /// Stable name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            EditAction::AddText { .. } => "addText",
            EditAction::AddMultipleSubtitles { .. } => "addMultipleSubtitles",
            EditAction::ClearSubtitles { .. } => "clearSubtitles",
            EditAction::RemoveElement { .. } => "removeElement",
            EditAction::UpdateElement { .. } => "updateElement",
            EditAction::SetFullState { .. } => "setFullState",
            EditAction::Import(req) => match req.asset_type {
                AssetType::Image => "importImage",
                AssetType::Audio => "importAudio",
                AssetType::Video => "importVideo",
            },
            EditAction::ImportAudioBatch { .. } => "importAudioBatch",
        }
    }
}

fn declared_asset_type(data: &Value) -> Option<AssetType> {
    match data.get("type").and_then(Value::as_str)? {
        "image" => Some(AssetType::Image),
        "audio" => Some(AssetType::Audio),
        "video" => Some(AssetType::Video),
        _ => None,
    }
}

fn opt_str(data: &Value, field: &str) -> Option<String> {
    data.get(field)
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}

fn opt_f64(data: &Value, field: &str) -> Option<f64> {
    data.get(field).and_then(Value::as_f64)
}

fn require_str(action: &'static str, data: &Value, field: &'static str) -> TimelineResult<String> {
    match data.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        // null and empty strings count as absent, matching lax producers
        Some(Value::String(_)) | Some(Value::Null) | None => {
            Err(TimelineError::MissingField { action, field })
        }
        Some(_) => Err(TimelineError::InvalidField {
            action,
            field,
            reason: "must be a string",
        }),
    }
}

fn require_array(
    action: &'static str,
    data: &Value,
    field: &'static str,
) -> TimelineResult<Vec<Value>> {
    match data.get(field) {
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(Value::Null) | None => Err(TimelineError::MissingField { action, field }),
        Some(_) => Err(TimelineError::InvalidField {
            action,
            field,
            reason: "must be an array",
        }),
    }
}
