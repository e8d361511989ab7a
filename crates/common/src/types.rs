//! Snapshot data model — web-editor compatible JSON format.
//!
//! These types match the editor's TypeScript interfaces (timeline store,
//! media store, project store), enabling the native sync engine to read and
//! write the same snapshot documents the browser UI produces.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// Full canonical state of one project: metadata, timeline, media library.
///
/// This is the unit of durable truth. Only one writer should be active at a
/// time; the debounce + reconciliation discipline (not locking) enforces it.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Project metadata. Absent in freshly initialized workspaces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectMeta>,
    /// Ordered tracks; index 0 is topmost when composited.
    #[serde(default)]
    pub tracks: Vec<Track>,
    /// Imported media assets, independent of timeline placement.
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// Project metadata. `id` is the reconciliation key: snapshots carrying a
/// different `id` are rejected outright to prevent cross-project data bleed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMeta {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_fps")]
    pub fps: f64,
    #[serde(default)]
    pub canvas_size: CanvasSize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// ISO 8601 creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// ISO 8601 last-modified timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Project thumbnail reference (data URL or file path).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl ProjectMeta {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = crate::time::now_iso();
        Self {
            id: id.into(),
            name: name.into(),
            fps: default_fps(),
            canvas_size: CanvasSize::default(),
            background_color: None,
            created_at: Some(now.clone()),
            updated_at: Some(now),
            thumbnail: None,
        }
    }
}

fn default_fps() -> f64 {
    30.0
}

/// Composition canvas size in pixels.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// An ordered, typed container of elements. Track order encodes z-order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub track_type: TrackType,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub is_hidden: bool,
    /// The primary track of its type. Import placement prefers non-main tracks.
    #[serde(default)]
    pub is_main: bool,
}

impl Track {
    /// Create a new empty track with a fresh id and a default name.
    pub fn new(track_type: TrackType, name: impl Into<String>) -> Self {
        Self {
            id: crate::ids::new_track_id(),
            name: name.into(),
            track_type,
            elements: Vec::new(),
            muted: false,
            is_hidden: false,
            is_main: false,
        }
    }
}

/// Track type: media (video/image), audio, or text overlays.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    Media,
    Audio,
    Text,
}

impl fmt::Display for TrackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackType::Media => write!(f, "media"),
            TrackType::Audio => write!(f, "audio"),
            TrackType::Text => write!(f, "text"),
        }
    }
}

/// One placed item on a track — a media clip or a text overlay.
///
/// Tagged on `"type"` to match the editor's JSON. Identity is the opaque
/// `id`, unique within its track. Media elements reference an `Asset` weakly
/// by `media_id`; a dangling reference is a render-time skip, not an error.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Media(MediaElement),
    Text(TextElement),
}

impl Element {
    pub fn id(&self) -> &str {
        match self {
            Element::Media(m) => &m.id,
            Element::Text(t) => &t.id,
        }
    }

    pub fn start_time(&self) -> f64 {
        match self {
            Element::Media(m) => m.start_time,
            Element::Text(t) => t.start_time,
        }
    }

    /// Visible span on the timeline: `duration - trim_start - trim_end`.
    pub fn visible_duration(&self) -> f64 {
        match self {
            Element::Media(m) => m.duration - m.trim_start - m.trim_end,
            Element::Text(t) => t.duration - t.trim_start - t.trim_end,
        }
    }

    /// End of the visible span (`start_time + visible_duration`).
    pub fn end_time(&self) -> f64 {
        self.start_time() + self.visible_duration()
    }
}

/// A media clip placed on a track.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaElement {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Weak reference to an `Asset` by id.
    pub media_id: String,
    #[serde(default)]
    pub start_time: f64,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub trim_start: f64,
    #[serde(default)]
    pub trim_end: f64,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "one")]
    pub scale: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "one")]
    pub opacity: f64,
    #[serde(default = "one")]
    pub volume: f64,
    #[serde(default)]
    pub muted: bool,
}

/// A text overlay placed on a track. Style fields are flat (never nested);
/// see the normalizer for how historical payload shapes are unified.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub start_time: f64,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub trim_start: f64,
    #[serde(default)]
    pub trim_end: f64,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_text_color")]
    pub color: String,
    #[serde(default = "default_background")]
    pub background_color: String,
    #[serde(default = "default_text_align")]
    pub text_align: String,
    #[serde(default = "default_normal")]
    pub font_weight: String,
    #[serde(default = "default_normal")]
    pub font_style: String,
    #[serde(default = "default_text_decoration")]
    pub text_decoration: String,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "one")]
    pub opacity: f64,
}

/// Canonical text style defaults, shared with the edit normalizer.
pub mod text_defaults {
    pub const FONT_SIZE: f64 = 48.0;
    pub const FONT_FAMILY: &str = "Arial";
    pub const COLOR: &str = "#ffffff";
    pub const BACKGROUND_COLOR: &str = "transparent";
    pub const TEXT_ALIGN: &str = "center";
    pub const FONT_WEIGHT: &str = "normal";
    pub const FONT_STYLE: &str = "normal";
    pub const TEXT_DECORATION: &str = "none";
}

fn one() -> f64 {
    1.0
}
fn default_font_size() -> f64 {
    text_defaults::FONT_SIZE
}
fn default_font_family() -> String {
    text_defaults::FONT_FAMILY.to_string()
}
fn default_text_color() -> String {
    text_defaults::COLOR.to_string()
}
fn default_background() -> String {
    text_defaults::BACKGROUND_COLOR.to_string()
}
fn default_text_align() -> String {
    text_defaults::TEXT_ALIGN.to_string()
}
fn default_normal() -> String {
    text_defaults::FONT_WEIGHT.to_string()
}
fn default_text_decoration() -> String {
    text_defaults::TEXT_DECORATION.to_string()
}

/// An imported media file's metadata, independent of timeline placement.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    /// Resolved location the editor/renderer actually loads.
    pub url: String,
    /// Absolute-path backing reference for linked (non-copied) files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Asset media type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Video,
    Audio,
    Image,
}

impl AssetType {
    /// Sniff a media type from a file extension. Returns `None` for
    /// extensions that don't decide the type (the caller falls back to the
    /// action name or to video).
    pub fn sniff_from_path(path: &str) -> Option<AssetType> {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "webp" => Some(AssetType::Image),
            "mp3" | "wav" | "aac" => Some(AssetType::Audio),
            _ => None,
        }
    }

    /// Which track type elements of this asset type are placed on.
    pub fn track_type(self) -> TrackType {
        match self {
            AssetType::Audio => TrackType::Audio,
            AssetType::Video | AssetType::Image => TrackType::Media,
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetType::Video => write!(f, "video"),
            AssetType::Audio => write!(f, "audio"),
            AssetType::Image => write!(f, "image"),
        }
    }
}

/// A queued external mutation request awaiting application.
///
/// Entries are retained after processing (capped at the most recent 100) so
/// late or duplicated delivery can be detected instead of re-applied.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingEdit {
    pub id: String,
    pub action: String,
    #[serde(default)]
    pub data: Value,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub processed: bool,
}

impl PendingEdit {
    /// Create a new unprocessed edit with a fresh id and current timestamp.
    pub fn new(action: impl Into<String>, data: Value) -> Self {
        Self {
            id: crate::ids::new_edit_id(),
            action: action.into(),
            data,
            timestamp: crate::time::now_millis(),
            processed: false,
        }
    }
}
