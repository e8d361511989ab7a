//! `cs-common` — Shared types and helpers for the CutSync sync engine.
//!
//! This crate is the foundation the other engine crates depend on. It defines:
//!
//! - **Model**: `Snapshot`, `ProjectMeta`, `Track`, `Element`, `Asset`,
//!   `PendingEdit` (the on-disk/wire JSON shapes, camelCase)
//! - **State**: `EditorState` (the in-memory state container all mutation
//!   flows through)
//! - **Ids**: opaque id generation for edits, elements, tracks, and assets
//! - **Time**: ISO-8601 timestamps and history-slot naming

pub mod ids;
pub mod state;
pub mod time;
pub mod types;

// Re-export commonly used items at crate root
pub use ids::{new_asset_id, new_edit_id, new_element_id, new_track_id, sub_edit_id};
pub use state::EditorState;
pub use time::{history_slot_name, now_iso, now_millis};
pub use types::{
    Asset, AssetType, CanvasSize, Element, MediaElement, PendingEdit, ProjectMeta, Snapshot,
    TextElement, Track, TrackType,
};
