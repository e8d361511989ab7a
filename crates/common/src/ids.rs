//! Opaque id generation for edits, tracks, elements, and assets.

use uuid::Uuid;

/// Generate a pending-edit id: `edit_<millis>_<fragment>`.
///
/// The timestamp prefix keeps ids roughly sortable in logs; uniqueness comes
/// from the random fragment.
pub fn new_edit_id() -> String {
    format!(
        "edit_{}_{}",
        crate::time::now_millis(),
        short_fragment()
    )
}

/// Derive a fresh id for a sub-edit fanned out of a batch edit.
///
/// Each sub-edit gets its own unique id so processed-id tracking treats it
/// as distinct from its parent and its siblings.
pub fn sub_edit_id(parent_id: &str) -> String {
    format!("{parent_id}_{}", short_fragment())
}

pub fn new_track_id() -> String {
    format!("track-{}", Uuid::new_v4())
}

pub fn new_element_id() -> String {
    format!("el-{}", Uuid::new_v4())
}

pub fn new_asset_id() -> String {
    format!("asset-{}", Uuid::new_v4())
}

fn short_fragment() -> String {
    Uuid::new_v4().simple().to_string()[..9].to_string()
}
