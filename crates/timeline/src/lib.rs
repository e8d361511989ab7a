//! `cs-timeline` — edit actions, payload normalization, and the applicator.
//!
//! External mutations enter as raw `{action, data}` JSON, are validated into
//! typed [`EditAction`]s at the ingestion boundary, normalized into the
//! canonical element shape, and applied to an `EditorState` by [`apply_edit`].

pub mod action;
pub mod apply;
pub mod error;
pub mod normalize;

pub use action::{EditAction, ImportRequest, TimeRange};
pub use apply::{apply_edit, AI_SUBTITLE_TRACK_NAME, AI_VOICE_TRACK_NAME};
pub use error::{TimelineError, TimelineResult};
pub use normalize::{normalize_element, normalize_track, normalize_tracks};
