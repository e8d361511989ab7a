//! The edit consumer — dedup and batch fan-out in front of the applicator.
//!
//! Delivery is at-least-once: the queue, the stream, and the log channel can
//! all hand over the same edit. The consumer keeps the set of processed ids
//! for the session and applies each id at most once. `importAudioBatch`
//! edits fan out into independent `importAudio` sub-edits, each with a fresh
//! unique id so dedup tracking treats them as distinct.

use std::collections::HashSet;

use cs_common::types::PendingEdit;
use cs_common::EditorState;
use serde_json::Value;
use tracing::{debug, info, warn};

use cs_timeline::{apply_edit, EditAction};

/// Session-scoped edit intake. One per live editor session.
#[derive(Debug, Default)]
pub struct EditConsumer {
    processed: HashSet<String>,
}

impl EditConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an edit id has already been applied this session.
    pub fn is_processed(&self, edit_id: &str) -> bool {
        self.processed.contains(edit_id)
    }

    /// Apply one pending edit. Returns true if the live state changed.
    ///
    /// Replays, unknown actions, and malformed payloads are dropped with a
    /// log line; nothing in this path raises.
    pub fn consume(&mut self, state: &mut EditorState, edit: &PendingEdit) -> bool {
        if !self.processed.insert(edit.id.clone()) {
            debug!(edit_id = %edit.id, "skipping already-processed edit");
            return false;
        }

        if edit.action == "importAudioBatch" {
            return self.fan_out_audio_batch(state, edit);
        }

        match EditAction::from_pending(edit) {
            Ok(action) => {
                let changed = apply_edit(state, &action);
                info!(edit_id = %edit.id, action = %action.name(), changed, "applied edit");
                changed
            }
            Err(error) => {
                // Past ingestion validation this is unexpected; drop, don't crash.
                warn!(edit_id = %edit.id, action = %edit.action, %error, "dropping unappliable edit");
                false
            }
        }
    }

    fn fan_out_audio_batch(&mut self, state: &mut EditorState, edit: &PendingEdit) -> bool {
        let items = match edit.data.get("items").and_then(Value::as_array) {
            Some(items) => items.clone(),
            None => {
                warn!(edit_id = %edit.id, "dropping audio batch without items");
                return false;
            }
        };
        debug!(edit_id = %edit.id, count = items.len(), "fanning out audio batch");

        let mut changed = false;
        for item in items {
            let sub_edit = PendingEdit {
                id: cs_common::sub_edit_id(&edit.id),
                action: "importAudio".to_string(),
                data: item,
                timestamp: edit.timestamp,
                processed: false,
            };
            changed |= self.consume(state, &sub_edit);
        }
        changed
    }
}
