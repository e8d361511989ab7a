//! One live sync session — the glue that closes the loop.
//!
//! Owns the editor state plus the consumer and reporter, and connects them
//! to the stores and the change feed: queued edits are pumped through the
//! consumer, feed events are reconciled or applied, and settled local state
//! is reported back to the snapshot store after the quiet period.

use serde_json::Value;
use tracing::{debug, warn};

use cs_common::EditorState;
use cs_store::{EditQueue, SnapshotStore};
use cs_timeline::{apply_edit, EditAction};

use crate::consumer::EditConsumer;
use crate::error::SyncResult;
use crate::feed::FeedEvent;
use crate::reconcile::reconcile;
use crate::report::DebouncedReporter;

pub struct SyncSession {
    state: EditorState,
    consumer: EditConsumer,
    reporter: DebouncedReporter,
}

impl SyncSession {
    pub fn new() -> Self {
        Self::with_reporter(DebouncedReporter::new())
    }

    /// Mostly for tests, which want a zero quiet period.
    pub fn with_reporter(reporter: DebouncedReporter) -> Self {
        Self {
            state: EditorState::new(),
            consumer: EditConsumer::new(),
            reporter,
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// Apply a local (UI-originated) mutation. Restarts the report debounce.
    pub fn edit_locally(&mut self, mutate: impl FnOnce(&mut EditorState)) {
        mutate(&mut self.state);
        self.reporter.mark_changed();
    }

    /// Drain unprocessed edits from the queue through the consumer and mark
    /// them processed. Returns how many edits were taken off the queue.
    pub fn pump_queue(&mut self, queue: &EditQueue) -> SyncResult<usize> {
        let edits = queue.list_unprocessed();
        if edits.is_empty() {
            return Ok(0);
        }
        let mut changed = false;
        let ids: Vec<String> = edits
            .iter()
            .map(|edit| {
                changed |= self.consumer.consume(&mut self.state, edit);
                edit.id.clone()
            })
            .collect();
        queue.mark_processed(&ids)?;
        if changed {
            self.reporter.mark_changed();
        }
        Ok(ids.len())
    }

    /// Feed one change event into the session.
    pub fn handle_event(&mut self, event: &FeedEvent) {
        match event {
            FeedEvent::Connected => {
                debug!("sync stream connected");
            }
            FeedEvent::SnapshotUpdate(document) => {
                let outcome = reconcile(&mut self.state, document);
                if outcome.accepted {
                    self.reporter.mark_synced();
                }
                if outcome.changed() {
                    self.reporter.mark_changed();
                }
            }
            FeedEvent::Update(value) => self.apply_update(value),
        }
    }

    /// Sync-input updates arrive action-shaped (`{action, ...fields}`) and
    /// apply directly; they are not queue entries and carry no edit id.
    fn apply_update(&mut self, value: &Value) {
        let action = match value.get("action").and_then(Value::as_str) {
            Some(action) => action,
            None => {
                warn!("dropping sync update without an action");
                return;
            }
        };
        match EditAction::from_parts(action, value) {
            Ok(parsed) => {
                if apply_edit(&mut self.state, &parsed) {
                    self.reporter.mark_changed();
                }
            }
            Err(error) => {
                warn!(action, %error, "dropping unappliable sync update");
            }
        }
    }

    /// Timer tick: push the state to the store if a report is due.
    /// Returns true when a report was written.
    pub fn tick(&mut self, store: &SnapshotStore) -> SyncResult<bool> {
        if !self.reporter.should_report(&self.state) {
            return Ok(false);
        }
        store.update_from_report(&self.state.to_snapshot())?;
        self.reporter.mark_reported(&self.state);
        Ok(true)
    }

    /// Session teardown: no stale debounce may fire afterwards.
    pub fn shutdown(&mut self) {
        self.reporter.cancel();
    }
}

impl Default for SyncSession {
    fn default() -> Self {
        Self::new()
    }
}
