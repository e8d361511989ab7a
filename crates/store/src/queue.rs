//! The durable edit queue — a single bounded JSON document of pending edits.
//!
//! Entries are retained after processing (capped at the most recent 100) so
//! late or duplicated delivery can be detected instead of re-applied. A
//! corrupt queue file degrades to an empty list: a new edit must always be
//! able to enqueue.

use std::path::PathBuf;

use cs_common::types::PendingEdit;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::atomic::write_atomic;
use crate::error::StoreResult;

/// Retained entries after `mark_processed` truncation.
pub const MAX_QUEUE_ENTRIES: usize = 100;

/// Disk-backed pending-edit queue. Read-modify-write, single writer assumed.
#[derive(Clone, Debug)]
pub struct EditQueue {
    path: PathBuf,
}

impl EditQueue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append a new unprocessed edit with a fresh id. Returns the entry.
    pub fn enqueue(&self, action: &str, data: Value) -> StoreResult<PendingEdit> {
        let edit = PendingEdit::new(action, data);
        let mut edits = self.load();
        edits.push(edit.clone());
        self.store(&edits)?;
        info!(edit_id = %edit.id, action = %edit.action, "enqueued edit");
        Ok(edit)
    }

    /// All entries still awaiting processing, in insertion order.
    pub fn list_unprocessed(&self) -> Vec<PendingEdit> {
        self.load().into_iter().filter(|e| !e.processed).collect()
    }

    /// Every retained entry, processed or not.
    pub fn list_all(&self) -> Vec<PendingEdit> {
        self.load()
    }

    /// Flip the processed flag for matching ids, then truncate the queue to
    /// the most recent [`MAX_QUEUE_ENTRIES`] entries. Returns how many
    /// entries were newly marked.
    pub fn mark_processed(&self, ids: &[String]) -> StoreResult<usize> {
        let mut edits = self.load();
        let mut marked = 0usize;
        for edit in edits.iter_mut() {
            if !edit.processed && ids.iter().any(|id| id == &edit.id) {
                edit.processed = true;
                marked += 1;
            }
        }
        if edits.len() > MAX_QUEUE_ENTRIES {
            edits.drain(..edits.len() - MAX_QUEUE_ENTRIES);
        }
        self.store(&edits)?;
        debug!(marked, retained = edits.len(), "marked edits processed");
        Ok(marked)
    }

    /// Empty the queue.
    pub fn clear(&self) -> StoreResult<()> {
        self.store(&[])
    }

    fn load(&self) -> Vec<PendingEdit> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(error) => {
                warn!(path = %self.path.display(), %error, "queue file unreadable, starting empty");
                return Vec::new();
            }
        };
        // Entries are filtered individually: one malformed entry must not
        // take the valid ones down with it.
        match serde_json::from_str::<Vec<Value>>(&contents) {
            Ok(raw) => raw
                .into_iter()
                .filter_map(|entry| match serde_json::from_value::<PendingEdit>(entry) {
                    Ok(edit) => Some(edit),
                    Err(error) => {
                        warn!(path = %self.path.display(), %error, "dropping malformed queue entry");
                        None
                    }
                })
                .collect(),
            Err(error) => {
                warn!(path = %self.path.display(), %error, "queue file corrupt, starting empty");
                Vec::new()
            }
        }
    }

    fn store(&self, edits: &[PendingEdit]) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(edits)?;
        write_atomic(&self.path, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_queue(name: &str) -> (EditQueue, PathBuf) {
        let dir = std::env::temp_dir().join(format!("cs_queue_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        let _ = std::fs::create_dir_all(&dir);
        (EditQueue::new(dir.join("pending-edits.json")), dir)
    }

    #[test]
    fn enqueue_then_poll() {
        let (queue, dir) = temp_queue("enqueue");

        let edit = queue
            .enqueue("addText", json!({"text": "hi"}))
            .expect("enqueue");
        assert!(!edit.processed);

        let unprocessed = queue.list_unprocessed();
        assert_eq!(unprocessed.len(), 1);
        assert_eq!(unprocessed[0].id, edit.id);
        assert_eq!(unprocessed[0].action, "addText");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn mark_processed_hides_from_poll_but_retains() {
        let (queue, dir) = temp_queue("mark");

        let a = queue.enqueue("addText", json!({"text": "a"})).expect("a");
        let b = queue.enqueue("addText", json!({"text": "b"})).expect("b");

        let marked = queue.mark_processed(&[a.id.clone()]).expect("mark");
        assert_eq!(marked, 1);

        let unprocessed = queue.list_unprocessed();
        assert_eq!(unprocessed.len(), 1);
        assert_eq!(unprocessed[0].id, b.id);
        // processed entries stay in the log for dedup
        assert_eq!(queue.list_all().len(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn marking_twice_is_idempotent() {
        let (queue, dir) = temp_queue("mark_twice");

        let a = queue.enqueue("addText", json!({"text": "a"})).expect("a");
        assert_eq!(queue.mark_processed(&[a.id.clone()]).expect("first"), 1);
        assert_eq!(queue.mark_processed(&[a.id]).expect("second"), 0);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn queue_is_bounded_after_mark() {
        let (queue, dir) = temp_queue("bounded");

        for i in 0..120 {
            queue
                .enqueue("addText", json!({"text": format!("s{i}")}))
                .expect("enqueue");
        }
        assert_eq!(queue.list_all().len(), 120);

        queue.mark_processed(&[]).expect("truncate");
        let all = queue.list_all();
        assert_eq!(all.len(), MAX_QUEUE_ENTRIES);
        // the oldest entries were dropped, newest retained
        assert_eq!(all.last().expect("last").data["text"], "s119");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_file_degrades_to_empty() {
        let (queue, dir) = temp_queue("corrupt");
        std::fs::write(dir.join("pending-edits.json"), "{not json").expect("write garbage");

        assert!(queue.list_unprocessed().is_empty());
        // enqueue still succeeds over the corrupt file
        queue.enqueue("addText", json!({"text": "x"})).expect("enqueue");
        assert_eq!(queue.list_all().len(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn malformed_entry_does_not_drop_the_rest() {
        let (queue, dir) = temp_queue("partial_corrupt");
        std::fs::write(
            dir.join("pending-edits.json"),
            r#"[
                {"id": "edit_1_aaa", "action": "addText", "data": {"text": "keep"}, "timestamp": 1, "processed": false},
                {"action": "addText", "data": {"text": "no id"}},
                {"id": "edit_2_bbb", "action": "clearSubtitles", "data": {}, "timestamp": 2, "processed": true}
            ]"#,
        )
        .expect("write mixed file");

        let unprocessed = queue.list_unprocessed();
        assert_eq!(unprocessed.len(), 1);
        assert_eq!(unprocessed[0].id, "edit_1_aaa");
        // only the entry missing its id is dropped
        assert_eq!(queue.list_all().len(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn clear_empties_queue() {
        let (queue, dir) = temp_queue("clear");
        queue.enqueue("addText", json!({"text": "a"})).expect("a");
        queue.clear().expect("clear");
        assert!(queue.list_all().is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
