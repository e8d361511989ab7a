//! Filesystem-backed change feed.
//!
//! Watches the workspace directory and converts changes to the snapshot
//! file and the sync-input file into feed events. Reads that race a
//! concurrent write (empty or unparsable content) are retried a bounded
//! number of times, then dropped with a warning; the next change event
//! carries the settled content.

use std::path::Path;
use std::time::{Duration, Instant};

use crossbeam::channel::{unbounded, Receiver};
use notify::{recommended_watcher, Event, RecommendedWatcher, RecursiveMode, Watcher};
use serde_json::Value;
use tracing::{debug, warn};

use cs_store::WorkspacePaths;

use crate::error::SyncResult;
use crate::feed::{ChangeFeed, FeedEvent};

const MAX_READ_RETRIES: u32 = 3;
const READ_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Notify-backed [`ChangeFeed`]. The watch is released when the feed drops.
pub struct FsChangeFeed {
    paths: WorkspacePaths,
    // held for its Drop: dropping the watcher tears down the OS watch
    _watcher: RecommendedWatcher,
    events: Receiver<notify::Result<Event>>,
    connected_sent: bool,
}

impl FsChangeFeed {
    /// Start watching the workspace directory (non-recursive).
    pub fn new(paths: WorkspacePaths) -> SyncResult<Self> {
        let (sender, events) = unbounded();
        let mut watcher = recommended_watcher(move |event: notify::Result<Event>| {
            let _ = sender.send(event);
        })?;
        watcher.watch(paths.root(), RecursiveMode::NonRecursive)?;
        debug!(root = %paths.root().display(), "watching workspace");
        Ok(Self {
            paths,
            _watcher: watcher,
            events,
            connected_sent: false,
        })
    }

    /// Convert one notify event into a feed event, if it touches a watched
    /// file and its content is readable.
    fn translate(&self, event: &Event) -> Option<FeedEvent> {
        if !(event.kind.is_create() || event.kind.is_modify()) {
            return None;
        }
        let snapshot_file = self.paths.snapshot_file();
        let sync_input_file = self.paths.sync_input_file();

        for path in &event.paths {
            if path == &snapshot_file {
                return read_json_with_retry(path).map(FeedEvent::SnapshotUpdate);
            }
            if path == &sync_input_file {
                return read_json_with_retry(path).map(FeedEvent::Update);
            }
        }
        None
    }
}

impl ChangeFeed for FsChangeFeed {
    fn next_event(&mut self, timeout: Duration) -> Option<FeedEvent> {
        if !self.connected_sent {
            self.connected_sent = true;
            return Some(FeedEvent::Connected);
        }
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            match self.events.recv_timeout(remaining) {
                Ok(Ok(event)) => {
                    if let Some(feed_event) = self.translate(&event) {
                        return Some(feed_event);
                    }
                    // unrelated path or unreadable content; keep waiting
                }
                Ok(Err(error)) => {
                    warn!(%error, "watch error");
                }
                Err(_) => return None,
            }
        }
    }
}

/// Read and parse a JSON file, retrying briefly when the content races a
/// concurrent write. Exhausted retries log a warning and yield `None`.
fn read_json_with_retry(path: &Path) -> Option<Value> {
    for attempt in 0..=MAX_READ_RETRIES {
        match std::fs::read_to_string(path) {
            Ok(contents) if !contents.trim().is_empty() => {
                match serde_json::from_str::<Value>(&contents) {
                    Ok(value) => return Some(value),
                    Err(error) => {
                        debug!(path = %path.display(), attempt, %error, "parse raced a write, retrying");
                    }
                }
            }
            Ok(_) => {
                debug!(path = %path.display(), attempt, "file empty, retrying");
            }
            Err(error) => {
                debug!(path = %path.display(), attempt, %error, "read raced a write, retrying");
            }
        }
        if attempt < MAX_READ_RETRIES {
            std::thread::sleep(READ_RETRY_DELAY);
        }
    }
    warn!(path = %path.display(), "dropping change event, content never settled");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use cs_store::write_atomic;

    fn temp_workspace(name: &str) -> WorkspacePaths {
        let root = std::env::temp_dir().join(format!("cs_watch_{name}"));
        let _ = std::fs::remove_dir_all(&root);
        let paths = WorkspacePaths::new(&root);
        paths.ensure_layout().expect("layout");
        paths
    }

    fn wait_for<F: FnMut(&mut FsChangeFeed) -> Option<FeedEvent>>(
        feed: &mut FsChangeFeed,
        mut poll: F,
    ) -> Option<FeedEvent> {
        // notify backends deliver with some latency; poll in short slices
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let Some(event) = poll(feed) {
                return Some(event);
            }
        }
        None
    }

    #[test]
    fn emits_connected_then_snapshot_update() {
        let paths = temp_workspace("snapshot");
        let mut feed = FsChangeFeed::new(paths.clone()).expect("feed");
        assert_eq!(
            feed.next_event(Duration::from_millis(10)),
            Some(FeedEvent::Connected)
        );

        write_atomic(
            &paths.snapshot_file(),
            r#"{"tracks": [], "assets": [], "project": {"id": "p1"}}"#,
        )
        .expect("write snapshot");

        let event = wait_for(&mut feed, |f| f.next_event(Duration::from_millis(200)))
            .expect("snapshot event");
        match event {
            FeedEvent::SnapshotUpdate(value) => {
                assert_eq!(value["project"]["id"], "p1");
            }
            other => panic!("unexpected: {other:?}"),
        }

        let _ = std::fs::remove_dir_all(paths.root());
    }

    #[test]
    fn sync_input_changes_emit_update() {
        let paths = temp_workspace("sync_input");
        let mut feed = FsChangeFeed::new(paths.clone()).expect("feed");
        let _ = feed.next_event(Duration::from_millis(10));

        write_atomic(
            &paths.sync_input_file(),
            r#"{"action": "setFullState", "tracks": []}"#,
        )
        .expect("write sync input");

        let event = wait_for(&mut feed, |f| f.next_event(Duration::from_millis(200)))
            .expect("update event");
        match event {
            FeedEvent::Update(value) => assert_eq!(value["action"], "setFullState"),
            other => panic!("unexpected: {other:?}"),
        }

        let _ = std::fs::remove_dir_all(paths.root());
    }

    #[test]
    fn unrelated_files_are_ignored() {
        let paths = temp_workspace("unrelated");
        let mut feed = FsChangeFeed::new(paths.clone()).expect("feed");
        let _ = feed.next_event(Duration::from_millis(10));

        std::fs::write(paths.root().join("notes.txt"), "hello").expect("write");
        assert_eq!(feed.next_event(Duration::from_millis(500)), None);

        let _ = std::fs::remove_dir_all(paths.root());
    }
}
