//! The change feed abstraction.
//!
//! Downstream logic (reconciler, applicator, stream server) consumes typed
//! events from a [`ChangeFeed`] without knowing the transport. Two backends
//! exist: a filesystem watcher for same-machine processes
//! ([`FsChangeFeed`](crate::watch::FsChangeFeed)) and an in-process channel
//! for tests and networked deployments ([`ChannelChangeFeed`]).

use std::time::Duration;

use crossbeam::channel::{unbounded, Receiver, Sender};
use serde_json::Value;

/// One event on the feed.
#[derive(Clone, Debug, PartialEq)]
pub enum FeedEvent {
    /// Emitted once when the feed opens.
    Connected,
    /// The canonical snapshot document changed; carries the full re-read
    /// document (consumers extract what they forward).
    SnapshotUpdate(Value),
    /// The sync-input file changed; carries the raw parsed JSON, already
    /// shaped as an action (e.g. `{action: "setFullState", tracks}`).
    Update(Value),
}

/// A long-lived, one-way stream of change events.
///
/// Level-triggered by contract: events carry full re-read content, so a
/// missed intermediate event is harmless; the settled state is always
/// eventually delivered.
pub trait ChangeFeed {
    /// Block up to `timeout` for the next event. `None` means the timeout
    /// elapsed or the feed is closed.
    fn next_event(&mut self, timeout: Duration) -> Option<FeedEvent>;
}

/// Channel-backed feed for in-process wiring and tests.
pub struct ChannelChangeFeed {
    receiver: Receiver<FeedEvent>,
    connected_sent: bool,
}

impl ChannelChangeFeed {
    /// Create a feed and the sender side that pushes events into it.
    pub fn new() -> (Self, Sender<FeedEvent>) {
        let (sender, receiver) = unbounded();
        (
            Self {
                receiver,
                connected_sent: false,
            },
            sender,
        )
    }
}

impl ChangeFeed for ChannelChangeFeed {
    fn next_event(&mut self, timeout: Duration) -> Option<FeedEvent> {
        if !self.connected_sent {
            self.connected_sent = true;
            return Some(FeedEvent::Connected);
        }
        self.receiver.recv_timeout(timeout).ok()
    }
}
