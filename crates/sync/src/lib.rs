//! `cs-sync` — the cross-process synchronization machinery.
//!
//! Ties the durable stores to a live editor session: change feeds surface
//! external writes, the consumer dedups and applies queued edits, the
//! reconciler merges foreign snapshots into live state, and the debounced
//! reporter pushes settled local state back out.

pub mod consumer;
pub mod error;
pub mod feed;
pub mod logchan;
pub mod reconcile;
pub mod report;
pub mod session;
pub mod watch;

pub use consumer::EditConsumer;
pub use error::{SyncError, SyncResult};
pub use feed::{ChangeFeed, ChannelChangeFeed, FeedEvent};
pub use logchan::{split_event_line, EVENT_MARKER};
pub use reconcile::{reconcile, ReconcileOutcome};
pub use report::{fingerprint, DebouncedReporter, REPORT_QUIET_PERIOD};
pub use session::SyncSession;
pub use watch::FsChangeFeed;
