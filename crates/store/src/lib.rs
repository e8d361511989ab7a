//! `cs-store` — durable persistence for the CutSync engine.
//!
//! Two documents back the whole cross-process protocol: the bounded
//! pending-edit queue and the canonical project snapshot (with rolling
//! history and a per-project archive). Both are written atomically
//! (temp-then-rename) so a crash mid-write never corrupts them.

pub mod atomic;
pub mod error;
pub mod paths;
pub mod queue;
pub mod snapshot;

pub use atomic::write_atomic;
pub use error::{StoreError, StoreResult};
pub use paths::WorkspacePaths;
pub use queue::{EditQueue, MAX_QUEUE_ENTRIES};
pub use snapshot::{ProjectSummary, SnapshotStore, MAX_HISTORY_ENTRIES};
