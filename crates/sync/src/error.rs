//! Error types for the sync crate (thiserror-based).

use thiserror::Error;

/// Errors raised while setting up or running the sync machinery.
#[derive(Error, Debug)]
pub enum SyncError {
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem watcher setup or watch failure.
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] cs_store::StoreError),
}

/// Convenience Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
