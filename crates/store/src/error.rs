//! Error types for the store crate (thiserror-based).

use thiserror::Error;

/// Errors that can occur during queue and snapshot persistence.
#[derive(Error, Debug)]
pub enum StoreError {
    /// File I/O error (read, write, rename).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No archived snapshot exists for the requested project.
    #[error("Project not archived: {project_id}")]
    ProjectNotArchived { project_id: String },

    /// No live snapshot exists yet.
    #[error("No snapshot available")]
    SnapshotMissing,
}

/// Convenience Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
