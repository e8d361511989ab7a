//! `cs-server` — the HTTP surface of the CutSync engine.
//!
//! `POST /edits` ingests and validates external edits into the durable
//! queue (plus inline control actions for snapshot and project
//! management); `GET /edits?action=...` serves polling, processed-marking,
//! snapshot reads, and project listings; `GET /edits/stream` is the
//! server-push sync stream.

pub mod api;
pub mod config;
pub mod http;
pub mod stream;

pub use api::{parse_query, ApiResponse, EditApi};
pub use config::ServerConfig;
pub use http::EditServer;
