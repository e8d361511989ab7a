//! Timestamp helpers (chrono-based).

use chrono::{SecondsFormat, Utc};

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Current ISO 8601 timestamp, e.g. `2026-08-29T12:30:45Z`.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Filename-safe timestamp for history slots, e.g. `2026-08-29T12-30-45`.
///
/// Colons are avoided so the name is valid on every filesystem; the format
/// sorts lexicographically in chronological order.
pub fn history_slot_name() -> String {
    Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string()
}
