//! Log-channel edit intake.
//!
//! Some producers cannot reach the HTTP surface and instead multiplex edits
//! into their stdout/log stream: an inline marker token followed by one
//! JSON-encoded pending edit on the same line. Text before the marker is an
//! unrelated log line and passes through untouched.

use cs_common::types::PendingEdit;
use tracing::warn;

/// Inline marker separating log text from an embedded edit event.
pub const EVENT_MARKER: &str = "::AI_EVENT::";

/// Split one log line into its plain-log prefix and an embedded edit.
///
/// Marker-less lines come back as `(Some(line), None)`. A parse failure
/// after the marker is warned and dropped; the prefix still passes through.
pub fn split_event_line(line: &str) -> (Option<&str>, Option<PendingEdit>) {
    let Some(index) = line.find(EVENT_MARKER) else {
        let prefix = non_empty(line);
        return (prefix, None);
    };

    let prefix = non_empty(&line[..index]);
    let payload = line[index + EVENT_MARKER.len()..].trim();
    let edit = match serde_json::from_str::<PendingEdit>(payload) {
        Ok(edit) => Some(edit),
        Err(error) => {
            warn!(%error, "dropping unparsable event payload in log line");
            None
        }
    };
    (prefix, edit)
}

fn non_empty(text: &str) -> Option<&str> {
    let trimmed = text.trim_end();
    (!trimmed.trim().is_empty()).then_some(trimmed)
}
