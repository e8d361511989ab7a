//! The debounced reporter — pushing local state back out, quietly.
//!
//! Every local mutation restarts a quiet-period timer. Only when the timer
//! runs out uninterrupted does the caller persist the state, and only if a
//! structural fingerprint shows it actually differs from the last report.
//! Reporting is gated on at least one successful reconciliation per session
//! so a bare freshly-initialized state can never clobber a richer external
//! snapshot before the first sync completes.

use std::time::{Duration, Instant};

use cs_common::types::Element;
use cs_common::EditorState;
use serde_json::{json, Value};

/// Quiet period after the last local change before a report is due.
pub const REPORT_QUIET_PERIOD: Duration = Duration::from_secs(3);

/// Poll-style debounce state. The owner calls [`should_report`] on its tick
/// and, when true, writes the snapshot and calls [`mark_reported`].
///
/// [`should_report`]: DebouncedReporter::should_report
/// [`mark_reported`]: DebouncedReporter::mark_reported
#[derive(Debug)]
pub struct DebouncedReporter {
    quiet_period: Duration,
    last_change: Option<Instant>,
    has_synced: bool,
    last_fingerprint: Option<String>,
}

impl DebouncedReporter {
    pub fn new() -> Self {
        Self::with_quiet_period(REPORT_QUIET_PERIOD)
    }

    pub fn with_quiet_period(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            last_change: None,
            has_synced: false,
            last_fingerprint: None,
        }
    }

    /// A local mutation happened; restart the quiet period.
    pub fn mark_changed(&mut self) {
        self.last_change = Some(Instant::now());
    }

    /// A reconciliation completed successfully; reporting is now allowed.
    pub fn mark_synced(&mut self) {
        self.has_synced = true;
    }

    /// True when a report is due: synced at least once, a change is pending,
    /// the quiet period elapsed, and the state differs from the last report.
    pub fn should_report(&self, state: &EditorState) -> bool {
        if !self.has_synced {
            return false;
        }
        let last_change = match self.last_change {
            Some(instant) => instant,
            None => return false,
        };
        if last_change.elapsed() < self.quiet_period {
            return false;
        }
        self.last_fingerprint.as_deref() != Some(fingerprint(state).as_str())
    }

    /// Record a completed report; suppresses re-reports of identical state.
    pub fn mark_reported(&mut self, state: &EditorState) {
        self.last_change = None;
        self.last_fingerprint = Some(fingerprint(state));
    }

    /// Drop any pending debounce, e.g. on session teardown, so a stale
    /// write can never fire after the session ends.
    pub fn cancel(&mut self) {
        self.last_change = None;
    }
}

impl Default for DebouncedReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural fingerprint: ids, positions, and key content fields, not full
/// byte content. Cheap to compute and stable across no-op churn.
pub fn fingerprint(state: &EditorState) -> String {
    let tracks: Vec<Value> = state
        .tracks
        .iter()
        .map(|track| {
            let elements: Vec<Value> = track
                .elements
                .iter()
                .map(|element| match element {
                    Element::Media(m) => json!([m.id, m.start_time, m.duration, m.media_id]),
                    Element::Text(t) => json!([t.id, t.start_time, t.duration, t.content]),
                })
                .collect();
            json!([track.id, elements])
        })
        .collect();
    let assets: Vec<&str> = state.assets.iter().map(|a| a.id.as_str()).collect();
    let project = state.project.as_ref().map(|p| p.id.as_str());
    json!([project, tracks, assets]).to_string()
}
