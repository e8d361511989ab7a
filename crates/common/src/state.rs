//! In-memory editor state container.
//!
//! All mutation of live state flows through the applicator and reconciler;
//! callbacks and handlers only dispatch into them with a `&mut EditorState`.
//! Nothing mutates tracks or assets ad hoc.

use crate::types::{Asset, Element, ProjectMeta, Snapshot, Track};

/// The live in-memory state of one editor session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditorState {
    pub project: Option<ProjectMeta>,
    pub tracks: Vec<Track>,
    pub assets: Vec<Asset>,
}

impl EditorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state from a snapshot document.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            project: snapshot.project,
            tracks: snapshot.tracks,
            assets: snapshot.assets,
        }
    }

    /// Capture the current state as a snapshot document.
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            project: self.project.clone(),
            tracks: self.tracks.clone(),
            assets: self.assets.clone(),
        }
    }

    pub fn find_track(&self, track_id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == track_id)
    }

    pub fn find_track_mut(&mut self, track_id: &str) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id == track_id)
    }

    pub fn find_asset(&self, asset_id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == asset_id)
    }

    /// Locate an element by id across all tracks.
    pub fn find_element_mut(&mut self, element_id: &str) -> Option<&mut Element> {
        self.tracks
            .iter_mut()
            .flat_map(|t| t.elements.iter_mut())
            .find(|e| e.id() == element_id)
    }

    /// Total number of elements across all tracks.
    pub fn total_elements(&self) -> usize {
        self.tracks.iter().map(|t| t.elements.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TrackType;

    #[test]
    fn snapshot_roundtrip() {
        let mut state = EditorState::new();
        state.project = Some(ProjectMeta::new("p1", "Demo"));
        state.tracks.push(Track::new(TrackType::Audio, "Audio 1"));

        let snapshot = state.to_snapshot();
        let back = EditorState::from_snapshot(snapshot);
        assert_eq!(back, state);
    }

    #[test]
    fn find_track_by_id() {
        let mut state = EditorState::new();
        let track = Track::new(TrackType::Text, "Text 1");
        let id = track.id.clone();
        state.tracks.push(track);

        assert!(state.find_track(&id).is_some());
        assert!(state.find_track("missing").is_none());
    }

    #[test]
    fn empty_state_counts() {
        let state = EditorState::new();
        assert_eq!(state.total_elements(), 0);
        assert!(state.project.is_none());
    }
}
