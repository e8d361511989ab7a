//! The applicator — one state transition per validated edit.
//!
//! `apply_edit` is the only place external edits mutate the live state.
//! Every case fails soft: a missing referent is a no-op, a malformed element
//! inside a batch is skipped with a warning. Returns whether the state
//! actually changed, so callers can debounce reporting on real mutations.

use cs_common::types::{Asset, AssetType, Element, MediaElement, Track, TrackType};
use cs_common::EditorState;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, warn};

use crate::action::{EditAction, ImportRequest, TimeRange};
use crate::normalize::{normalize_element, normalize_tracks};

/// Track created for each subtitle batch. Never reused across batches.
pub const AI_SUBTITLE_TRACK_NAME: &str = "AI Subtitles";
/// Track created when an audio import finds no audio track to join.
pub const AI_VOICE_TRACK_NAME: &str = "AI Voice Track";

/// Placement duration when neither payload nor asset metadata carries one.
const IMAGE_FALLBACK_DURATION: f64 = 5.0;
const MEDIA_FALLBACK_DURATION: f64 = 3.0;
/// Default visible span for a single added subtitle.
const SUBTITLE_DEFAULT_DURATION: f64 = 5.0;
/// Default visible span for batch subtitle items.
const BATCH_SUBTITLE_DEFAULT_DURATION: f64 = 3.0;

/// Apply one validated edit to the live state. Returns true if the state
/// changed.
pub fn apply_edit(state: &mut EditorState, action: &EditAction) -> bool {
    match action {
        EditAction::AddText { data } => add_text(state, data),
        EditAction::AddMultipleSubtitles { subtitles } => add_subtitle_batch(state, subtitles),
        EditAction::ClearSubtitles { range } => clear_subtitles(state, *range),
        EditAction::RemoveElement {
            track_id,
            element_id,
        } => remove_element(state, track_id, element_id),
        EditAction::UpdateElement {
            element_id,
            updates,
        } => update_element(state, element_id, updates),
        EditAction::SetFullState { tracks } => set_full_state(state, tracks),
        EditAction::Import(request) => {
            import_media(state, request);
            true
        }
        EditAction::ImportAudioBatch { items } => import_audio_batch(state, items),
    }
}

fn add_text(state: &mut EditorState, data: &Value) -> bool {
    let element = match parse_text_element(data, SUBTITLE_DEFAULT_DURATION) {
        Some(element) => element,
        None => return false,
    };
    let index = find_or_create_text_track(state);
    state.tracks[index].elements.push(Element::Text(element));
    true
}

fn add_subtitle_batch(state: &mut EditorState, subtitles: &[Value]) -> bool {
    // Always a fresh track. Reusing an earlier batch's track would collide
    // unrelated batches' indices and timings.
    let mut track = Track::new(TrackType::Text, AI_SUBTITLE_TRACK_NAME);
    for item in subtitles {
        match parse_text_element(item, BATCH_SUBTITLE_DEFAULT_DURATION) {
            Some(element) => track.elements.push(Element::Text(element)),
            None => warn!("skipping malformed subtitle in batch"),
        }
    }
    debug!(
        track_id = %track.id,
        count = track.elements.len(),
        "created subtitle batch track"
    );
    state.tracks.push(track);
    true
}

fn clear_subtitles(state: &mut EditorState, range: Option<TimeRange>) -> bool {
    let mut removed = 0usize;
    for track in state
        .tracks
        .iter_mut()
        .filter(|t| t.track_type == TrackType::Text)
    {
        let before = track.elements.len();
        track.elements.retain(|element| match range {
            Some(range) => !range.overlaps(element.start_time(), element.end_time()),
            None => false,
        });
        removed += before - track.elements.len();
    }
    if removed > 0 {
        debug!(removed, "cleared subtitles");
    }
    removed > 0
}

fn remove_element(state: &mut EditorState, track_id: &str, element_id: &str) -> bool {
    // Missing track or element is a silent no-op: the edit may have raced a
    // manual deletion.
    let track = match state.find_track_mut(track_id) {
        Some(track) => track,
        None => {
            debug!(track_id, "removeElement: track not found");
            return false;
        }
    };
    let before = track.elements.len();
    track.elements.retain(|element| element.id() != element_id);
    before != track.elements.len()
}

fn update_element(state: &mut EditorState, element_id: &str, updates: &Map<String, Value>) -> bool {
    let element = match state.find_element_mut(element_id) {
        Some(element) => element,
        None => {
            debug!(element_id, "updateElement: element not found");
            return false;
        }
    };

    let mut merged = match serde_json::to_value(&*element) {
        Ok(Value::Object(map)) => map,
        _ => return false,
    };
    for (key, value) in updates {
        merged.insert(key.clone(), value.clone());
    }

    match serde_json::from_value::<Element>(normalize_element(&Value::Object(merged))) {
        Ok(updated) => {
            let changed = updated != *element;
            *element = updated;
            changed
        }
        Err(error) => {
            warn!(element_id, %error, "updateElement: merged element is malformed, keeping original");
            false
        }
    }
}

fn set_full_state(state: &mut EditorState, tracks: &[Value]) -> bool {
    let normalized = normalize_tracks(tracks);
    if normalized == state.tracks {
        return false;
    }
    state.tracks = normalized;
    true
}

fn import_media(state: &mut EditorState, request: &ImportRequest) {
    let name = request.name.clone().unwrap_or_else(|| {
        Path::new(&request.file_path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Imported media")
            .to_string()
    });
    let asset = Asset {
        id: cs_common::new_asset_id(),
        name: name.clone(),
        asset_type: request.asset_type,
        url: request
            .url
            .clone()
            .unwrap_or_else(|| format!("file://{}", request.file_path)),
        file_path: Some(request.file_path.clone()),
        thumbnail_url: None,
        width: None,
        height: None,
        duration: request.duration,
    };
    let media_id = asset.id.clone();
    state.assets.push(asset);

    let duration = request.duration.unwrap_or(match request.asset_type {
        AssetType::Image => IMAGE_FALLBACK_DURATION,
        _ => MEDIA_FALLBACK_DURATION,
    });
    // Imported metadata wins over the payload's own placement.
    let start_time = request
        .metadata_start_time
        .or(request.start_time)
        .unwrap_or(0.0);

    let (x, y) = placement_center(state, request.asset_type);
    let index = choose_import_track(state, request);
    let track = &mut state.tracks[index];
    track.elements.push(Element::Media(MediaElement {
        id: cs_common::new_element_id(),
        name: Some(name),
        media_id: media_id.clone(),
        start_time,
        duration,
        trim_start: 0.0,
        trim_end: 0.0,
        x,
        y,
        scale: 1.0,
        rotation: 0.0,
        opacity: 1.0,
        volume: 1.0,
        muted: false,
    }));
    debug!(
        media_id = %media_id,
        track_id = %track.id,
        start_time,
        "placed imported media"
    );
}

/// Visual media is centered on the canvas; audio has no spatial placement.
fn placement_center(state: &EditorState, asset_type: AssetType) -> (f64, f64) {
    if asset_type == AssetType::Audio {
        return (0.0, 0.0);
    }
    let canvas = state
        .project
        .as_ref()
        .map(|p| p.canvas_size)
        .unwrap_or_default();
    (canvas.width as f64 / 2.0, canvas.height as f64 / 2.0)
}

/// Placement order: the explicitly preferred track, else an existing
/// same-type non-main track, else any same-type track, else a new one.
fn choose_import_track(state: &mut EditorState, request: &ImportRequest) -> usize {
    let wanted = request.asset_type.track_type();

    if let Some(track_id) = &request.track_id {
        if let Some(index) = state.tracks.iter().position(|t| &t.id == track_id) {
            return index;
        }
        debug!(track_id, "preferred import track not found, falling back");
    }
    if let Some(index) = state
        .tracks
        .iter()
        .position(|t| t.track_type == wanted && !t.is_main)
    {
        return index;
    }
    if let Some(index) = state.tracks.iter().position(|t| t.track_type == wanted) {
        return index;
    }

    let name = match wanted {
        TrackType::Audio => AI_VOICE_TRACK_NAME.to_string(),
        _ => numbered_track_name(state, "Media"),
    };
    state.tracks.push(Track::new(wanted, name));
    state.tracks.len() - 1
}

fn import_audio_batch(state: &mut EditorState, items: &[Value]) -> bool {
    let mut changed = false;
    for item in items {
        match ImportRequest::from_data("importAudio", Some(AssetType::Audio), item) {
            Ok(request) => {
                import_media(state, &request);
                changed = true;
            }
            Err(error) => warn!(%error, "skipping malformed item in audio batch"),
        }
    }
    changed
}

fn parse_text_element(data: &Value, default_duration: f64) -> Option<cs_common::TextElement> {
    let mut raw = match data.clone() {
        Value::Object(map) => map,
        _ => return None,
    };
    raw.insert("type".into(), Value::String("text".into()));
    if !raw.get("duration").map(Value::is_number).unwrap_or(false) {
        raw.insert("duration".into(), Value::from(default_duration));
    }
    // Never carry a producer-supplied id into a freshly added element.
    raw.remove("id");

    match serde_json::from_value::<Element>(normalize_element(&Value::Object(raw))) {
        Ok(Element::Text(element)) => Some(element),
        Ok(_) => None,
        Err(error) => {
            warn!(%error, "malformed text element payload");
            None
        }
    }
}

fn find_or_create_text_track(state: &mut EditorState) -> usize {
    if let Some(index) = state
        .tracks
        .iter()
        .position(|t| t.track_type == TrackType::Text)
    {
        return index;
    }
    let name = numbered_track_name(state, "Text");
    state.tracks.push(Track::new(TrackType::Text, name));
    state.tracks.len() - 1
}

fn numbered_track_name(state: &EditorState, prefix: &str) -> String {
    let count = state
        .tracks
        .iter()
        .filter(|t| t.name.starts_with(prefix))
        .count();
    format!("{} {}", prefix, count + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::EditAction;
    use serde_json::json;

    fn act(action: &str, data: Value) -> EditAction {
        EditAction::from_parts(action, &data).expect("valid action")
    }

    fn text_track_with_spans(spans: &[(f64, f64)]) -> EditorState {
        let mut state = EditorState::new();
        for (start, duration) in spans {
            assert!(apply_edit(
                &mut state,
                &act("addText", json!({"text": "s", "startTime": start, "duration": duration})),
            ));
        }
        state
    }

    #[test]
    fn add_then_clear() {
        let mut state = EditorState::new();
        let changed = apply_edit(
            &mut state,
            &act("addText", json!({"text": "hi", "startTime": 0, "duration": 5})),
        );
        assert!(changed);
        assert_eq!(state.tracks.len(), 1);
        assert_eq!(state.tracks[0].track_type, TrackType::Text);
        match &state.tracks[0].elements[0] {
            Element::Text(t) => assert_eq!(t.content, "hi"),
            other => panic!("unexpected: {other:?}"),
        }

        assert!(apply_edit(&mut state, &act("clearSubtitles", json!({}))));
        assert_eq!(state.total_elements(), 0);
    }

    #[test]
    fn add_text_reuses_existing_text_track() {
        let mut state = text_track_with_spans(&[(0.0, 2.0), (3.0, 2.0)]);
        assert_eq!(state.tracks.len(), 1);
        assert_eq!(state.tracks[0].elements.len(), 2);

        apply_edit(&mut state, &act("addText", json!({"text": "third"})));
        assert_eq!(state.tracks.len(), 1);
        assert_eq!(state.tracks[0].elements.len(), 3);
    }

    #[test]
    fn range_scoped_clear_removes_only_overlapping() {
        let mut state = text_track_with_spans(&[(0.0, 3.0), (5.0, 3.0), (10.0, 3.0)]);
        assert_eq!(state.total_elements(), 3);

        // range [4, 8) overlaps only the [5, 8) element
        apply_edit(
            &mut state,
            &act("clearSubtitles", json!({"startTime": 4.0, "duration": 4.0})),
        );
        let starts: Vec<f64> = state.tracks[0]
            .elements
            .iter()
            .map(|e| e.start_time())
            .collect();
        assert_eq!(starts, vec![0.0, 10.0]);
    }

    #[test]
    fn batch_subtitles_always_get_a_fresh_track() {
        let mut state = EditorState::new();
        let batch = json!({"subtitles": [
            {"text": "a", "startTime": 0, "duration": 2},
            {"text": "b", "startTime": 2, "duration": 2},
            {"text": "c", "startTime": 4, "duration": 2}
        ]});
        apply_edit(&mut state, &act("addMultipleSubtitles", batch.clone()));
        apply_edit(&mut state, &act("addMultipleSubtitles", batch));

        assert_eq!(state.tracks.len(), 2);
        assert!(state.tracks.iter().all(|t| t.elements.len() == 3));
        assert_eq!(state.total_elements(), 6);
        assert_ne!(state.tracks[0].id, state.tracks[1].id);
    }

    #[test]
    fn remove_element_missing_referent_is_noop() {
        let mut state = text_track_with_spans(&[(0.0, 2.0)]);
        let track_id = state.tracks[0].id.clone();

        assert!(!apply_edit(
            &mut state,
            &act(
                "removeElement",
                json!({"trackId": "missing", "elementId": "e1"})
            ),
        ));
        assert!(!apply_edit(
            &mut state,
            &act(
                "removeElement",
                json!({"trackId": track_id, "elementId": "missing"})
            ),
        ));
        assert_eq!(state.total_elements(), 1);
    }

    #[test]
    fn remove_element_deletes_by_pair() {
        let mut state = text_track_with_spans(&[(0.0, 2.0), (3.0, 2.0)]);
        let track_id = state.tracks[0].id.clone();
        let element_id = state.tracks[0].elements[0].id().to_string();

        assert!(apply_edit(
            &mut state,
            &act(
                "removeElement",
                json!({"trackId": track_id, "elementId": element_id})
            ),
        ));
        assert_eq!(state.total_elements(), 1);
    }

    #[test]
    fn update_element_shallow_merges() {
        let mut state = text_track_with_spans(&[(0.0, 2.0)]);
        let element_id = state.tracks[0].elements[0].id().to_string();

        assert!(apply_edit(
            &mut state,
            &act(
                "updateElement",
                json!({"elementId": element_id, "updates": {"content": "edited", "x": 100.0}})
            ),
        ));
        match &state.tracks[0].elements[0] {
            Element::Text(t) => {
                assert_eq!(t.content, "edited");
                assert!((t.x - 100.0).abs() < f64::EPSILON);
                // untouched fields survive the merge
                assert!((t.duration - 2.0).abs() < f64::EPSILON);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn update_element_missing_referent_is_noop() {
        let mut state = text_track_with_spans(&[(0.0, 2.0)]);
        assert!(!apply_edit(
            &mut state,
            &act(
                "updateElement",
                json!({"elementId": "missing", "updates": {"x": 1.0}})
            ),
        ));
    }

    #[test]
    fn set_full_state_replaces_tracks() {
        let mut state = text_track_with_spans(&[(0.0, 2.0)]);
        let incoming = json!({"tracks": [{
            "id": "t-new",
            "name": "Replaced",
            "type": "media",
            "elements": []
        }]});
        assert!(apply_edit(&mut state, &act("setFullState", incoming.clone())));
        assert_eq!(state.tracks.len(), 1);
        assert_eq!(state.tracks[0].id, "t-new");

        // identical payload is a no-op
        assert!(!apply_edit(&mut state, &act("setFullState", incoming)));
    }

    #[test]
    fn import_audio_reuses_existing_empty_audio_track() {
        let mut state = EditorState::new();
        state.tracks.push(Track::new(TrackType::Audio, "Audio 1"));
        let audio_track_id = state.tracks[0].id.clone();

        apply_edit(
            &mut state,
            &act("importAudio", json!({"filePath": "/voice/line1.mp3"})),
        );
        assert_eq!(state.tracks.len(), 1);
        assert_eq!(state.tracks[0].id, audio_track_id);
        assert_eq!(state.tracks[0].elements.len(), 1);
        assert_eq!(state.assets.len(), 1);
        assert_eq!(state.assets[0].asset_type, AssetType::Audio);
    }

    #[test]
    fn import_audio_creates_voice_track_when_none_exists() {
        let mut state = EditorState::new();
        apply_edit(
            &mut state,
            &act("importAudio", json!({"filePath": "/voice/line1.mp3"})),
        );
        assert_eq!(state.tracks.len(), 1);
        assert_eq!(state.tracks[0].name, AI_VOICE_TRACK_NAME);
        assert_eq!(state.tracks[0].track_type, TrackType::Audio);
    }

    #[test]
    fn import_prefers_explicit_track() {
        let mut state = EditorState::new();
        state.tracks.push(Track::new(TrackType::Media, "Media 1"));
        state.tracks.push(Track::new(TrackType::Media, "Media 2"));
        let target = state.tracks[1].id.clone();

        apply_edit(
            &mut state,
            &act(
                "importVideo",
                json!({"filePath": "/clips/a.mp4", "trackId": target}),
            ),
        );
        assert_eq!(state.tracks[0].elements.len(), 0);
        assert_eq!(state.tracks[1].elements.len(), 1);
    }

    #[test]
    fn import_skips_main_track_when_alternative_exists() {
        let mut state = EditorState::new();
        let mut main = Track::new(TrackType::Media, "Main");
        main.is_main = true;
        state.tracks.push(main);
        state.tracks.push(Track::new(TrackType::Media, "Overlay"));

        apply_edit(
            &mut state,
            &act("importImage", json!({"filePath": "/img/logo.png"})),
        );
        assert_eq!(state.tracks[0].elements.len(), 0);
        assert_eq!(state.tracks[1].elements.len(), 1);
    }

    #[test]
    fn import_metadata_start_time_wins() {
        let mut state = EditorState::new();
        apply_edit(
            &mut state,
            &act(
                "importAudio",
                json!({
                    "filePath": "/voice/line1.mp3",
                    "startTime": 2.0,
                    "metadata": {"startTime": 7.5}
                }),
            ),
        );
        assert!((state.tracks[0].elements[0].start_time() - 7.5).abs() < f64::EPSILON);
    }

    #[test]
    fn image_import_gets_fallback_duration() {
        let mut state = EditorState::new();
        apply_edit(
            &mut state,
            &act("importImage", json!({"filePath": "/img/logo.png"})),
        );
        match &state.tracks[0].elements[0] {
            Element::Media(m) => assert!((m.duration - 5.0).abs() < f64::EPSILON),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn audio_batch_applies_each_item() {
        let mut state = EditorState::new();
        apply_edit(
            &mut state,
            &act(
                "importAudioBatch",
                json!({"items": [
                    {"filePath": "/voice/a.mp3", "startTime": 0.0},
                    {"filePath": "/voice/b.mp3", "startTime": 3.0},
                    {"notAFilePath": true}
                ]}),
            ),
        );
        assert_eq!(state.assets.len(), 2);
        assert_eq!(state.total_elements(), 2);
    }
}
