//! Payload normalization — unifying historical text element shapes.
//!
//! Producers have emitted text elements in two shapes: a flat `text`/`name`
//! display field with top-level style fields, and a `content` field with a
//! nested `style` sub-object. The canonical shape always uses `content` and
//! flat style fields with defined defaults. Normalization is idempotent:
//! an already-canonical element passes through unchanged.

use cs_common::types::{text_defaults, Track};
use serde_json::{Map, Value};
use tracing::warn;

/// Normalize one raw element into the canonical shape.
///
/// Non-text elements pass through unchanged.
pub fn normalize_element(raw: &Value) -> Value {
    let obj = match raw.as_object() {
        Some(obj) => obj,
        None => return raw.clone(),
    };
    if obj.get("type").and_then(Value::as_str) != Some("text") {
        return raw.clone();
    }

    let mut out = obj.clone();

    // Nested style fields win over their top-level counterparts.
    if let Some(Value::Object(style)) = out.remove("style") {
        for (key, value) in style {
            out.insert(key, value);
        }
    }

    // Display text: `content` is canonical; `text` and `name` are legacy.
    let content = out
        .get("content")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .or_else(|| legacy_text(&out, "text"))
        .or_else(|| legacy_text(&out, "name"))
        .unwrap_or_else(|| "Text".to_string());
    out.remove("text");
    out.remove("name");
    out.insert("content".into(), Value::String(content));

    if !out.contains_key("id") {
        out.insert("id".into(), Value::String(cs_common::new_element_id()));
    }

    fill_number(&mut out, "startTime", 0.0);
    fill_number(&mut out, "duration", 0.0);
    fill_number(&mut out, "trimStart", 0.0);
    fill_number(&mut out, "trimEnd", 0.0);
    fill_number(&mut out, "x", 0.0);
    fill_number(&mut out, "y", 0.0);
    fill_number(&mut out, "rotation", 0.0);
    fill_number(&mut out, "opacity", 1.0);
    fill_number(&mut out, "fontSize", text_defaults::FONT_SIZE);
    fill_string(&mut out, "fontFamily", text_defaults::FONT_FAMILY);
    fill_string(&mut out, "color", text_defaults::COLOR);
    fill_string(&mut out, "backgroundColor", text_defaults::BACKGROUND_COLOR);
    fill_string(&mut out, "textAlign", text_defaults::TEXT_ALIGN);
    fill_string(&mut out, "fontWeight", text_defaults::FONT_WEIGHT);
    fill_string(&mut out, "fontStyle", text_defaults::FONT_STYLE);
    fill_string(&mut out, "textDecoration", text_defaults::TEXT_DECORATION);

    Value::Object(out)
}

/// Normalize every element of a raw track.
pub fn normalize_track(raw: &Value) -> Value {
    let mut track = raw.clone();
    if let Some(elements) = track.get_mut("elements").and_then(Value::as_array_mut) {
        for element in elements.iter_mut() {
            *element = normalize_element(element);
        }
    }
    track
}

/// Normalize a raw track list into typed tracks.
///
/// Malformed tracks are skipped with a warning rather than failing the whole
/// list; a stray bad track from one producer must not wedge the sync loop.
pub fn normalize_tracks(raw: &[Value]) -> Vec<Track> {
    raw.iter()
        .filter_map(|value| {
            match serde_json::from_value::<Track>(normalize_track(value)) {
                Ok(track) => Some(track),
                Err(error) => {
                    warn!(%error, "skipping malformed track during normalization");
                    None
                }
            }
        })
        .collect()
}

fn legacy_text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn fill_number(obj: &mut Map<String, Value>, key: &str, default: f64) {
    if !obj.get(key).map(Value::is_number).unwrap_or(false) {
        obj.insert(key.into(), Value::from(default));
    }
}

fn fill_string(obj: &mut Map<String, Value>, key: &str, default: &str) {
    if !obj.get(key).map(Value::is_string).unwrap_or(false) {
        obj.insert(key.into(), Value::String(default.to_string()));
    }
}
