// Shared helpers for unwrapping SSE frames in unit tests.

use serde_json::Value;

/// Parse the JSON payload out of an encoded SSE frame.
pub fn frame_data(frame: &str) -> Value {
    let line = frame
        .lines()
        .find(|line| line.starts_with("data: "))
        .unwrap_or_else(|| panic!("frame has no data line: {frame:?}"));
    serde_json::from_str(&line["data: ".len()..]).expect("data line should hold valid JSON")
}

/// Event type name from an encoded frame's `event:` line.
pub fn frame_event_type(frame: &str) -> &str {
    frame
        .lines()
        .find_map(|line| line.strip_prefix("event: "))
        .unwrap_or_else(|| panic!("frame has no event line: {frame:?}"))
}

/// Event id from an encoded frame's `id:` line, if present.
pub fn frame_id(frame: &str) -> Option<&str> {
    frame.lines().find_map(|line| line.strip_prefix("id: "))
}
