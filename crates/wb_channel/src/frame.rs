/// Marker opening every outbound application frame.
pub const FRAME_START: &str = "<WBChannel>";
/// Marker closing every outbound application frame.
pub const FRAME_END: &str = "</WBChannel>";

/// Wrap a serialized JSON message in channel markers.
pub fn wrap_frame(json: &str) -> String {
    let mut frame = String::with_capacity(FRAME_START.len() + json.len() + FRAME_END.len());
    frame.push_str(FRAME_START);
    frame.push_str(json);
    frame.push_str(FRAME_END);
    frame
}

/// Strip channel markers from an inbound frame.
///
/// Frames carrying both markers yield the enclosed text; anything else is
/// treated as bare JSON and returned as-is (surrounding whitespace trimmed).
pub fn unwrap_frame(frame: &str) -> &str {
    let trimmed = frame.trim();
    trimmed
        .strip_prefix(FRAME_START)
        .and_then(|rest| rest.strip_suffix(FRAME_END))
        .unwrap_or(trimmed)
}
