//! Pulls the answer text out of a raw responder payload

/// Marker preceding the answer inside the payload
pub const RESPONSE_MARKER: &str = "### Response:";

/// Extract the user-facing answer from a raw payload.
///
/// Everything after the first marker, newlines included, trimmed. A payload
/// without the marker yields an empty string, which callers show as an empty
/// assistant turn rather than an error.
pub fn extract_response(raw: &str) -> String {
    raw.split_once(RESPONSE_MARKER)
        .map(|(_, answer)| answer.trim().to_string())
        .unwrap_or_default()
}
