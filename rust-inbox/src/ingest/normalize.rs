//! Twilio form fields → `Message`.
//!
//! Extraction never fails: absent fields become empty strings (or `None`
//! for the SID) and an unusable `NumMedia` becomes zero.

use chrono::{DateTime, Utc};

use crate::inbox::types::{format_received_at, Message};

/// Return the first value for `name`, if present.
pub fn field<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

/// Parse a media count, defaulting to zero for anything that is not a
/// non-negative integer.
pub fn parse_media_count(raw: Option<&str>) -> u64 {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

/// Build a message from the callback's form fields.
pub fn normalize(fields: &[(String, String)], received_at: DateTime<Utc>) -> Message {
    let text = |name: &str| field(fields, name).unwrap_or_default().to_string();

    Message {
        message_id: field(fields, "MessageSid").map(str::to_string),
        from_address: text("From"),
        to_address: text("To"),
        body: text("Body"),
        media_count: parse_media_count(field(fields, "NumMedia")),
        received_at: format_received_at(received_at),
    }
}
