//! Message record stored in the inbox and served to the viewer.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Default number of messages kept in memory.
pub const MAX_MESSAGES: usize = 1000;

/// One inbound SMS, normalized from a Twilio callback.
///
/// Field names on the wire match what the viewer page expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Twilio message SID; `None` when the callback did not carry one
    #[serde(rename = "message_sid")]
    pub message_id: Option<String>,
    /// Sender phone number
    #[serde(rename = "from")]
    pub from_address: String,
    /// Receiving phone number
    #[serde(rename = "to")]
    pub to_address: String,
    /// Message text
    pub body: String,
    /// Number of media attachments
    #[serde(rename = "num_media")]
    pub media_count: u64,
    /// Ingestion time, RFC 3339 UTC with microseconds
    pub received_at: String,
}

/// Format an instant the way `received_at` is stored.
pub fn format_received_at(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}
