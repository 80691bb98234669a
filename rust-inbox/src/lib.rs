//! SMS Inbox - Twilio webhook receiver with a bounded in-memory history.
//!
//! ## Architecture
//!
//! ```text
//! Twilio → POST /sms → IngestionGate (signature check) → BoundedLog ← GET /messages ← viewer
//! ```

pub mod config;
pub mod inbox;
pub mod ingest;
pub mod web;

// Re-export commonly used types
pub use config::{Config, Secret};
pub use inbox::{BoundedLog, Message, MAX_MESSAGES};
pub use ingest::{InboundCallback, IngestError, IngestionGate, SignatureVerifier};
pub use web::{router, AppState};
