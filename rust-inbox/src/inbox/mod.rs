//! In-memory message inbox.
//!
//! This module provides:
//! - The normalized `Message` record
//! - The capacity-limited `BoundedLog` shared by the web handlers
//!
//! Nothing here survives a restart.

pub mod log;
pub mod types;

pub use log::BoundedLog;
pub use types::{Message, MAX_MESSAGES};
