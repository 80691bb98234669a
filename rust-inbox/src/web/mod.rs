//! Web server module for the SMS inbox.
//!
//! This module provides:
//! - The Twilio inbound webhook (`POST /sms`)
//! - The message feed polled by the viewer (`GET /messages`)
//! - The viewer page itself (`GET /`) and a health check
//!
//! Signature checks and reply documents sit behind the `SignatureVerifier`
//! and `ReplyEncoder` traits.

pub mod handlers;
pub mod reply;
pub mod request_url;
pub mod signature;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

pub use handlers::{health, index, list_messages, sms_webhook, AppState, HealthResponse};
pub use reply::{ReplyEncoder, TwimlReplyEncoder};
pub use request_url::external_url;
pub use signature::{compute_signature, TwilioSignatureVerifier, SIGNATURE_HEADER};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/sms", post(sms_webhook))
        .route("/messages", get(list_messages))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(state)
}
