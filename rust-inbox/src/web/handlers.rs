//! HTTP endpoint handlers.
//!
//! The inbound handler only gathers what the ingestion gate needs (public
//! URL, form fields, signature header) and turns the outcome into a
//! response. All decisions happen in the gate.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::inbox::{BoundedLog, Message};
use crate::ingest::{InboundCallback, IngestError, IngestionGate, SignatureVerifier};
use crate::web::reply::{ReplyEncoder, TwimlReplyEncoder};
use crate::web::request_url::external_url;
use crate::web::signature::{TwilioSignatureVerifier, SIGNATURE_HEADER};
use crate::Config;

/// Viewer page, embedded at build time.
const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub log: BoundedLog,
    pub gate: Arc<IngestionGate>,
    pub reply: Arc<dyn ReplyEncoder>,
}

impl AppState {
    /// Build the state with the Twilio verifier and TwiML replies.
    pub fn new(config: Config) -> Self {
        Self::with_verifier(config, Arc::new(TwilioSignatureVerifier))
    }

    /// Build the state with a custom signature verifier.
    pub fn with_verifier(config: Config, verifier: Arc<dyn SignatureVerifier>) -> Self {
        let log = BoundedLog::new(config.max_messages);
        let gate = IngestionGate::new(config.twilio_auth_token.clone(), verifier, log.clone());

        Self {
            config: Arc::new(config),
            log,
            gate: Arc::new(gate),
            reply: Arc::new(TwimlReplyEncoder),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Viewer
// =============================================================================

/// Static viewer page.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// All stored messages, newest first.
pub async fn list_messages(State(state): State<AppState>) -> Json<Vec<Message>> {
    Json(state.log.snapshot())
}

// =============================================================================
// Twilio Webhook
// =============================================================================

/// Twilio inbound SMS endpoint.
///
/// This endpoint:
/// 1. Verifies the `X-Twilio-Signature` header (if a token is configured)
/// 2. Stores the normalized message
/// 3. Returns an empty TwiML response
pub async fn sms_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    body: Bytes,
) -> Response {
    let callback = InboundCallback {
        url: external_url(&headers, &uri, state.config.public_base_url.as_deref()),
        fields: form_fields(&headers, &body),
        signature: headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    info!(
        url = %callback.url,
        field_count = callback.fields.len(),
        has_signature = callback.signature.is_some(),
        body_length = body.len(),
        "sms_webhook_received"
    );

    match state.gate.ingest(&callback) {
        Ok(_) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, state.reply.content_type())],
            state.reply.empty_reply(),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        match self {
            IngestError::Authentication { .. } => {
                (StatusCode::FORBIDDEN, "Invalid Twilio signature").into_response()
            }
        }
    }
}

/// Decode a form-encoded body. Anything else yields no fields.
fn form_fields(headers: &HeaderMap, body: &[u8]) -> Vec<(String, String)> {
    if body.is_empty() {
        return Vec::new();
    }

    let is_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| {
            ct.trim_start()
                .to_ascii_lowercase()
                .starts_with("application/x-www-form-urlencoded")
        })
        .unwrap_or(false);

    if !is_form {
        warn!(body_length = body.len(), "sms_webhook_not_form_encoded");
        return Vec::new();
    }

    url::form_urlencoded::parse(body).into_owned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn form_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded; charset=utf-8"),
        );
        headers
    }

    #[test]
    fn test_form_fields_decoded_in_order() {
        let fields = form_fields(&form_headers(), b"From=%2B1555&Body=hello+world&To=%2B1666");
        assert_eq!(
            fields,
            vec![
                ("From".to_string(), "+1555".to_string()),
                ("Body".to_string(), "hello world".to_string()),
                ("To".to_string(), "+1666".to_string()),
            ]
        );
    }

    #[test]
    fn test_form_fields_ignore_other_content_types() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(form_fields(&headers, br#"{"Body":"hi"}"#).is_empty());
        assert!(form_fields(&HeaderMap::new(), b"Body=hi").is_empty());
    }

    #[test]
    fn test_form_fields_empty_body() {
        assert!(form_fields(&form_headers(), b"").is_empty());
    }

    #[test]
    fn test_authentication_error_is_forbidden() {
        let response = IngestError::Authentication { reason: "missing signature" }.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
