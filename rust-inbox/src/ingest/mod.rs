//! Signature-gated ingestion of inbound SMS callbacks.
//!
//! ## Ingestion Flow
//!
//! ```text
//! InboundCallback → verify signature (if a token is configured) → normalize() → BoundedLog
//! ```

pub mod normalize;

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Secret;
use crate::inbox::{BoundedLog, Message};

pub use normalize::normalize;

/// Maximum characters of a field value included in rejection logs.
const LOG_VALUE_LIMIT: usize = 100;

/// Checks that a callback was signed by the provider.
pub trait SignatureVerifier: Send + Sync {
    /// Return `true` if `signature` is valid for `url` and `fields` under `secret`.
    fn verify(
        &self,
        url: &str,
        fields: &[(String, String)],
        signature: &str,
        secret: &Secret,
    ) -> bool;
}

/// One inbound callback as seen by the server.
#[derive(Debug, Clone, Default)]
pub struct InboundCallback {
    /// Destination URL as the provider addressed it
    pub url: String,
    /// Decoded form fields in request order
    pub fields: Vec<(String, String)>,
    /// Value of the signature header, if any
    pub signature: Option<String>,
}

/// Reasons an ingestion is rejected.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("authentication failed: {reason}")]
    Authentication { reason: &'static str },
}

/// Authenticates callbacks and records them in the inbox.
pub struct IngestionGate {
    secret: Option<Secret>,
    verifier: Arc<dyn SignatureVerifier>,
    log: BoundedLog,
}

impl IngestionGate {
    /// Create the gate. Without a secret every callback is accepted; this is
    /// reported once here rather than on each request.
    pub fn new(
        secret: Option<Secret>,
        verifier: Arc<dyn SignatureVerifier>,
        log: BoundedLog,
    ) -> Self {
        if secret.is_none() {
            warn!("signature_verification_disabled");
        }

        Self {
            secret,
            verifier,
            log,
        }
    }

    /// Authenticate `callback`, normalize it and append it to the log.
    ///
    /// On error the log is left untouched.
    pub fn ingest(&self, callback: &InboundCallback) -> Result<Message, IngestError> {
        if let Some(secret) = &self.secret {
            self.authenticate(callback, secret)?;
        }

        let message = normalize(&callback.fields, Utc::now());
        self.log.append(message.clone());

        info!(
            message_sid = message.message_id.as_deref().unwrap_or(""),
            from = %message.from_address,
            to = %message.to_address,
            num_media = message.media_count,
            stored = self.log.len(),
            "sms_message_stored"
        );

        Ok(message)
    }

    fn authenticate(
        &self,
        callback: &InboundCallback,
        secret: &Secret,
    ) -> Result<(), IngestError> {
        let reason = match callback.signature.as_deref() {
            None | Some("") => "missing signature",
            Some(signature) => {
                if self
                    .verifier
                    .verify(&callback.url, &callback.fields, signature, secret)
                {
                    return Ok(());
                }
                "invalid signature"
            }
        };

        warn!(
            reason,
            url = %callback.url,
            params = ?truncated_fields(&callback.fields),
            "sms_signature_invalid"
        );

        Err(IngestError::Authentication { reason })
    }
}

/// Field values shortened for logging.
fn truncated_fields(fields: &[(String, String)]) -> Vec<(&str, String)> {
    fields
        .iter()
        .map(|(k, v)| {
            let value = if v.chars().count() > LOG_VALUE_LIMIT {
                let head: String = v.chars().take(LOG_VALUE_LIMIT).collect();
                format!("{}...", head)
            } else {
                v.clone()
            };
            (k.as_str(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Accepts exactly one signature value.
    struct FixedVerifier(&'static str);

    impl SignatureVerifier for FixedVerifier {
        fn verify(
            &self,
            _url: &str,
            _fields: &[(String, String)],
            signature: &str,
            _secret: &Secret,
        ) -> bool {
            signature == self.0
        }
    }

    fn callback(signature: Option<&str>) -> InboundCallback {
        InboundCallback {
            url: "https://example.com/sms".to_string(),
            fields: vec![
                ("MessageSid".to_string(), "SM1".to_string()),
                ("Body".to_string(), "hi".to_string()),
            ],
            signature: signature.map(str::to_string),
        }
    }

    fn gate(secret: Option<&str>, log: &BoundedLog) -> IngestionGate {
        IngestionGate::new(
            secret.and_then(Secret::new),
            Arc::new(FixedVerifier("good")),
            log.clone(),
        )
    }

    #[test]
    fn test_valid_signature_is_stored() {
        let log = BoundedLog::new(10);
        let gate = gate(Some("token"), &log);

        let message = gate.ingest(&callback(Some("good"))).unwrap();

        assert_eq!(message.message_id.as_deref(), Some("SM1"));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_invalid_signature_is_rejected() {
        let log = BoundedLog::new(10);
        let gate = gate(Some("token"), &log);

        let err = gate.ingest(&callback(Some("bad"))).unwrap_err();

        assert!(matches!(err, IngestError::Authentication { reason: "invalid signature" }));
        assert!(log.is_empty());
    }

    #[test]
    fn test_missing_signature_is_rejected() {
        let log = BoundedLog::new(10);
        let gate = gate(Some("token"), &log);

        assert!(gate.ingest(&callback(None)).is_err());
        assert!(gate.ingest(&callback(Some(""))).is_err());
        assert!(log.is_empty());
    }

    #[test]
    fn test_unconfigured_secret_accepts_anything() {
        let log = BoundedLog::new(10);
        let gate = gate(None, &log);

        gate.ingest(&callback(None)).unwrap();
        gate.ingest(&callback(Some("bad"))).unwrap();

        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_received_at_is_stamped_by_gate() {
        let log = BoundedLog::new(10);
        let gate = gate(None, &log);

        let message = gate.ingest(&callback(None)).unwrap();

        assert!(message.received_at.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&message.received_at).is_ok());
    }

    /// Writer collecting formatted log lines in memory.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn count(&self, needle: &str) -> usize {
            String::from_utf8_lossy(&self.0.lock()).matches(needle).count()
        }
    }

    fn capture<F: FnOnce()>(f: F) -> CapturedLogs {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, f);
        logs
    }

    #[test]
    fn test_disabled_verification_warns_once_at_construction() {
        let log = BoundedLog::new(10);

        let logs = capture(|| {
            let gate = gate(None, &log);
            gate.ingest(&callback(None)).unwrap();
            gate.ingest(&callback(Some("bad"))).unwrap();
        });

        assert_eq!(logs.count("signature_verification_disabled"), 1);
        assert_eq!(logs.count("sms_message_stored"), 2);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_configured_secret_does_not_warn_disabled() {
        let log = BoundedLog::new(10);

        let logs = capture(|| {
            let gate = gate(Some("token"), &log);
            gate.ingest(&callback(Some("good"))).unwrap();
        });

        assert_eq!(logs.count("signature_verification_disabled"), 0);
    }

    #[test]
    fn test_truncated_fields() {
        let fields = vec![
            ("Body".to_string(), "x".repeat(150)),
            ("From".to_string(), "+1".to_string()),
        ];

        let shortened = truncated_fields(&fields);

        assert_eq!(shortened[0].1.len(), 103);
        assert!(shortened[0].1.ends_with("..."));
        assert_eq!(shortened[1].1, "+1");
    }
}
