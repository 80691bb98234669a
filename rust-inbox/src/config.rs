//! Configuration module for environment variable parsing.
//!
//! All configuration is read once at startup and threaded into the web
//! server state. Nothing reads the environment at request time.

use std::env;
use std::fmt;

use tracing::warn;

use crate::inbox::MAX_MESSAGES;

/// Shared secret used to verify Twilio request signatures.
///
/// `Debug` is redacted so the token never ends up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value. Returns `None` for empty or whitespace-only input,
    /// which callers treat as "not configured".
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Secret(value))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Twilio auth token; `None` disables signature verification
    pub twilio_auth_token: Option<Secret>,

    /// Externally visible base URL (scheme + host) used when reconstructing
    /// the callback URL for signature checks behind a proxy
    pub public_base_url: Option<String>,

    /// Maximum number of messages retained in memory
    pub max_messages: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 5000,
            twilio_auth_token: None,
            public_base_url: None,
            max_messages: MAX_MESSAGES,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            port: parse_or("PORT", defaults.port),

            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN").ok().and_then(Secret::new),

            public_base_url: env::var("PUBLIC_BASE_URL")
                .ok()
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty()),

            max_messages: parse_or("MAX_MESSAGES", defaults.max_messages),
        }
    }

    /// Whether inbound callbacks will be signature checked.
    pub fn signature_verification_enabled(&self) -> bool {
        self.twilio_auth_token.is_some()
    }
}

/// Parse a numeric environment variable, falling back to `default` when it
/// is unset or invalid.
fn parse_or<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid numeric value, using default");
            default
        }
    }
}
