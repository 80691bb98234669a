//! Twilio webhook signature verification.
//!
//! Twilio signs each request with HMAC-SHA1 over the full request URL
//! followed by the POST parameters sorted by name, and sends the Base64
//! digest in the `X-Twilio-Signature` header.
//! Reference: https://www.twilio.com/docs/usage/webhooks/webhooks-security

use std::collections::{BTreeMap, BTreeSet};

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use tracing::{debug, warn};
use url::Url;

use crate::config::Secret;
use crate::ingest::SignatureVerifier;

type HmacSha1 = Hmac<Sha1>;

/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "X-Twilio-Signature";

/// Verifier implementing Twilio's request signing scheme.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwilioSignatureVerifier;

impl SignatureVerifier for TwilioSignatureVerifier {
    fn verify(
        &self,
        url: &str,
        fields: &[(String, String)],
        signature: &str,
        secret: &Secret,
    ) -> bool {
        if signature.is_empty() || secret.expose().is_empty() {
            return false;
        }

        let provided = match STANDARD.decode(signature.trim()) {
            Ok(bytes) => bytes,
            Err(_) => {
                warn!(signature_length = signature.len(), "twilio_signature_malformed");
                return false;
            }
        };

        let params = canonical_params(fields);

        // Proxies may add or strip the default port, so accept any variant.
        url_variants(url).iter().any(|candidate| {
            let mut mac = match HmacSha1::new_from_slice(secret.expose().as_bytes()) {
                Ok(m) => m,
                Err(_) => return false,
            };
            mac.update(candidate.as_bytes());
            mac.update(params.as_bytes());

            let valid = mac.verify_slice(&provided).is_ok();
            if valid {
                debug!(url = %candidate, "twilio_signature_matched");
            }
            valid
        })
    }
}

/// Compute the Base64 signature Twilio would send for `url` and `fields`.
pub fn compute_signature(
    secret: &Secret,
    url: &str,
    fields: &[(String, String)],
) -> Option<String> {
    let mut mac = HmacSha1::new_from_slice(secret.expose().as_bytes()).ok()?;
    mac.update(url.as_bytes());
    mac.update(canonical_params(fields).as_bytes());
    Some(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Concatenate `name` + `value` for each distinct name, then each distinct
/// value, in ascending order.
fn canonical_params(fields: &[(String, String)]) -> String {
    let mut grouped: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for (name, value) in fields {
        grouped.entry(name.as_str()).or_default().insert(value.as_str());
    }

    let mut out = String::new();
    for (name, values) in grouped {
        for value in values {
            out.push_str(name);
            out.push_str(value);
        }
    }
    out
}

/// The URL as given, without its port, and with the scheme's default port.
///
/// Variants are spliced into the raw string so userinfo and the original
/// percent-encoding are preserved.
fn url_variants(raw: &str) -> Vec<String> {
    let mut variants = vec![raw.to_string()];

    let (parsed, (start, end)) = match (Url::parse(raw), authority_bounds(raw)) {
        (Ok(parsed), Some(bounds)) => (parsed, bounds),
        _ => return variants,
    };

    match port_offset(&raw[start..end]) {
        Some(colon) => {
            let colon = start + colon;
            variants.push(format!("{}{}", &raw[..colon], &raw[end..]));
        }
        None => {
            if let Some(port) = parsed.port_or_known_default() {
                variants.push(format!("{}:{}{}", &raw[..end], port, &raw[end..]));
            }
        }
    }

    variants
}

/// Byte range of the authority (`userinfo@host:port`) within `raw`.
fn authority_bounds(raw: &str) -> Option<(usize, usize)> {
    let start = raw.find("://")? + 3;
    let end = raw[start..]
        .find(|c: char| matches!(c, '/' | '?' | '#'))
        .map(|i| start + i)
        .unwrap_or(raw.len());
    Some((start, end))
}

/// Offset of the `:` introducing an explicit port in `authority`, if any.
fn port_offset(authority: &str) -> Option<usize> {
    let host_start = authority.rfind('@').map(|i| i + 1).unwrap_or(0);
    let host = &authority[host_start..];

    let colon = if host.starts_with('[') {
        host.find("]:").map(|i| i + 1)
    } else {
        host.rfind(':')
    };
    colon.map(|c| host_start + c)
}
