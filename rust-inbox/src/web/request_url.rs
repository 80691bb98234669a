//! Reconstruction of the URL the provider actually called.
//!
//! Signatures cover the full public URL, which the server usually never sees
//! directly when it runs behind a TLS-terminating proxy.

use axum::http::{HeaderMap, Uri};

/// Build the externally visible URL for a request.
///
/// A configured `public_base_url` wins. Otherwise the scheme and host come
/// from `X-Forwarded-Proto` / `X-Forwarded-Host`, falling back to plain
/// `http` and the `Host` header.
pub fn external_url(headers: &HeaderMap, uri: &Uri, public_base_url: Option<&str>) -> String {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    if let Some(base) = public_base_url {
        return format!("{}{}", base.trim_end_matches('/'), path_and_query);
    }

    let scheme = first_header_value(headers, "x-forwarded-proto").unwrap_or("http");
    let host = first_header_value(headers, "x-forwarded-host")
        .or_else(|| first_header_value(headers, "host"))
        .unwrap_or("localhost");

    format!("{}://{}{}", scheme, host, path_and_query)
}

/// First comma-separated entry of a header, trimmed.
fn first_header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
