//! Upstream dealership API subsystem.
//!
//! # Data Flow
//! ```text
//! handler (session token, request id)
//!     → client.rs (build URL, attach bearer + X-Request-ID, send)
//!     → error.rs (classify transport failures, extract upstream messages)
//!     → normalize/ (shape the JSON body)
//! ```
//!
//! # Design Decisions
//! - One timeout per call, no retries outside sale creation
//! - Unreachable and timeout map to 503, unusable 2xx bodies to 502
//! - Non-2xx statuses pass through with the upstream message

pub mod client;
pub mod error;

use axum::http::{header, HeaderMap};

pub use client::{Call, UpstreamClient, UpstreamResponse};
pub use error::{extract_message, UpstreamError};

/// Public base URL of this service as seen by the browser.
///
/// Precedence: RFC 7239 `Forwarded`, then `X-Forwarded-Host` with
/// `X-Forwarded-Proto`, then `Host`, then `fallback`. Only the first hop
/// of a comma-separated list is used.
pub fn resolve_base_url(headers: &HeaderMap, fallback: &str) -> String {
    let first = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    if let Some(forwarded) = first("forwarded") {
        let mut host = None;
        let mut proto = None;
        for pair in forwarded.split(';') {
            if let Some((key, value)) = pair.split_once('=') {
                let value = value.trim().trim_matches('"');
                match key.trim().to_ascii_lowercase().as_str() {
                    "host" => host = Some(value.to_string()),
                    "proto" => proto = Some(value.to_ascii_lowercase()),
                    _ => {}
                }
            }
        }
        if let Some(host) = host.filter(|h| is_valid_host(h)) {
            return format!("{}://{}", scheme(proto.as_deref()), host);
        }
    }

    let proto = first("x-forwarded-proto");
    if let Some(host) = first("x-forwarded-host").filter(|h| is_valid_host(h)) {
        return format!("{}://{}", scheme(proto.as_deref()), host);
    }

    if let Some(host) = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|h| is_valid_host(h))
    {
        return format!("{}://{}", scheme(proto.as_deref()), host);
    }

    fallback.trim_end_matches('/').to_string()
}

fn scheme(proto: Option<&str>) -> &'static str {
    match proto {
        Some(p) if p.eq_ignore_ascii_case("https") => "https",
        _ => "http",
    }
}

fn is_valid_host(host: &str) -> bool {
    !host.is_empty()
        && !host
            .chars()
            .any(|c| c == '/' || c == '@' || c == '\\' || c.is_whitespace() || c.is_control())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    const FALLBACK: &str = "http://localhost:8080/";

    #[test]
    fn test_forwarded_wins() {
        let h = headers(&[
            ("forwarded", "for=10.0.0.1;proto=https;host=\"crm.dealer.example\", for=10.0.0.2"),
            ("x-forwarded-host", "other.example"),
            ("host", "internal:8080"),
        ]);
        assert_eq!(resolve_base_url(&h, FALLBACK), "https://crm.dealer.example");
    }

    #[test]
    fn test_x_forwarded_headers() {
        let h = headers(&[
            ("x-forwarded-host", "crm.dealer.example, proxy.internal"),
            ("x-forwarded-proto", "https"),
            ("host", "internal:8080"),
        ]);
        assert_eq!(resolve_base_url(&h, FALLBACK), "https://crm.dealer.example");

        let h = headers(&[("x-forwarded-host", "crm.dealer.example")]);
        assert_eq!(resolve_base_url(&h, FALLBACK), "http://crm.dealer.example");
    }

    #[test]
    fn test_host_header_and_fallback() {
        let h = headers(&[("host", "localhost:3000")]);
        assert_eq!(resolve_base_url(&h, FALLBACK), "http://localhost:3000");

        let h = headers(&[("host", "localhost:3000"), ("x-forwarded-proto", "https")]);
        assert_eq!(resolve_base_url(&h, FALLBACK), "https://localhost:3000");

        assert_eq!(resolve_base_url(&HeaderMap::new(), FALLBACK), "http://localhost:8080");
    }

    #[test]
    fn test_rejects_suspicious_hosts() {
        let h = headers(&[("x-forwarded-host", "evil.example/path"), ("host", "good.example")]);
        assert_eq!(resolve_base_url(&h, FALLBACK), "http://good.example");

        let h = headers(&[("host", "user@evil.example")]);
        assert_eq!(resolve_base_url(&h, FALLBACK), "http://localhost:8080");
    }
}
