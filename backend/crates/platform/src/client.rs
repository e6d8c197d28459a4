//! Client identification utilities
//!
//! Common functions for identifying clients via HTTP headers. These values
//! only feed logs; nothing authorizes on them.

use axum::http::{HeaderMap, header};

/// Placeholder when a header is absent
pub const UNKNOWN: &str = "unknown";

/// Client address as reported by the reverse proxy
///
/// Takes the first hop of `X-Forwarded-For`, then `X-Real-IP`, and falls
/// back to [`UNKNOWN`].
pub fn client_ip(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|xff| xff.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or(UNKNOWN)
        .to_string()
}

/// `User-Agent` header, or [`UNKNOWN`]
pub fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(UNKNOWN)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_xff_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("192.168.1.1, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));

        assert_eq!(client_ip(&headers), "192.168.1.1");
    }

    #[test]
    fn test_client_ip_real_ip_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(client_ip(&headers), "10.0.0.9");
    }

    #[test]
    fn test_client_ip_unknown() {
        assert_eq!(client_ip(&HeaderMap::new()), "unknown");
    }

    #[test]
    fn test_user_agent() {
        let mut headers = HeaderMap::new();
        assert_eq!(user_agent(&headers), "unknown");

        headers.insert(header::USER_AGENT, HeaderValue::from_static("curl/8.0"));
        assert_eq!(user_agent(&headers), "curl/8.0");
    }
}
