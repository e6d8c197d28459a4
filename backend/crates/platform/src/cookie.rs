//! Cookies
//!
//! Cookies written by the API are always `HttpOnly; SameSite=Lax; Path=/`.
//! Only `Secure` and `Max-Age` vary per deployment.

use axum::http::{HeaderMap, header};

#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    /// Off only for plain-HTTP development
    pub secure: bool,
    pub max_age_secs: Option<i64>,
}

impl CookieConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            secure: true,
            max_age_secs: None,
        }
    }

    /// `Set-Cookie` header value
    pub fn build_set_cookie(&self, value: &str) -> String {
        let mut parts = vec![
            format!("{}={value}", self.name),
            "HttpOnly".to_owned(),
            "SameSite=Lax".to_owned(),
            "Path=/".to_owned(),
        ];
        if self.secure {
            parts.push("Secure".to_owned());
        }
        if let Some(max_age) = self.max_age_secs {
            parts.push(format!("Max-Age={max_age}"));
        }
        parts.join("; ")
    }
}

/// Value of cookie `name` across every `Cookie` header
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_owned())
}
