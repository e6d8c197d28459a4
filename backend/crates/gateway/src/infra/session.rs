//! Signed-cookie sessions
//!
//! The session cookie holds `<user_id>.<base64url(HMAC-SHA256(secret, user_id))>`.
//! Verification is stateless; revocation is out of scope.

use axum::http::HeaderMap;
use platform::cookie::{CookieConfig, extract_cookie};
use platform::crypto::{sign, verify};

use crate::domain::repository::{Session, SessionProvider};
use crate::error::SessionError;

pub const SESSION_COOKIE: &str = "aether_session";

/// Session lifetime written into `Max-Age`
pub const SESSION_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;

#[derive(Clone)]
pub struct SignedCookieSessions {
    secret: [u8; 32],
    cookie: CookieConfig,
}

impl SignedCookieSessions {
    pub fn new(secret: [u8; 32]) -> Self {
        Self {
            secret,
            cookie: CookieConfig {
                max_age_secs: Some(SESSION_MAX_AGE_SECS),
                ..CookieConfig::new(SESSION_COOKIE)
            },
        }
    }

    /// Cookies without `Secure`, for plain-HTTP local development
    pub fn insecure_cookies(mut self) -> Self {
        self.cookie.secure = false;
        self
    }

    /// Token for `user_id`
    pub fn issue(&self, user_id: &str) -> String {
        sign(&self.secret, user_id)
    }

    /// `Set-Cookie` value carrying a fresh token for `user_id`
    pub fn set_cookie(&self, user_id: &str) -> String {
        self.cookie.build_set_cookie(&self.issue(user_id))
    }

    /// User id of a valid token
    pub fn verify(&self, token: &str) -> Option<String> {
        verify(&self.secret, token).map(str::to_owned)
    }
}

impl std::fmt::Debug for SignedCookieSessions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedCookieSessions")
            .field("cookie", &self.cookie.name)
            .finish_non_exhaustive()
    }
}

impl SessionProvider for SignedCookieSessions {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Session>, SessionError> {
        let Some(token) = extract_cookie(headers, &self.cookie.name) else {
            return Ok(None);
        };

        match self.verify(&token) {
            Some(user_id) => Ok(Some(Session { user_id })),
            None => {
                tracing::debug!("Rejected session cookie with invalid signature");
                Ok(None)
            }
        }
    }
}
