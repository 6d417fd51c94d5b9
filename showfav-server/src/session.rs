//! Session tokens and the session cookie
//!
//! The cookie carries `<token>.<signature>`, where the signature is the
//! SHA-256 of `secret:token`. A cookie whose signature does not verify is
//! treated as if no cookie was sent.

use axum::http::{header, HeaderMap, HeaderValue};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use showfav_common::config::DeploymentMode;

pub const SESSION_COOKIE: &str = "showfav.sid";

/// Opaque per-browser session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept only well-formed tokens
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok().map(|uuid| Self(uuid.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signs, verifies and formats the session cookie for a deployment mode
#[derive(Clone)]
pub struct CookiePolicy {
    mode: DeploymentMode,
    secret: Arc<str>,
    max_age: Duration,
}

impl CookiePolicy {
    pub fn new(mode: DeploymentMode, secret: &str, max_age: Duration) -> Self {
        Self {
            mode,
            secret: Arc::from(secret),
            max_age,
        }
    }

    pub fn mode(&self) -> DeploymentMode {
        self.mode
    }

    fn sign(&self, token: &SessionToken) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b":");
        hasher.update(token.as_str().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Verified session token from the request's `Cookie` headers
    pub fn token_from_headers(&self, headers: &HeaderMap) -> Option<SessionToken> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .filter(|(name, _)| *name == SESSION_COOKIE)
            .find_map(|(_, value)| self.verify(value))
    }

    fn verify(&self, value: &str) -> Option<SessionToken> {
        let (raw_token, signature) = value.rsplit_once('.')?;
        let token = SessionToken::parse(raw_token)?;
        if self.sign(&token) == signature {
            Some(token)
        } else {
            tracing::debug!("Rejected session cookie with bad signature");
            None
        }
    }

    /// `Set-Cookie` value issuing `token`
    ///
    /// Production: `Secure; SameSite=Strict`. Development: `SameSite=Lax`.
    pub fn set_cookie(&self, token: &SessionToken) -> HeaderValue {
        let mut cookie = format!(
            "{}={}.{}; Path=/; Max-Age={}; HttpOnly",
            SESSION_COOKIE,
            token,
            self.sign(token),
            self.max_age.as_secs()
        );
        if self.mode.is_production() {
            cookie.push_str("; Secure; SameSite=Strict");
        } else {
            cookie.push_str("; SameSite=Lax");
        }
        // Built only from a uuid, a hex digest and fixed ASCII
        HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
    }
}
