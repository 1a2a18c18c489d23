//! Signed cookie sessions.
//!
//! The whole session travels in one cookie:
//! `base64url(json).base64url(hmac_sha256(secret, base64url(json)))`.
//! The JSON envelope carries an expiry timestamp next to the session data.
//! Cookies that are malformed, carry a bad signature or have expired decode to
//! an empty session.

use axum::http::{
    header::{InvalidHeaderValue, COOKIE},
    HeaderMap, HeaderValue,
};
use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE_NAME: &str = "studyhall_session";

pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 12 * 60 * 60;

/// Longest accepted cookie lifetime (400 days, the cap browsers apply to `Max-Age`).
pub const MAX_SESSION_TTL_SECONDS: i64 = 400 * 24 * 60 * 60;

/// Pending flashes kept per session; older ones are dropped first.
const MAX_PENDING_FLASHES: usize = 8;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid session signing key")]
    Key,
    #[error("session encoding: {0}")]
    Json(#[from] serde_json::Error),
    #[error("session cookie header: {0}")]
    Header(#[from] InvalidHeaderValue),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Success,
    Info,
    Warning,
    Danger,
}

impl FlashCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

/// One-shot notice shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: FlashCategory,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    // course id (as string) -> percentage, exactly as submitted
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    progress: BTreeMap<String, i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    flashes: Vec<Flash>,
}

impl Session {
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn set_username(&mut self, username: &str) {
        self.username = Some(username.to_string());
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }

    #[must_use]
    pub fn progress(&self, course_id: u32) -> i64 {
        self.progress
            .get(&course_id.to_string())
            .copied()
            .unwrap_or(0)
    }

    pub fn set_progress(&mut self, course_id: u32, value: i64) {
        self.progress.insert(course_id.to_string(), value);
    }

    /// Queue a notice. Repeating a pending notice does not queue it twice.
    pub fn flash(&mut self, category: FlashCategory, message: impl Into<String>) {
        let flash = Flash {
            category,
            message: message.into(),
        };
        if self.flashes.contains(&flash) {
            return;
        }
        if self.flashes.len() >= MAX_PENDING_FLASHES {
            self.flashes.remove(0);
        }
        self.flashes.push(flash);
    }

    /// Remove and return pending flashes; they are shown once.
    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flashes)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    exp: i64,
    session: Session,
}

#[derive(Clone)]
pub struct SessionCodec {
    key: SecretString,
    ttl_seconds: i64,
    secure: bool,
}

impl std::fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCodec")
            .field("key", &"***")
            .field("ttl_seconds", &self.ttl_seconds)
            .field("secure", &self.secure)
            .finish()
    }
}

impl SessionCodec {
    #[must_use]
    pub fn new(key: SecretString) -> Self {
        Self {
            key,
            ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            secure: false,
        }
    }

    /// Values above [`MAX_SESSION_TTL_SECONDS`] are capped.
    #[must_use]
    pub fn with_ttl_seconds(mut self, seconds: i64) -> Self {
        self.ttl_seconds = seconds.min(MAX_SESSION_TTL_SECONDS);
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    fn mac(&self) -> Result<HmacSha256, SessionError> {
        HmacSha256::new_from_slice(self.key.expose_secret().as_bytes()).map_err(|_| SessionError::Key)
    }

    /// Serialize and sign a session into a cookie value.
    ///
    /// # Errors
    /// Returns an error if the session cannot be serialized.
    pub fn encode(&self, session: &Session) -> Result<String, SessionError> {
        let envelope = Envelope {
            exp: Utc::now().timestamp().saturating_add(self.ttl_seconds),
            session: session.clone(),
        };
        let payload = Base64UrlUnpadded::encode_string(&serde_json::to_vec(&envelope)?);

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

        Ok(format!("{payload}.{signature}"))
    }

    /// Verify and deserialize a cookie value. `None` for anything untrusted or expired.
    #[must_use]
    pub fn decode(&self, value: &str) -> Option<Session> {
        let (payload, signature) = value.split_once('.')?;
        let signature = Base64UrlUnpadded::decode_vec(signature).ok()?;

        let mut mac = self.mac().ok()?;
        mac.update(payload.as_bytes());
        if mac.verify_slice(&signature).is_err() {
            debug!("Rejected session cookie with bad signature");
            return None;
        }

        let json = Base64UrlUnpadded::decode_vec(payload).ok()?;
        let envelope: Envelope = serde_json::from_slice(&json).ok()?;
        if envelope.exp <= Utc::now().timestamp() {
            debug!("Rejected expired session cookie");
            return None;
        }

        Some(envelope.session)
    }

    /// Session carried by the request cookies; empty when absent or untrusted.
    #[must_use]
    pub fn from_headers(&self, headers: &HeaderMap) -> Session {
        extract_cookie(headers, SESSION_COOKIE_NAME)
            .and_then(|value| self.decode(&value))
            .unwrap_or_default()
    }

    /// `Set-Cookie` value for the session. An empty session clears the cookie.
    ///
    /// # Errors
    /// Returns an error if the session cannot be encoded.
    pub fn set_cookie(&self, session: &Session) -> Result<HeaderValue, SessionError> {
        let mut cookie = if session.is_empty() {
            format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
        } else {
            let value = self.encode(session)?;
            format!(
                "{SESSION_COOKIE_NAME}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
                self.ttl_seconds
            )
        };
        // Only mark cookies secure when served over HTTPS.
        if self.secure {
            cookie.push_str("; Secure");
        }
        Ok(HeaderValue::from_str(&cookie)?)
    }
}

fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (key, val) = pair.trim().split_once('=')?;
            (key.trim() == name).then(|| val.trim().to_string())
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn codec() -> SessionCodec {
        SessionCodec::new(SecretString::from("test-secret"))
    }

    fn cookie_headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE_NAME}={value}")).unwrap(),
        );
        headers
    }

    #[test]
    fn signed_session_decodes_back() {
        let codec = codec();
        let mut session = Session::default();
        session.set_username("alice");
        session.set_progress(2, 75);
        session.flash(FlashCategory::Success, "hi");

        let value = codec.encode(&session).unwrap();
        assert_eq!(codec.from_headers(&cookie_headers(&value)), session);
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let codec = codec();
        let mut session = Session::default();
        session.set_username("mallory");
        let value = codec.encode(&session).unwrap();
        let (_, signature) = value.split_once('.').unwrap();

        let mut forged = Session::default();
        forged.set_username("admin");
        let forged_payload = Base64UrlUnpadded::encode_string(
            &serde_json::to_vec(&Envelope {
                exp: Utc::now().timestamp() + 60,
                session: forged,
            })
            .unwrap(),
        );

        assert!(codec.decode(&format!("{forged_payload}.{signature}")).is_none());
    }

    #[test]
    fn other_secret_cannot_read_the_cookie() {
        let mut session = Session::default();
        session.set_username("bob");
        let value = codec().encode(&session).unwrap();

        let other = SessionCodec::new(SecretString::from("another-secret"));
        assert!(other.decode(&value).is_none());
    }

    #[test]
    fn expired_cookie_is_rejected() {
        let codec = codec().with_ttl_seconds(-1);
        let mut session = Session::default();
        session.set_username("carol");
        let value = codec.encode(&session).unwrap();
        assert!(codec.decode(&value).is_none());
    }

    #[test]
    fn garbage_yields_an_empty_session() {
        let codec = codec();
        assert!(codec.from_headers(&cookie_headers("not-a-cookie")).is_empty());
        assert!(codec.from_headers(&cookie_headers("a.b")).is_empty());
        assert!(codec.from_headers(&HeaderMap::new()).is_empty());
    }

    #[test]
    fn progress_defaults_to_zero_and_is_unbounded() {
        let mut session = Session::default();
        assert_eq!(session.progress(1), 0);
        session.set_progress(1, 250);
        session.set_progress(3, -5);
        assert_eq!(session.progress(1), 250);
        assert_eq!(session.progress(3), -5);
    }

    #[test]
    fn flashes_are_taken_once() {
        let mut session = Session::default();
        session.flash(FlashCategory::Info, "once");
        assert_eq!(session.take_flashes().len(), 1);
        assert!(session.take_flashes().is_empty());
        assert!(session.is_empty());
    }

    #[test]
    fn repeated_flashes_do_not_pile_up() {
        let mut session = Session::default();
        for _ in 0..50 {
            session.flash(FlashCategory::Success, "Progress updated.");
        }
        assert_eq!(session.take_flashes().len(), 1);

        for n in 0..50 {
            session.flash(FlashCategory::Info, format!("notice {n}"));
        }
        let flashes = session.take_flashes();
        assert_eq!(flashes.len(), MAX_PENDING_FLASHES);
        assert_eq!(flashes.last().unwrap().message, "notice 49");
    }

    #[test]
    fn oversized_ttl_is_capped() {
        let codec = codec().with_ttl_seconds(i64::MAX);
        assert_eq!(codec.ttl_seconds(), MAX_SESSION_TTL_SECONDS);

        let mut session = Session::default();
        session.set_username("erin");
        let value = codec.encode(&session).unwrap();
        assert_eq!(codec.decode(&value), Some(session.clone()));

        let header = codec.set_cookie(&session).unwrap();
        assert!(header
            .to_str()
            .unwrap()
            .contains(&format!("Max-Age={MAX_SESSION_TTL_SECONDS}")));
    }

    #[test]
    fn empty_session_clears_the_cookie() {
        let header = codec().set_cookie(&Session::default()).unwrap();
        let header = header.to_str().unwrap();
        assert!(header.starts_with(&format!("{SESSION_COOKIE_NAME}=;")));
        assert!(header.contains("Max-Age=0"));
    }

    #[test]
    fn secure_flag_is_appended() {
        let mut session = Session::default();
        session.set_username("dave");
        let header = codec().with_secure(true).set_cookie(&session).unwrap();
        let header = header.to_str().unwrap();
        assert!(header.contains("HttpOnly"));
        assert!(header.ends_with("; Secure"));
    }
}
