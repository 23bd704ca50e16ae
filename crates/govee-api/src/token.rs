// Bearer token and its self-describing claims.
//
// Govee issues JWTs. We read the `exp` claim to know when a cached token is
// stale, and nothing else: the signature is never checked (the vendor's
// public key is not available to us) and claims never drive authorization.
// The server remains the only judge of validity; expiry is a cache hint.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// The subset of JWT claims the client cares about.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Expiry, seconds since the Unix epoch.
    #[serde(default)]
    pub exp: Option<i64>,
}

impl Claims {
    /// Decode the payload segment of a JWT without verifying its signature.
    ///
    /// Returns `None` if the token does not have a payload segment, the
    /// segment is not base64url, or it does not hold a JSON object.
    pub fn decode(token: &str) -> Option<Self> {
        let payload = token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// The `exp` claim as an instant.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// An opaque bearer token plus the expiry it claims for itself.
///
/// `Debug` never prints the token itself.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    raw: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Token {
    /// Wrap a raw token string, reading its expiry if the claims decode.
    ///
    /// A token whose claims cannot be read has no known expiry and is
    /// treated as usable until the server rejects it.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let expires_at = Claims::decode(&raw).and_then(|c| c.expires_at());
        Self { raw, expires_at }
    }

    /// Build a token from already-decoded claims.
    pub(crate) fn with_claims(raw: String, claims: &Claims) -> Self {
        Self {
            raw,
            expires_at: claims.expires_at(),
        }
    }

    /// The raw bearer string, as sent in the `Authorization` header.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Claimed expiry, if the token carries one.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Whether the claimed expiry is at or before `now`.
    ///
    /// Tokens without a claimed expiry never expire locally.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Human-readable expiry for log lines.
    pub(crate) fn expiry_label(&self) -> String {
        self.expires_at.map_or_else(
            || "unknown".to_owned(),
            |exp| exp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        )
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("raw", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn jwt(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.c2lnbmF0dXJl")
    }

    #[test]
    fn decodes_exp_without_signature_check() {
        let raw = jwt(&serde_json::json!({ "exp": 1_900_000_000, "sub": "user" }));
        let claims = Claims::decode(&raw).expect("claims should decode");
        assert_eq!(claims.exp, Some(1_900_000_000));

        let token = Token::new(raw);
        assert_eq!(
            token.expires_at(),
            DateTime::from_timestamp(1_900_000_000, 0)
        );
    }

    #[test]
    fn tolerates_padded_payload() {
        let header = URL_SAFE_NO_PAD.encode(b"{}");
        let payload = format!("{}==", URL_SAFE_NO_PAD.encode(br#"{"exp":42}"#));
        let raw = format!("{header}.{payload}.sig");
        assert_eq!(Claims::decode(&raw).and_then(|c| c.exp), Some(42));
    }

    #[test]
    fn opaque_tokens_have_no_expiry() {
        assert!(Claims::decode("not-a-jwt").is_none());
        assert!(Claims::decode("a.!!!.c").is_none());

        let token = Token::new("not-a-jwt");
        assert_eq!(token.expires_at(), None);
        assert!(!token.is_expired());
    }

    #[test]
    fn expiry_is_inclusive_of_now() {
        let now = Utc::now();
        let exp = now.timestamp();
        let token = Token::new(jwt(&serde_json::json!({ "exp": exp })));
        let at_exp = DateTime::from_timestamp(exp, 0).expect("valid timestamp");
        assert!(token.is_expired_at(at_exp));
        assert!(!token.is_expired_at(at_exp - Duration::seconds(1)));
    }

    #[test]
    fn debug_redacts_raw_token() {
        let token = Token::new("super-secret");
        let printed = format!("{token:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("redacted"));
    }
}
