//! Bearer credential issued by the auth endpoint.
//!
//! # Memory Security
//!
//! `Credential` implements `Zeroize` and `ZeroizeOnDrop` so the token is
//! erased when the session ends, and its `Debug` output never contains it.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Opaque bearer token proving an authenticated doctor session.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Credential {
    token: String,
}

impl Credential {
    /// Wrap a token. Surrounding whitespace is stripped; an empty token is
    /// not a credential.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let mut token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            token.zeroize();
            return None;
        }
        let credential = Self {
            token: trimmed.to_string(),
        };
        token.zeroize();
        Some(credential)
    }

    /// Raw token, for the `Authorization` header and persistence only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.token
    }

    /// Header value in `Bearer <token>` form.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Decode the JWT payload without verifying it.
    ///
    /// Only used for display (who is logged in, when the session lapses).
    /// Returns `None` for tokens that are not JWTs.
    #[must_use]
    pub fn claims(&self) -> Option<TokenClaims> {
        let payload = self.token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        let raw: RawClaims = serde_json::from_slice(&bytes).ok()?;
        Some(TokenClaims {
            email: raw.email,
            expires_at: raw.exp.and_then(|s| DateTime::from_timestamp(s, 0)),
        })
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("len", &self.token.len())
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct RawClaims {
    email: Option<String>,
    exp: Option<i64>,
}

/// Unverified claims carried by a JWT credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub email: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenClaims {
    /// Whether `exp` lies in the past relative to `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt_with(payload: &str) -> String {
        format!(
            "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.{}.c2lnbmF0dXJl",
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_empty_token_rejected() {
        assert!(Credential::new("").is_none());
        assert!(Credential::new("   ").is_none());
        assert_eq!(Credential::new(" abc ").unwrap().expose(), "abc");
    }

    #[test]
    fn test_debug_hides_token() {
        let c = Credential::new("super-secret-token").unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("len"));
    }

    #[test]
    fn test_bearer_header() {
        let c = Credential::new("abc").unwrap();
        assert_eq!(c.bearer(), "Bearer abc");
    }

    #[test]
    fn test_claims_decoded_from_jwt() {
        let c = Credential::new(jwt_with(r#"{"email":"dr@clinic.org","exp":1700000000}"#)).unwrap();
        let claims = c.claims().expect("Should decode");
        assert_eq!(claims.email.as_deref(), Some("dr@clinic.org"));
        let exp = claims.expires_at.expect("exp present");
        assert_eq!(exp.timestamp(), 1_700_000_000);
        assert!(claims.is_expired_at(DateTime::from_timestamp(1_700_000_001, 0).unwrap()));
        assert!(!claims.is_expired_at(DateTime::from_timestamp(1_600_000_000, 0).unwrap()));
    }

    #[test]
    fn test_claims_absent_for_opaque_token() {
        let c = Credential::new("opaque").unwrap();
        assert!(c.claims().is_none());
    }
}
