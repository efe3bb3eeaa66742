//! Stateless session tokens.
//!
//! A token is an HS256 JWT whose payload is `{username, isa}` where `isa` is
//! the issue time as fractional unix seconds. There is no `exp` claim; a
//! payload is valid while `now < isa + 24h`, checked by [`TokenService::is_valid`]
//! against the wall clock. Because tokens are self-contained there is no
//! server-side revocation before natural expiry.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Tokens expire 24 hours after their issue time.
pub const TOKEN_TTL_SECONDS: f64 = 24.0 * 60.0 * 60.0;

/// Claims carried by a session token.
///
/// `PartialEq` only; `isa` is a float so `Eq` cannot hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub username: String,
    /// Issue time, fractional unix seconds.
    pub isa: f64,
}

/// Structural or signature failure while decoding a token.
///
/// Deliberately carries no detail: decode input is attacker-controlled and the
/// caller only needs to know the token is unusable.
#[derive(Debug, PartialEq, Eq)]
pub struct InvalidToken;

impl fmt::Display for InvalidToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid token")
    }
}

impl std::error::Error for InvalidToken {}

/// Issues and verifies session tokens with a process-wide symmetric secret.
pub struct TokenService {
    header: Header,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    /// Build a token service from the signing secret loaded at startup.
    ///
    /// The secret bytes are folded into the signing keys; the service never
    /// exposes them again and the keys have no `Debug` output.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let secret_bytes = secret.expose_secret().as_bytes();

        // The payload has no exp claim; validity is checked via is_valid.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            header: Header::new(Algorithm::HS256),
            encoding: EncodingKey::from_secret(secret_bytes),
            decoding: DecodingKey::from_secret(secret_bytes),
            validation,
        }
    }

    /// Issue a token for `username` stamped with the current time.
    ///
    /// # Errors
    /// Returns an error if JWT serialization fails, which does not happen for
    /// valid UTF-8 usernames.
    pub fn issue(&self, username: &str) -> anyhow::Result<String> {
        self.issue_at(username, now_unix())
    }

    pub(crate) fn issue_at(&self, username: &str, isa: f64) -> anyhow::Result<String> {
        let payload = TokenPayload {
            username: username.to_string(),
            isa,
        };
        Ok(jsonwebtoken::encode(&self.header, &payload, &self.encoding)?)
    }

    /// Verify the signature and structure of `token` and return its payload.
    ///
    /// Any malformed, tampered or foreign-signed input maps to [`InvalidToken`];
    /// this function never panics on untrusted input.
    pub fn decode(&self, token: &str) -> Result<TokenPayload, InvalidToken> {
        jsonwebtoken::decode::<TokenPayload>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| InvalidToken)
    }

    /// Whether `payload` is still within its validity window.
    ///
    /// Pure function of the payload and the wall clock; no stored state.
    #[must_use]
    pub fn is_valid(&self, payload: &TokenPayload) -> bool {
        now_unix() < payload.isa + TOKEN_TTL_SECONDS
    }
}

fn now_unix() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |d| d.as_secs_f64())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(&SecretString::from("test-secret-key"))
    }

    #[test]
    fn issue_then_decode_roundtrip() {
        let tokens = service();
        let token = tokens.issue("alice").unwrap();

        let payload = tokens.decode(&token).unwrap();
        assert_eq!(payload.username, "alice");
        assert!(payload.isa > 0.0);
        assert!(tokens.is_valid(&payload));
    }

    #[test]
    fn decode_rejects_garbage() {
        let tokens = service();
        for input in ["", "not-a-jwt", "a.b", "a.b.c", "....", "\u{0}\u{1}"] {
            assert_eq!(tokens.decode(input), Err(InvalidToken), "input: {input:?}");
        }
    }

    #[test]
    fn decode_rejects_tampered_signature() {
        let tokens = service();
        let token = tokens.issue("alice").unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
        let flipped = if parts[2].starts_with('A') { "B" } else { "A" };
        let tampered_sig = format!("{}{}", flipped, &parts[2][1..]);
        parts[2] = &tampered_sig;
        assert_eq!(tokens.decode(&parts.join(".")), Err(InvalidToken));
    }

    #[test]
    fn decode_rejects_tampered_payload() {
        let tokens = service();
        let a = tokens.issue("alice").unwrap();
        let b = tokens.issue("bob").unwrap();

        // Splice bob's payload into alice's envelope; signature no longer matches.
        let a_parts: Vec<&str> = a.split('.').collect();
        let b_parts: Vec<&str> = b.split('.').collect();
        let spliced = format!("{}.{}.{}", a_parts[0], b_parts[1], a_parts[2]);
        assert_eq!(tokens.decode(&spliced), Err(InvalidToken));
    }

    #[test]
    fn decode_rejects_foreign_secret() {
        let tokens = service();
        let other = TokenService::new(&SecretString::from("another-secret"));
        let token = other.issue("alice").unwrap();
        assert_eq!(tokens.decode(&token), Err(InvalidToken));
    }

    #[test]
    fn validity_window_boundaries() {
        let tokens = service();
        let now = now_unix();

        let fresh = TokenPayload {
            username: "alice".to_string(),
            isa: now,
        };
        assert!(tokens.is_valid(&fresh));

        // Just inside the window
        let near_expiry = TokenPayload {
            username: "alice".to_string(),
            isa: now - (TOKEN_TTL_SECONDS - 5.0),
        };
        assert!(tokens.is_valid(&near_expiry));

        // Just past the window
        let expired = TokenPayload {
            username: "alice".to_string(),
            isa: now - (TOKEN_TTL_SECONDS + 5.0),
        };
        assert!(!tokens.is_valid(&expired));
    }

    #[test]
    fn expired_token_still_decodes() {
        // Expiry is a separate check; decode only proves integrity.
        let tokens = service();
        let token = tokens
            .issue_at("alice", now_unix() - (TOKEN_TTL_SECONDS * 2.0))
            .unwrap();
        let payload = tokens.decode(&token).unwrap();
        assert_eq!(payload.username, "alice");
        assert!(!tokens.is_valid(&payload));
    }
}
