//! Bearer-token guard for protected routes.
//!
//! The single enforcement point: extract the `Authorization: Bearer` value,
//! verify it with the token service, check the validity window, and hand the
//! username to the handler. The guard proves identity only; whether that user
//! still exists is the handler's problem (looked up via storage), so a valid
//! token for a since-deleted user authenticates and then 404s downstream.

use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use super::token::TokenService;

/// Why a request failed authentication.
///
/// Converted to a 401 with a coarse detail string; token internals are never
/// exposed to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    MissingToken,
    InvalidToken,
    ExpiredToken,
}

impl AuthRejection {
    #[must_use]
    pub const fn detail(self) -> &'static str {
        match self {
            Self::MissingToken => "JWT Not provided",
            Self::InvalidToken => "Invalid JWT",
            Self::ExpiredToken => "Token Expired",
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, self.detail()).into_response()
    }
}

/// Authenticate a request and return the username carried by its token.
///
/// # Errors
/// Returns [`AuthRejection`] when the bearer credential is missing, fails
/// signature/structure checks, or is past its validity window.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> Result<String, AuthRejection> {
    let token = extract_bearer_token(headers).ok_or(AuthRejection::MissingToken)?;

    let payload = tokens
        .decode(&token)
        .map_err(|_| AuthRejection::InvalidToken)?;

    if !tokens.is_valid(&payload) {
        return Err(AuthRejection::ExpiredToken);
    }

    Ok(payload.username)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::token::TOKEN_TTL_SECONDS;
    use secrecy::SecretString;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn service() -> TokenService {
        TokenService::new(&SecretString::from("guard-test-secret"))
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
        headers
    }

    #[test]
    fn missing_header_is_rejected() {
        let tokens = service();
        assert_eq!(
            authenticate(&HeaderMap::new(), &tokens),
            Err(AuthRejection::MissingToken)
        );
    }

    #[test]
    fn non_bearer_scheme_is_rejected() {
        let tokens = service();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Basic dXNlcjpwdw==".parse().unwrap());
        assert_eq!(
            authenticate(&headers, &tokens),
            Err(AuthRejection::MissingToken)
        );
    }

    #[test]
    fn empty_bearer_value_is_rejected() {
        let tokens = service();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(
            authenticate(&headers, &tokens),
            Err(AuthRejection::MissingToken)
        );
    }

    #[test]
    fn valid_token_yields_username() {
        let tokens = service();
        let token = tokens.issue("alice").unwrap();
        assert_eq!(
            authenticate(&bearer(&token), &tokens).as_deref(),
            Ok("alice")
        );
    }

    #[test]
    fn lowercase_scheme_is_accepted() {
        let tokens = service();
        let token = tokens.issue("alice").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("bearer {token}").parse().unwrap());
        assert_eq!(authenticate(&headers, &tokens).as_deref(), Ok("alice"));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let tokens = service();
        assert_eq!(
            authenticate(&bearer("definitely-not-a-jwt"), &tokens),
            Err(AuthRejection::InvalidToken)
        );
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = service();
        let old = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs_f64()
            - (TOKEN_TTL_SECONDS + 60.0);
        let token = tokens.issue_at("alice", old).unwrap();
        assert_eq!(
            authenticate(&bearer(&token), &tokens),
            Err(AuthRejection::ExpiredToken)
        );
    }
}
