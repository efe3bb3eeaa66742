//! Request and response payloads for the user API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Credentials for sign-up and login.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AuthRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
}

/// Public view of a user row, password hash excluded.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdatePasswordRequest {
    pub new_password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct OtpRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct OtpVerifyRequest {
    pub email: String,
    pub otp: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_request_rejects_unknown_fields() {
        let result: Result<AuthRequest, _> =
            serde_json::from_str(r#"{"username": "a", "password": "b", "extra": 1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_user_response_serializes_null_email() {
        let response = UserResponse {
            id: 1,
            username: "alice".to_string(),
            email: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json["email"].is_null());
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn test_otp_verify_request_rejects_negative_otp() {
        let result: Result<OtpVerifyRequest, _> =
            serde_json::from_str(r#"{"email": "a@example.com", "otp": -1}"#);
        assert!(result.is_err());
    }
}
