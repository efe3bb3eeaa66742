pub mod health;
pub mod otp;
pub mod storage;
pub mod types;
pub mod users;

use axum::{response::IntoResponse, Json};
use regex::Regex;
use serde_json::json;

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

// axum handler for the root
pub async fn root() -> impl IntoResponse {
    Json(json!({"Hello": "World"}))
}

/// Shallow email shape check, enough to reject obvious garbage before
/// issuing an OTP. Deliverability is proven by the OTP itself.
#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(EMAIL_PATTERN).map_or(false, |re| re.is_match(email))
}

#[cfg(test)]
mod tests {
    use super::valid_email;

    #[test]
    fn test_valid_email() {
        assert!(valid_email("user@example.com"));
        assert!(valid_email("first.last+tag@sub.example.co"));
        assert!(valid_email("A_b-1%c@example.io"));
    }

    #[test]
    fn test_invalid_email() {
        assert!(!valid_email(""));
        assert!(!valid_email("user"));
        assert!(!valid_email("user@"));
        assert!(!valid_email("@example.com"));
        assert!(!valid_email("user@example"));
        assert!(!valid_email("user@example.c"));
        assert!(!valid_email("user example@example.com"));
    }
}
