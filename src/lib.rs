//! # Sesamo (User Accounts & Email OTP)
//!
//! `sesamo` is a small identity backend: user registration and login with
//! bcrypt-hashed credentials, stateless JWT bearer sessions, and email
//! ownership verification through short-lived one-time passwords.
//!
//! ## Sessions
//!
//! Login issues a compact HS256 JWT carrying the username and its issue time
//! (`isa`, fractional unix seconds). Tokens are valid for 24 hours from
//! `isa` and are never persisted or revoked server-side; expiry is the only
//! logout. The signing secret is loaded once at startup and injected into the
//! token service, never read from a global.
//!
//! ## Email OTP
//!
//! Requesting verification stores a random 6-digit code in Redis under the
//! email address with a 3 minute expiry, then hands the code to the email
//! sender on a background task. Verification compares the submitted code
//! against the cached one; the cache's own expiry is the only cleanup.

pub mod api;
pub mod auth;
pub mod cli;
pub mod otp;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(GIT_COMMIT_HASH.len() >= 7);
    }
}
