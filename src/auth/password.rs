//! Password hashing with bcrypt.
//!
//! Hashes embed algorithm, cost and salt in the usual 60-character modular
//! format, so two hashes of the same plaintext differ and equality is only
//! meaningful through [`verify_password`]. bcrypt is CPU-bound, so both
//! operations run on the blocking thread pool.

use anyhow::{Context, Result};
use bcrypt::DEFAULT_COST;
use tracing::debug;

/// Cost factor used for newly stored hashes.
pub const BCRYPT_COST: u32 = DEFAULT_COST;

/// Hash `plaintext` with a random salt at [`BCRYPT_COST`].
///
/// # Errors
/// Returns an error if the hashing task fails; valid UTF-8 input under the
/// 72-byte bcrypt limit always hashes.
pub async fn hash_password(plaintext: &str) -> Result<String> {
    let plaintext = plaintext.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, BCRYPT_COST))
        .await
        .context("password hashing task failed")?
        .context("failed to hash password")
}

/// Check `plaintext` against a stored hash.
///
/// Mismatches and malformed stored hashes both yield `false`; a stored value
/// that bcrypt cannot parse is treated as no-match rather than an error so
/// that attacker-controlled input can never fault the login path.
pub async fn verify_password(plaintext: &str, stored_hash: &str) -> bool {
    let plaintext = plaintext.to_string();
    let stored_hash = stored_hash.to_string();

    let outcome =
        tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &stored_hash)).await;

    match outcome {
        Ok(Ok(matched)) => matched,
        Ok(Err(err)) => {
            debug!("stored hash did not parse as bcrypt: {err}");
            false
        }
        Err(err) => {
            debug!("password verification task failed: {err}");
            false
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // Tests hash at the minimum cost to keep them fast; the verify path is
    // identical since the cost is read back from the stored hash.
    async fn cheap_hash(plaintext: &str) -> String {
        let plaintext = plaintext.to_string();
        tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, 4))
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn hash_then_verify() {
        let hash = cheap_hash("test-pw").await;
        assert!(hash.starts_with("$2"));
        assert!(verify_password("test-pw", &hash).await);
        assert!(!verify_password("wrong-pw", &hash).await);
    }

    #[tokio::test]
    async fn same_plaintext_different_hashes() {
        let first = cheap_hash("test-pw").await;
        let second = cheap_hash("test-pw").await;
        assert_ne!(first, second, "salts must differ across calls");
        assert!(verify_password("test-pw", &first).await);
        assert!(verify_password("test-pw", &second).await);
    }

    #[tokio::test]
    async fn malformed_hash_is_no_match() {
        assert!(!verify_password("test-pw", "").await);
        assert!(!verify_password("test-pw", "not-a-bcrypt-hash").await);
        assert!(!verify_password("test-pw", "$2b$im$broken").await);
    }

    #[tokio::test]
    async fn default_cost_hash_verifies() {
        let hash = hash_password("test-pw").await.unwrap();
        assert!(verify_password("test-pw", &hash).await);
    }
}
