//! One-time passwords for email ownership checks.
//!
//! A code is a uniformly random 6-digit integer stored under the email address
//! with a 3 minute expiry. Redis enforces the expiry (`SETEX`); re-issuing for
//! the same email simply overwrites the previous code, so at most one code is
//! live per address. Validation is a plain string comparison against the cached
//! value and deliberately does not consume the code: a correct code keeps
//! validating until it expires or is overwritten, matching the upstream
//! behavior this service preserves.
//!
//! Store failures surface as errors, not as "wrong code", so callers can tell
//! an unreachable cache apart from a failed validation.

use anyhow::{Context, Result};
use rand::Rng;
use redis::{aio::ConnectionManager, AsyncCommands};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Codes live for 3 minutes.
pub const OTP_TTL: Duration = Duration::from_secs(3 * 60);

/// Inclusive code range; 6 digits, never zero-prefixed.
pub const OTP_MIN: u32 = 100_000;
pub const OTP_MAX: u32 = 999_999;

/// Expiring key-value store for OTP codes.
///
/// Redis in deployments; the in-memory map backs local development and tests
/// with the same overwrite-and-expire semantics.
pub enum OtpStore {
    Redis(ConnectionManager),
    Memory(MemoryOtpStore),
    /// Store whose operations always fail, standing in for an unreachable
    /// cache when exercising error paths.
    #[cfg(test)]
    Unavailable,
}

impl OtpStore {
    /// Connect to Redis and wrap the multiplexed connection manager.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the initial connection fails.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).context("invalid Redis URL")?;
        let manager = client
            .get_connection_manager()
            .await
            .context("failed to connect to Redis")?;
        Ok(Self::Redis(manager))
    }

    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(MemoryOtpStore::new())
    }

    async fn get(&self, email: &str) -> Result<Option<String>> {
        match self {
            Self::Redis(manager) => {
                let mut conn = manager.clone();
                conn.get(email).await.context("failed to read OTP from Redis")
            }
            Self::Memory(store) => Ok(store.get(email).await),
            #[cfg(test)]
            Self::Unavailable => Err(anyhow::anyhow!("OTP store unavailable")),
        }
    }

    async fn set_with_expiry(&self, email: &str, code: &str, ttl: Duration) -> Result<()> {
        match self {
            Self::Redis(manager) => {
                let mut conn = manager.clone();
                conn.set_ex(email, code, ttl.as_secs())
                    .await
                    .context("failed to store OTP in Redis")
            }
            Self::Memory(store) => {
                store.set(email, code, ttl).await;
                Ok(())
            }
            #[cfg(test)]
            Self::Unavailable => Err(anyhow::anyhow!("OTP store unavailable")),
        }
    }
}

/// Mutexed TTL map; entries are pruned whenever the map is touched.
pub struct MemoryOtpStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryOtpStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    async fn get(&self, email: &str) -> Option<String> {
        let mut entries = self.entries.lock().await;
        entries.retain(|_, (_, expires_at)| *expires_at > Instant::now());
        entries.get(email).map(|(code, _)| code.clone())
    }

    async fn set(&self, email: &str, code: &str, ttl: Duration) {
        let mut entries = self.entries.lock().await;
        entries.retain(|_, (_, expires_at)| *expires_at > Instant::now());
        entries.insert(email.to_string(), (code.to_string(), Instant::now() + ttl));
    }
}

impl Default for MemoryOtpStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Issues and validates OTP codes keyed by email.
pub struct OtpService {
    store: OtpStore,
    ttl: Duration,
}

impl OtpService {
    #[must_use]
    pub fn new(store: OtpStore) -> Self {
        Self {
            store,
            ttl: OTP_TTL,
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Whether a live (unexpired) code exists for `email`.
    ///
    /// # Errors
    /// Returns an error if the store is unreachable.
    pub async fn exists(&self, email: &str) -> Result<bool> {
        Ok(self.store.get(email).await?.is_some())
    }

    /// Generate, store and return a fresh code for `email`.
    ///
    /// Overwrites any live code for the same address; the check-then-issue
    /// sequence at the call site is not atomic, so two concurrent requests for
    /// one email race with last-write-wins.
    ///
    /// # Errors
    /// Returns an error if the store is unreachable.
    pub async fn issue(&self, email: &str) -> Result<u32> {
        let code: u32 = rand::thread_rng().gen_range(OTP_MIN..=OTP_MAX);
        self.store
            .set_with_expiry(email, &code.to_string(), self.ttl)
            .await?;
        Ok(code)
    }

    /// Whether `code` matches the live code for `email`.
    ///
    /// `false` when no code is stored (expired or never issued) or on
    /// mismatch. Does not delete the code on success.
    ///
    /// # Errors
    /// Returns an error if the store is unreachable.
    pub async fn validate(&self, email: &str, code: u32) -> Result<bool> {
        match self.store.get(email).await? {
            Some(cached) => Ok(cached == code.to_string()),
            None => Ok(false),
        }
    }
}
