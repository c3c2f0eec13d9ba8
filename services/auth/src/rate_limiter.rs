//! Login throttling to slow down credential brute forcing
//!
//! Failed login attempts are counted per key (username or client address)
//! inside a sliding window; crossing the limit bans the key for a fixed
//! duration. Successful logins reset the counter.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

/// Login limiter configuration
#[derive(Debug, Clone)]
pub struct LoginLimiterConfig {
    /// Failed attempts tolerated inside one window
    pub max_failures: u32,
    /// Window length in seconds
    pub window_seconds: u64,
    /// Ban duration in seconds once the limit is crossed
    pub ban_duration_seconds: u64,
}

impl Default for LoginLimiterConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            window_seconds: 300,
            ban_duration_seconds: 3600,
        }
    }
}

#[derive(Debug)]
struct LimiterEntry {
    failures: u32,
    window_start: Instant,
    banned_until: Option<Instant>,
}

/// Per-key login throttle
#[derive(Debug, Clone)]
pub struct LoginLimiter {
    config: LoginLimiterConfig,
    entries: Arc<Mutex<HashMap<String, LimiterEntry>>>,
}

impl LoginLimiter {
    /// Create a new login limiter
    pub fn new(config: LoginLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Check whether a login attempt for this key may proceed
    pub async fn is_allowed(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let Some(entry) = entries.get_mut(key) else {
            return true;
        };

        if let Some(banned_until) = entry.banned_until {
            if now < banned_until {
                return false;
            }
            entry.failures = 0;
            entry.banned_until = None;
        }

        if now.duration_since(entry.window_start) >= Duration::from_secs(self.config.window_seconds)
        {
            entry.failures = 0;
            entry.window_start = now;
        }

        true
    }

    /// Record a failed login attempt; bans the key once the limit is hit
    pub async fn record_failure(&self, key: &str) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let entry = entries.entry(key.to_string()).or_insert(LimiterEntry {
            failures: 0,
            window_start: now,
            banned_until: None,
        });

        if now.duration_since(entry.window_start) >= Duration::from_secs(self.config.window_seconds)
        {
            entry.failures = 0;
            entry.window_start = now;
        }

        entry.failures += 1;

        if entry.failures >= self.config.max_failures {
            entry.banned_until = Some(now + Duration::from_secs(self.config.ban_duration_seconds));
            warn!(
                "Banned login key {} for {} seconds",
                key, self.config.ban_duration_seconds
            );
        }
    }

    /// Reset the counter after a successful login
    pub async fn reset(&self, key: &str) {
        let mut entries = self.entries.lock().await;
        entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_limiter() -> LoginLimiter {
        LoginLimiter::new(LoginLimiterConfig {
            max_failures: 3,
            window_seconds: 300,
            ban_duration_seconds: 3600,
        })
    }

    #[tokio::test]
    async fn test_allows_until_limit() {
        let limiter = small_limiter();

        for _ in 0..2 {
            assert!(limiter.is_allowed("alice").await);
            limiter.record_failure("alice").await;
        }
        assert!(limiter.is_allowed("alice").await);
    }

    #[tokio::test]
    async fn test_bans_after_limit() {
        let limiter = small_limiter();

        for _ in 0..3 {
            limiter.record_failure("alice").await;
        }
        assert!(!limiter.is_allowed("alice").await);
        // Other keys are unaffected
        assert!(limiter.is_allowed("bob").await);
    }

    #[tokio::test]
    async fn test_reset_clears_failures() {
        let limiter = small_limiter();

        limiter.record_failure("alice").await;
        limiter.record_failure("alice").await;
        limiter.reset("alice").await;

        for _ in 0..2 {
            limiter.record_failure("alice").await;
        }
        assert!(limiter.is_allowed("alice").await);
    }
}
