//! Rate limiter for login attempts
//!
//! Failed logins are counted per username (case-insensitive) inside a
//! sliding window; once the limit is reached further attempts are refused
//! without calling the content API.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Failed attempts allowed inside the window
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

/// Window length in minutes
pub const DEFAULT_WINDOW_MINUTES: i64 = 15;

/// Login rate limiter
#[derive(Clone)]
pub struct LoginRateLimiter {
    /// Failed login attempts by lower-cased username
    attempts: Arc<RwLock<HashMap<String, Vec<DateTime<Utc>>>>>,
    max_attempts: usize,
    window: Duration,
}

impl LoginRateLimiter {
    /// 5 failed attempts per 15 minutes
    pub fn new() -> Self {
        Self::with_policy(DEFAULT_MAX_ATTEMPTS, Duration::minutes(DEFAULT_WINDOW_MINUTES))
    }

    pub fn with_policy(max_attempts: usize, window: Duration) -> Self {
        Self {
            attempts: Arc::new(RwLock::new(HashMap::new())),
            max_attempts,
            window,
        }
    }

    /// Whether the username has used up its failed attempts
    pub async fn is_limited(&self, username: &str) -> bool {
        let mut attempts = self.attempts.write().await;
        let cutoff = Utc::now() - self.window;

        match attempts.get_mut(&username.to_lowercase()) {
            Some(times) => {
                times.retain(|time| *time > cutoff);
                times.len() >= self.max_attempts
            }
            None => false,
        }
    }

    /// Minutes until the oldest attempt in the window expires
    pub async fn minutes_until_reset(&self, username: &str) -> i64 {
        let attempts = self.attempts.read().await;
        let now = Utc::now();

        attempts
            .get(&username.to_lowercase())
            .and_then(|times| times.iter().min())
            .map(|oldest| {
                let remaining = (*oldest + self.window) - now;
                (remaining.num_seconds().max(0) + 59) / 60
            })
            .unwrap_or(0)
    }

    pub async fn record_failure(&self, username: &str) {
        let mut attempts = self.attempts.write().await;
        attempts
            .entry(username.to_lowercase())
            .or_default()
            .push(Utc::now());
    }

    /// Forget failures for username (on successful login)
    pub async fn clear(&self, username: &str) {
        self.attempts.write().await.remove(&username.to_lowercase());
    }

    /// Drop entries whose attempts have all left the window
    pub async fn cleanup(&self) {
        let cutoff = Utc::now() - self.window;
        let mut attempts = self.attempts.write().await;
        attempts.retain(|_, times| {
            times.retain(|time| *time > cutoff);
            !times.is_empty()
        });
    }

    pub async fn tracked_usernames(&self) -> usize {
        self.attempts.read().await.len()
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_limit_after_max_failures() {
        let limiter = LoginRateLimiter::new();

        for _ in 0..4 {
            limiter.record_failure("reader").await;
            assert!(!limiter.is_limited("reader").await);
        }

        limiter.record_failure("reader").await;
        assert!(limiter.is_limited("reader").await);
        assert!(limiter.minutes_until_reset("reader").await > 0);

        limiter.clear("reader").await;
        assert!(!limiter.is_limited("reader").await);
    }

    #[tokio::test]
    async fn test_usernames_are_case_insensitive() {
        let limiter = LoginRateLimiter::with_policy(3, Duration::minutes(15));

        limiter.record_failure("Reader").await;
        limiter.record_failure("READER").await;
        assert!(!limiter.is_limited("reader").await);

        limiter.record_failure("reader").await;
        assert!(limiter.is_limited("ReAdEr").await);
        assert!(!limiter.is_limited("someone-else").await);
    }

    #[tokio::test]
    async fn test_window_expiry_and_cleanup() {
        let limiter = LoginRateLimiter::with_policy(1, Duration::milliseconds(50));

        limiter.record_failure("reader").await;
        assert!(limiter.is_limited("reader").await);

        tokio::time::sleep(std::time::Duration::from_millis(80)).await;
        assert!(!limiter.is_limited("reader").await);

        limiter.cleanup().await;
        assert_eq!(limiter.tracked_usernames().await, 0);
    }
}
