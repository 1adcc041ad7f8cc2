//! Login throttling against password guessing

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Attempts allowed inside one window
    pub max_attempts: u32,
    /// Window length
    pub window: Duration,
    /// How long a key stays blocked once it runs out of attempts
    pub ban_duration: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::from_secs(300),
            ban_duration: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug)]
struct Entry {
    attempts: u32,
    window_start: Instant,
    banned_until: Option<Instant>,
}

impl Entry {
    /// Neither the window nor a ban is still running
    fn is_stale(&self, now: Instant, window: Duration) -> bool {
        self.banned_until.is_none_or(|until| now >= until)
            && now.duration_since(self.window_start) >= window
    }
}

/// Per-key attempt counter, keyed by normalized email
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record an attempt for `key`; false when the key is over its budget
    pub async fn try_acquire(&self, key: &str) -> bool {
        self.try_acquire_at(key, Instant::now()).await
    }

    async fn try_acquire_at(&self, key: &str, now: Instant) -> bool {
        let mut entries = self.entries.lock().await;

        // Keys that never log in successfully would otherwise stay forever.
        let window = self.config.window;
        entries.retain(|_, entry| !entry.is_stale(now, window));

        let entry = entries.entry(key.to_string()).or_insert(Entry {
            attempts: 0,
            window_start: now,
            banned_until: None,
        });

        if let Some(until) = entry.banned_until {
            if now < until {
                return false;
            }
            entry.banned_until = None;
            entry.attempts = 0;
            entry.window_start = now;
        }

        if now.duration_since(entry.window_start) >= self.config.window {
            entry.attempts = 0;
            entry.window_start = now;
        }

        if entry.attempts >= self.config.max_attempts {
            entry.banned_until = Some(now + self.config.ban_duration);
            warn!(
                "Login attempts blocked for {} seconds",
                self.config.ban_duration.as_secs()
            );
            return false;
        }

        entry.attempts += 1;
        true
    }

    /// Forget the history of `key`, typically after a successful login
    pub async fn reset(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    /// Number of keys currently tracked
    pub async fn tracked_keys(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Get the rate limiter configuration
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }
}
