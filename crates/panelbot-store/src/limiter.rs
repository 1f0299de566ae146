//! The rate-limiter capability.
//!
//! Abstracted as an injected capability so a multi-instance deployment can
//! swap in a shared external counter without touching the authorization
//! chain. The shipped implementation is an in-memory sliding window and is
//! explicitly not safe across multiple process instances.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Injected rate-limiting capability.
///
/// `try_acquire` consumes one slot for `key` if fewer than `limit` slots
/// were consumed within the trailing `window`; otherwise it returns the
/// time until the oldest slot expires.
pub trait RateLimiter: Send + Sync {
    fn try_acquire(&self, key: &str, limit: u32, window: Duration) -> Result<(), Duration>;
}

/// In-memory sliding-window limiter for a single process instance.
pub struct SlidingWindowLimiter {
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new() -> Self {
        Self {
            hits: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for SlidingWindowLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter for SlidingWindowLimiter {
    fn try_acquire(&self, key: &str, limit: u32, window: Duration) -> Result<(), Duration> {
        let now = Instant::now();
        let mut hits = self.hits.lock().expect("limiter lock poisoned");
        let entry = hits.entry(key.to_string()).or_default();

        // Drop hits that left the window.
        while let Some(front) = entry.front() {
            if now.duration_since(*front) >= window {
                entry.pop_front();
            } else {
                break;
            }
        }

        if entry.len() < limit as usize {
            entry.push_back(now);
            Ok(())
        } else {
            let oldest = *entry.front().expect("non-empty at limit");
            let retry_after = window.saturating_sub(now.duration_since(oldest));
            Err(retry_after.max(Duration::from_secs(1)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_limit_within_window() {
        let limiter = SlidingWindowLimiter::new();
        let window = Duration::from_secs(60);
        for i in 0..5 {
            assert!(
                limiter.try_acquire("sender-1", 5, window).is_ok(),
                "hit {i} should be within the limit"
            );
        }
        let retry = limiter.try_acquire("sender-1", 5, window).unwrap_err();
        assert!(retry >= Duration::from_secs(1));
        assert!(retry <= window);
    }

    #[test]
    fn keys_are_independent() {
        let limiter = SlidingWindowLimiter::new();
        let window = Duration::from_secs(60);
        for _ in 0..3 {
            limiter.try_acquire("sender-a", 3, window).unwrap();
        }
        assert!(limiter.try_acquire("sender-a", 3, window).is_err());
        assert!(limiter.try_acquire("sender-b", 3, window).is_ok());
    }

    #[test]
    fn window_slides() {
        let limiter = SlidingWindowLimiter::new();
        let window = Duration::from_millis(50);
        limiter.try_acquire("k", 1, window).unwrap();
        assert!(limiter.try_acquire("k", 1, window).is_err());
        std::thread::sleep(Duration::from_millis(60));
        assert!(limiter.try_acquire("k", 1, window).is_ok());
    }
}
