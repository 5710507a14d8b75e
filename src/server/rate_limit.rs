//! Sliding-window rate limiting for the API surface.
//!
//! Each route family gets its own budget, keyed by owner id. Windows are
//! tracked in memory; timestamps older than the window are pruned on every
//! check.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A simple rate limiter using a sliding window algorithm.
///
/// Tracks request timestamps per caller key to decide whether a new
/// request is allowed.
pub struct RateLimiter {
    requests: HashMap<String, Vec<Instant>>,
    limit: usize,
    window: Duration,
}

impl RateLimiter {
    /// * `limit` - requests allowed per `window`.
    /// * `window` - duration of the sliding window.
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            requests: HashMap::new(),
            limit,
            window,
        }
    }

    /// Check whether a request from `id` is allowed, recording it if so.
    pub fn check(&mut self, id: &str) -> bool {
        let now = Instant::now();
        let window_start = now - self.window;

        let client_requests = self.requests.entry(id.to_string()).or_default();
        client_requests.retain(|&timestamp| timestamp > window_start);

        if client_requests.len() < self.limit {
            client_requests.push(now);
            true
        } else {
            false
        }
    }
}

/// Per-route-family limiters shared across handlers.
pub struct RateLimits {
    process: Mutex<RateLimiter>,
    batch: Mutex<RateLimiter>,
    list: Mutex<RateLimiter>,
    health: Mutex<RateLimiter>,
}

const MINUTE: Duration = Duration::from_secs(60);

impl RateLimits {
    pub fn new() -> Self {
        Self {
            process: Mutex::new(RateLimiter::new(10, MINUTE)),
            batch: Mutex::new(RateLimiter::new(5, MINUTE)),
            list: Mutex::new(RateLimiter::new(30, MINUTE)),
            health: Mutex::new(RateLimiter::new(20, MINUTE)),
        }
    }

    pub fn allow_process(&self, key: &str) -> bool {
        check(&self.process, key)
    }

    pub fn allow_batch(&self, key: &str) -> bool {
        check(&self.batch, key)
    }

    pub fn allow_list(&self, key: &str) -> bool {
        check(&self.list, key)
    }

    pub fn allow_health(&self, key: &str) -> bool {
        check(&self.health, key)
    }
}

impl Default for RateLimits {
    fn default() -> Self {
        Self::new()
    }
}

fn check(limiter: &Mutex<RateLimiter>, key: &str) -> bool {
    match limiter.lock() {
        Ok(mut guard) => guard.check(key),
        // A poisoned lock should not take the API down.
        Err(poisoned) => poisoned.into_inner().check(key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_requests_within_limit() {
        let mut limiter = RateLimiter::new(5, Duration::from_secs(1));
        for _ in 0..5 {
            assert!(limiter.check("client1"));
        }
        assert!(!limiter.check("client1"));
    }

    #[test]
    fn keys_are_independent() {
        let mut limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check("a"));
        assert!(limiter.check("b"));
        assert!(!limiter.check("a"));
    }

    #[test]
    fn resets_after_window() {
        let mut limiter = RateLimiter::new(2, Duration::from_millis(50));
        assert!(limiter.check("client2"));
        assert!(limiter.check("client2"));
        assert!(!limiter.check("client2"));

        std::thread::sleep(Duration::from_millis(60));

        assert!(limiter.check("client2"));
    }

    #[test]
    fn route_families_have_separate_budgets() {
        let limits = RateLimits::new();
        for _ in 0..5 {
            assert!(limits.allow_batch("u"));
        }
        assert!(!limits.allow_batch("u"));
        // The process budget is untouched by batch requests.
        assert!(limits.allow_process("u"));
    }
}
