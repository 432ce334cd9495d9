//! Sliding-window rate limiting.
//!
//! # Responsibilities
//! - Track request arrival times per client key
//! - Admit or reject based on the count inside the trailing window
//! - Evict stale windows on sweep to bound memory
//!
//! # Design Decisions
//! - Strictly sliding window, not fixed buckets: only arrivals within
//!   `window` of now are counted
//! - One `Mutex<HashMap>` per limiter; each configured profile is an
//!   independent limiter, so counts are never shared across profiles
//! - `reset_at` is the oldest surviving timestamp plus the window length

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::admission::StoreError;

/// Configuration identity of one limiter instance.
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    /// Profile name, used for logging and metric labels.
    pub name: String,

    /// Window length.
    pub window: Duration,

    /// Maximum admitted requests per key inside the window.
    pub max_requests: u32,
}

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy)]
pub struct Decision {
    pub allowed: bool,

    /// Configured ceiling, echoed for response headers.
    pub limit: u32,

    /// Slots left in the window after this request.
    pub remaining: u32,

    /// When the oldest counted arrival leaves the window.
    pub reset_at: Instant,
}

/// Per-key sliding-window request counter.
pub struct SlidingWindowLimiter {
    policy: RateLimitPolicy,
    windows: Mutex<HashMap<String, Vec<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Check and record one arrival for `key`.
    ///
    /// The read-filter-append sequence runs under a single lock acquisition
    /// with no suspension point, so concurrent arrivals on the same key
    /// serialize and cannot both claim the last slot.
    pub fn admit(&self, key: &str, now: Instant) -> Result<Decision, StoreError> {
        let mut windows = self.windows.lock().map_err(|_| StoreError)?;
        let timestamps = windows.entry(key.to_string()).or_default();

        timestamps.retain(|&t| now.duration_since(t) < self.policy.window);

        if timestamps.len() >= self.policy.max_requests as usize {
            // timestamps are in arrival order, so the front is the oldest
            let oldest = timestamps[0];
            return Ok(Decision {
                allowed: false,
                limit: self.policy.max_requests,
                remaining: 0,
                reset_at: oldest + self.policy.window,
            });
        }

        timestamps.push(now);
        let remaining = self.policy.max_requests - timestamps.len() as u32;
        let oldest = timestamps[0];

        Ok(Decision {
            allowed: true,
            limit: self.policy.max_requests,
            remaining,
            reset_at: oldest + self.policy.window,
        })
    }

    /// Drop arrivals older than `retention` and remove keys left empty.
    /// Returns the number of evicted timestamps.
    ///
    /// `retention` must be at least the configured window; config validation
    /// enforces that, so a sweep never removes a countable arrival.
    pub fn sweep(&self, now: Instant, retention: Duration) -> Result<usize, StoreError> {
        let mut windows = self.windows.lock().map_err(|_| StoreError)?;
        let before: usize = windows.values().map(Vec::len).sum();

        windows.retain(|_, timestamps| {
            timestamps.retain(|&t| now.duration_since(t) < retention);
            !timestamps.is_empty()
        });

        let after: usize = windows.values().map(Vec::len).sum();
        Ok(before - after)
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> Result<usize, StoreError> {
        Ok(self.windows.lock().map_err(|_| StoreError)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(window_ms: u64, max_requests: u32) -> SlidingWindowLimiter {
        SlidingWindowLimiter::new(RateLimitPolicy {
            name: "test".to_string(),
            window: Duration::from_millis(window_ms),
            max_requests,
        })
    }

    fn ms(base: Instant, offset: u64) -> Instant {
        base + Duration::from_millis(offset)
    }

    #[test]
    fn admits_up_to_ceiling_then_rejects_until_window_slides() {
        let limiter = limiter(1000, 3);
        let t0 = Instant::now();

        for offset in [0, 100, 200] {
            let decision = limiter.admit("c1", ms(t0, offset)).unwrap();
            assert!(decision.allowed, "arrival at t+{offset} should be admitted");
        }

        let rejected = limiter.admit("c1", ms(t0, 300)).unwrap();
        assert!(!rejected.allowed);
        assert_eq!(rejected.remaining, 0);
        // reset basis: oldest surviving arrival (t0) + window
        assert_eq!(rejected.reset_at, ms(t0, 1000));

        // t0 has left the window by t0+1050
        let admitted = limiter.admit("c1", ms(t0, 1050)).unwrap();
        assert!(admitted.allowed);
    }

    #[test]
    fn remaining_counts_down_per_admission() {
        let limiter = limiter(1000, 3);
        let t0 = Instant::now();

        assert_eq!(limiter.admit("c1", ms(t0, 0)).unwrap().remaining, 2);
        assert_eq!(limiter.admit("c1", ms(t0, 100)).unwrap().remaining, 1);
        assert_eq!(limiter.admit("c1", ms(t0, 200)).unwrap().remaining, 0);
    }

    #[test]
    fn keys_are_independent() {
        let limiter = limiter(1000, 2);
        let t0 = Instant::now();

        assert!(limiter.admit("a", ms(t0, 0)).unwrap().allowed);
        assert!(limiter.admit("a", ms(t0, 10)).unwrap().allowed);
        assert!(!limiter.admit("a", ms(t0, 20)).unwrap().allowed);

        assert!(limiter.admit("b", ms(t0, 20)).unwrap().allowed);
    }

    #[test]
    fn fully_expired_window_resets_to_single_arrival() {
        let limiter = limiter(500, 2);
        let t0 = Instant::now();

        assert!(limiter.admit("c1", ms(t0, 0)).unwrap().allowed);
        assert!(limiter.admit("c1", ms(t0, 10)).unwrap().allowed);

        // both arrivals have aged out; the key starts over
        let decision = limiter.admit("c1", ms(t0, 600)).unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 1);
        assert_eq!(decision.reset_at, ms(t0, 1100));
    }

    #[test]
    fn sweep_drops_stale_entries_and_empty_keys() {
        let limiter = limiter(1000, 10);
        let t0 = Instant::now();

        limiter.admit("old", ms(t0, 0)).unwrap();
        limiter.admit("old", ms(t0, 50)).unwrap();
        limiter.admit("fresh", ms(t0, 4900)).unwrap();
        assert_eq!(limiter.tracked_keys().unwrap(), 2);

        let evicted = limiter
            .sweep(ms(t0, 5000), Duration::from_millis(2000))
            .unwrap();
        assert_eq!(evicted, 2);
        assert_eq!(limiter.tracked_keys().unwrap(), 1);
    }

    #[test]
    fn sweep_keeps_entries_inside_retention() {
        let limiter = limiter(1000, 10);
        let t0 = Instant::now();

        limiter.admit("c1", ms(t0, 0)).unwrap();
        let evicted = limiter
            .sweep(ms(t0, 100), Duration::from_millis(2000))
            .unwrap();
        assert_eq!(evicted, 0);
        assert_eq!(limiter.tracked_keys().unwrap(), 1);
    }
}
