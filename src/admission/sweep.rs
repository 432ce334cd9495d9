//! Periodic eviction of stale admission state.
//!
//! # Responsibilities
//! - Run on a fixed interval, independent of request traffic
//! - Prune every limiter and the CSRF store in one pass
//! - Stop when the shutdown signal fires
//!
//! # Design Decisions
//! - The sweep is a cancellable task owned by the server lifecycle, not an
//!   ambient global timer; tests call `sweep_once` synchronously
//! - Each per-store prune uses the same lock as the request path, so a
//!   sweep can never corrupt an in-flight admission check

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;

use crate::admission::csrf::CsrfStore;
use crate::admission::rate_limit::SlidingWindowLimiter;
use crate::observability::metrics;

/// Recurring eviction task over all admission stores.
pub struct Sweeper {
    limiters: Vec<Arc<SlidingWindowLimiter>>,
    csrf: Arc<CsrfStore>,
    interval: Duration,
    retention: Duration,
}

impl Sweeper {
    pub fn new(
        limiters: Vec<Arc<SlidingWindowLimiter>>,
        csrf: Arc<CsrfStore>,
        interval: Duration,
        retention: Duration,
    ) -> Self {
        Self {
            limiters,
            csrf,
            interval,
            retention,
        }
    }

    /// One synchronous sweep step over every store.
    pub fn sweep_once(&self, now: Instant) {
        let mut window_evictions = 0usize;
        for limiter in &self.limiters {
            match limiter.sweep(now, self.retention) {
                Ok(evicted) => {
                    window_evictions += evicted;
                    if let Ok(keys) = limiter.tracked_keys() {
                        metrics::record_tracked_keys(&limiter.policy().name, keys);
                    }
                }
                Err(e) => {
                    tracing::error!(profile = %limiter.policy().name, error = %e, "Limiter sweep failed");
                }
            }
        }

        let token_evictions = match self.csrf.sweep(now) {
            Ok(evicted) => evicted,
            Err(e) => {
                tracing::error!(error = %e, "CSRF sweep failed");
                0
            }
        };

        metrics::record_sweep(window_evictions, token_evictions);
        if window_evictions > 0 || token_evictions > 0 {
            tracing::debug!(
                window_evictions,
                token_evictions,
                "Sweep evicted stale admission state"
            );
        }
    }

    /// Run until the shutdown signal fires.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // the first tick completes immediately; harmless against empty stores
        loop {
            tokio::select! {
                _ = ticker.tick() => self.sweep_once(Instant::now()),
                _ = shutdown.recv() => {
                    tracing::debug!("Sweeper stopping");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::rate_limit::RateLimitPolicy;

    #[test]
    fn sweep_once_prunes_all_stores() {
        let limiter = Arc::new(SlidingWindowLimiter::new(RateLimitPolicy {
            name: "general".to_string(),
            window: Duration::from_millis(1000),
            max_requests: 10,
        }));
        let csrf = Arc::new(CsrfStore::new(Duration::from_millis(1000)));
        let t0 = Instant::now();

        limiter.admit("stale", t0).unwrap();
        csrf.issue("stale", t0).unwrap();

        let sweeper = Sweeper::new(
            vec![limiter.clone()],
            csrf.clone(),
            Duration::from_secs(60),
            Duration::from_millis(2000),
        );
        sweeper.sweep_once(t0 + Duration::from_millis(2500));

        assert_eq!(limiter.tracked_keys().unwrap(), 0);
        assert_eq!(csrf.tracked_keys().unwrap(), 0);
    }

    #[tokio::test]
    async fn run_stops_on_shutdown_signal() {
        let limiter = Arc::new(SlidingWindowLimiter::new(RateLimitPolicy {
            name: "general".to_string(),
            window: Duration::from_millis(1000),
            max_requests: 10,
        }));
        let csrf = Arc::new(CsrfStore::new(Duration::from_millis(1000)));
        let sweeper = Sweeper::new(
            vec![limiter],
            csrf,
            Duration::from_millis(10),
            Duration::from_millis(2000),
        );

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(sweeper.run(rx));
        tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper did not stop after shutdown")
            .unwrap();
    }
}
