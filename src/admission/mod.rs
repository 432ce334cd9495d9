//! Admission control subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (sliding-window check per client key)
//!     → csrf.rs (token verification for state-mutating methods)
//!     → Pass to business handlers
//!
//! Independent of request traffic:
//!     sweep.rs (periodic eviction of stale windows and tokens)
//! ```
//!
//! # Design Decisions
//! - Fail closed: an internal store fault rejects the request
//! - Check-and-update runs under one lock with no await point, so two
//!   concurrent requests for the same key can never both observe a stale
//!   count
//! - Stores take an explicit `Instant` so tests never need real timers
//!
//! # Known Limitation
//! All state is per-process memory. Running multiple instances behind a
//! load balancer multiplies the effective rate limit by the instance count,
//! and a CSRF token issued by one instance cannot be verified by another.
//! Fixing that requires a shared external store, which this component does
//! not attempt.

pub mod csrf;
pub mod rate_limit;
pub mod sweep;

use thiserror::Error;

/// Internal store fault. Only produced when a lock holder panicked and
/// poisoned the store; callers must treat it as a rejection.
#[derive(Debug, Error)]
#[error("admission store lock poisoned")]
pub struct StoreError;
