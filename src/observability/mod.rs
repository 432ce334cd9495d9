//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Admission checks and sweeps produce:
//!     → tracing events (structured fields: client, profile, path)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout via tracing-subscriber, set up in main)
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod metrics;
