//! Request Admission Guard
//!
//! In-process admission control applied ahead of business handlers: a
//! sliding-window rate limiter and a rotating CSRF token store, both
//! in-memory with a periodic background sweep.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────┐
//!                  │               ADMISSION GUARD                 │
//!                  │                                               │
//!  Client Request  │  ┌─────────┐   ┌───────────────────────────┐ │
//!  ────────────────┼─▶│  http   │──▶│ middleware:               │ │
//!                  │  │ server  │   │  principal → rate_limit → │ │
//!                  │  └─────────┘   │  csrf                     │ │
//!                  │                └──────────┬────────────────┘ │
//!                  │                           │ admitted          │
//!                  │                           ▼                   │
//!                  │                 ┌──────────────────┐          │
//!                  │                 │ business handlers │          │
//!                  │                 └──────────────────┘          │
//!                  │                                               │
//!                  │  ┌────────────────────────────────────────┐  │
//!                  │  │          Cross-Cutting Concerns         │  │
//!                  │  │ ┌────────┐ ┌───────────┐ ┌───────────┐ │  │
//!                  │  │ │ config │ │ lifecycle │ │observabil-│ │  │
//!                  │  │ │        │ │ + sweep   │ │ity        │ │  │
//!                  │  │ └────────┘ └───────────┘ └───────────┘ │  │
//!                  │  └────────────────────────────────────────┘  │
//!                  └──────────────────────────────────────────────┘
//! ```

pub mod admission;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::GuardConfig;
pub use error::GuardError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
