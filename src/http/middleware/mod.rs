//! Guard middlewares applied ahead of business handlers.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → principal.rs (resolve authenticated principal, if any)
//!     → rate_limit.rs (sliding-window admission per client key)
//!     → csrf.rs (token verification for state-mutating methods)
//!     → Pass to business handlers
//! ```
//!
//! # Design Decisions
//! - Both gates are terminal: on failure they short-circuit with a
//!   structured error response and never let the request proceed
//! - The client key is the authenticated principal id when present,
//!   else the client socket address

pub mod csrf;
pub mod principal;
pub mod rate_limit;

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::Request;

use crate::http::middleware::principal::Principal;

/// Derive the admission key for a request.
pub(crate) fn client_key(request: &Request<Body>, addr: SocketAddr) -> String {
    match request.extensions().get::<Principal>() {
        Some(principal) => principal.id.clone(),
        None => addr.ip().to_string(),
    }
}
