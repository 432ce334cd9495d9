//! Rate limiting middleware.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::GuardError;
use crate::http::middleware::client_key;
use crate::http::server::AppState;
use crate::observability::metrics;

pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let key = client_key(&request, addr);
    let path = request.uri().path().to_string();
    let limiter = state.select_limiter(&path);
    let profile = limiter.policy().name.clone();

    // Check-and-record happens here, before any await: two concurrent
    // requests for the same key cannot both claim the last slot.
    let now = Instant::now();
    let decision = match limiter.admit(&key, now) {
        Ok(decision) => decision,
        Err(e) => {
            tracing::error!(client = %key, profile = %profile, error = %e, "Admission store failure");
            metrics::record_rejected("internal");
            return GuardError::Internal.into_response();
        }
    };

    let reset_after = decision.reset_at.saturating_duration_since(now);
    let reset_secs = reset_after.as_secs() + u64::from(reset_after.subsec_nanos() > 0);

    if !decision.allowed {
        tracing::warn!(client = %key, profile = %profile, path = %path, "Rate limit exceeded");
        metrics::record_rejected("rate_limited");
        return GuardError::RateLimited {
            limit: decision.limit,
            retry_after_secs: reset_secs,
        }
        .into_response();
    }

    metrics::record_admitted(&profile);
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from(decision.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(decision.remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(reset_secs));
    response
}
