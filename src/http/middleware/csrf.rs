//! CSRF verification middleware.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderName, HeaderValue, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::admission::csrf::Verification;
use crate::config::CsrfConfig;
use crate::error::GuardError;
use crate::http::middleware::client_key;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Which requests need a token, and where the token travels.
pub struct CsrfPolicy {
    header: HeaderName,
    exempt_paths: Vec<String>,
}

impl CsrfPolicy {
    /// Config validation already rejected unparsable header names; the
    /// fallback here only covers a policy built without validation.
    pub fn from_config(config: &CsrfConfig) -> Self {
        let header = HeaderName::from_bytes(config.header_name.as_bytes())
            .unwrap_or(HeaderName::from_static("x-csrf-token"));
        Self {
            header,
            exempt_paths: config.exempt_paths.clone(),
        }
    }

    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    /// Verification applies to state-mutating methods only; safe methods
    /// and configured entry points (login, registration, bootstrap) bypass.
    pub fn requires_verification(&self, method: &Method, path: &str) -> bool {
        let mutating = matches!(method.as_str(), "POST" | "PUT" | "PATCH" | "DELETE");
        mutating && !self.exempt_paths.iter().any(|p| path.starts_with(p))
    }
}

pub async fn csrf_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let policy = &state.csrf_policy;
    if !policy.requires_verification(request.method(), request.uri().path()) {
        return next.run(request).await;
    }

    let key = client_key(&request, addr);
    let supplied = request
        .headers()
        .get(policy.header())
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    // Verification (including expiry deletion and rotation) completes
    // synchronously before the request is handed downstream.
    let outcome = match state.csrf.verify(&key, supplied.as_deref(), Instant::now()) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(client = %key, error = %e, "CSRF store failure");
            metrics::record_rejected("internal");
            return GuardError::Internal.into_response();
        }
    };

    let rotated = match outcome {
        Verification::Valid { rotated } => rotated,
        Verification::Missing => {
            tracing::warn!(client = %key, "CSRF token missing");
            metrics::record_rejected("csrf_missing");
            return GuardError::CsrfMissing.into_response();
        }
        Verification::NoStoredToken | Verification::Mismatch => {
            tracing::warn!(client = %key, "CSRF token invalid");
            metrics::record_rejected("csrf_invalid");
            return GuardError::CsrfInvalid.into_response();
        }
        Verification::Expired => {
            tracing::warn!(client = %key, "CSRF token expired");
            metrics::record_rejected("csrf_expired");
            return GuardError::CsrfExpired.into_response();
        }
    };

    let mut response = next.run(request).await;

    // Surface the rotated token for the caller's next round-trip.
    match HeaderValue::from_str(&rotated) {
        Ok(value) => {
            response.headers_mut().insert(policy.header().clone(), value);
        }
        Err(e) => {
            tracing::error!(error = %e, "Rotated token is not a valid header value");
        }
    }
    response
}
