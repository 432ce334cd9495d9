//! Rejection taxonomy for the admission guard.
//!
//! Every variant is a terminal gate: it short-circuits the request with a
//! structured JSON body carrying a stable machine-readable code. Nothing
//! internal (stored tokens, other keys' counts) appears in a response.

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GuardError {
    /// Over the configured ceiling. Recoverable after `retry_after_secs`.
    #[error("rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited {
        limit: u32,
        retry_after_secs: u64,
    },

    /// No token supplied on a state-mutating request.
    #[error("CSRF token missing")]
    CsrfMissing,

    /// Supplied token does not match any live token for this session.
    #[error("CSRF token invalid")]
    CsrfInvalid,

    /// Token aged past its TTL; the caller must fetch a fresh one.
    #[error("CSRF token expired")]
    CsrfExpired,

    /// Store fault. The request fails closed.
    #[error("internal admission error")]
    Internal,
}

impl GuardError {
    /// Stable error code surfaced to clients.
    pub fn code(&self) -> &'static str {
        match self {
            GuardError::RateLimited { .. } => "rate_limited",
            GuardError::CsrfMissing => "csrf_missing",
            GuardError::CsrfInvalid => "csrf_invalid",
            GuardError::CsrfExpired => "csrf_expired",
            GuardError::Internal => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GuardError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GuardError::CsrfMissing | GuardError::CsrfInvalid | GuardError::CsrfExpired => {
                StatusCode::FORBIDDEN
            }
            GuardError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.code(),
            "message": self.to_string(),
        });

        let mut response = Response::new(Body::from(body.to_string()));
        *response.status_mut() = self.status();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        if let GuardError::RateLimited {
            limit,
            retry_after_secs,
        } = self
        {
            let headers = response.headers_mut();
            headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
            headers.insert("x-ratelimit-limit", HeaderValue::from(limit));
            headers.insert("x-ratelimit-remaining", HeaderValue::from(0u32));
            headers.insert("x-ratelimit-reset", HeaderValue::from(retry_after_secs));
        }

        response
    }
}
