//! Request ID handling.
//!
//! A UUID v4 id is attached as early as possible so every admission event
//! and downstream log line can be correlated; an id supplied by the client
//! is kept.

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

pub async fn propagate_request_id(mut request: Request<Body>, next: Next) -> Response {
    let id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    if let Ok(value) = HeaderValue::from_str(&id) {
        request.headers_mut().insert(X_REQUEST_ID, value.clone());
        let mut response = next.run(request).await;
        response.headers_mut().insert(X_REQUEST_ID, value);
        response
    } else {
        next.run(request).await
    }
}
