//! Principal resolution middleware.
//!
//! Identity is owned by an upstream authentication layer; this middleware
//! only surfaces its result. When the `x-principal-id` header is present
//! the value becomes the request's `Principal` extension, which the guards
//! key on instead of the client address.

use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::Response,
};

/// Context attached to authenticated requests.
#[derive(Clone, Debug)]
pub struct Principal {
    pub id: String,
}

pub const X_PRINCIPAL_ID: &str = "x-principal-id";

pub async fn principal_middleware(mut request: Request<Body>, next: Next) -> Response {
    if let Some(id) = request
        .headers()
        .get(X_PRINCIPAL_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    {
        let principal = Principal { id: id.to_string() };
        request.extensions_mut().insert(principal);
    }
    next.run(request).await
}
