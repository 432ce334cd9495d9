//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the guarded routes
//! - Wire up middleware (request ID, tracing, timeout, principal, guards)
//! - Build limiter instances from configured profiles
//! - Spawn the background sweeper
//! - Serve until the shutdown signal fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admission::csrf::CsrfStore;
use crate::admission::rate_limit::{RateLimitPolicy, SlidingWindowLimiter};
use crate::admission::sweep::Sweeper;
use crate::config::GuardConfig;
use crate::error::GuardError;
use crate::http::middleware::csrf::{csrf_middleware, CsrfPolicy};
use crate::http::middleware::principal::principal_middleware;
use crate::http::middleware::rate_limit::rate_limit_middleware;
use crate::http::middleware::client_key;
use crate::http::request::propagate_request_id;

/// One configured limiter and the path prefixes it covers.
pub struct ProfileLimiter {
    prefixes: Vec<String>,
    limiter: Arc<SlidingWindowLimiter>,
}

/// Application state injected into handlers and guard middleware.
#[derive(Clone)]
pub struct AppState {
    pub limiters: Arc<Vec<ProfileLimiter>>,
    pub csrf: Arc<CsrfStore>,
    pub csrf_policy: Arc<CsrfPolicy>,
}

impl AppState {
    /// Pick the limiter whose longest path prefix matches; a profile with
    /// no prefixes matches everything. Falls back to the first profile
    /// when nothing matches (validation guarantees one exists).
    pub fn select_limiter(&self, path: &str) -> &SlidingWindowLimiter {
        let mut best: Option<(usize, &ProfileLimiter)> = None;
        for entry in self.limiters.iter() {
            let score = if entry.prefixes.is_empty() {
                Some(0)
            } else {
                entry
                    .prefixes
                    .iter()
                    .filter(|p| path.starts_with(p.as_str()))
                    .map(|p| p.len())
                    .max()
            };
            if let Some(score) = score {
                if best.map_or(true, |(b, _)| score > b) {
                    best = Some((score, entry));
                }
            }
        }
        match best {
            Some((_, entry)) => &entry.limiter,
            None => &self.limiters[0].limiter,
        }
    }
}

/// HTTP server fronting business routes with the admission guard.
pub struct HttpServer {
    router: Router,
    state: AppState,
    config: GuardConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GuardConfig) -> Self {
        let limiters: Vec<ProfileLimiter> = config
            .rate_limit
            .profiles
            .iter()
            .map(|profile| ProfileLimiter {
                prefixes: profile.path_prefixes.clone(),
                limiter: Arc::new(SlidingWindowLimiter::new(RateLimitPolicy {
                    name: profile.name.clone(),
                    window: Duration::from_millis(profile.window_ms),
                    max_requests: profile.max_requests,
                })),
            })
            .collect();

        let state = AppState {
            limiters: Arc::new(limiters),
            csrf: Arc::new(CsrfStore::new(Duration::from_secs(config.csrf.ttl_secs))),
            csrf_policy: Arc::new(CsrfPolicy::from_config(&config.csrf)),
        };

        let router = Self::build_router(&config, state.clone());
        Self {
            router,
            state,
            config,
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers run outermost-last: request ID → trace → timeout →
    /// principal → rate limit → CSRF → handler.
    fn build_router(config: &GuardConfig, state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/csrf/token", get(issue_token_handler))
            .route("/auth/login", post(login_handler))
            .route("/api/echo", post(echo_handler))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                csrf_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                rate_limit_middleware,
            ))
            .layer(middleware::from_fn(principal_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(propagate_request_id))
            .with_state(state)
    }

    /// Run the server, accepting connections on the given listener, until
    /// the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        // Sweeper shares the shutdown signal with the serve loop
        let sweeper = Sweeper::new(
            self.state.limiters.iter().map(|e| e.limiter.clone()).collect(),
            self.state.csrf.clone(),
            Duration::from_secs(self.config.sweep.interval_secs),
            Duration::from_secs(self.config.sweep.retention_secs),
        );
        tokio::spawn(sweeper.run(shutdown.resubscribe()));

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Bootstrap route: issues the caller's initial CSRF token. Subsequent
/// tokens arrive via rotation on each verified mutating request.
async fn issue_token_handler(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
    request: Request<Body>,
) -> Response {
    let key = client_key(&request, addr);
    match state.csrf.issue(&key, Instant::now()) {
        Ok(token) => Json(json!({ "token": token })).into_response(),
        Err(e) => {
            tracing::error!(client = %key, error = %e, "CSRF store failure");
            GuardError::Internal.into_response()
        }
    }
}

/// Stand-in for the upstream authentication layer's login entry point;
/// exempt from CSRF because it predates having a session.
async fn login_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Demo business handler behind both guards.
async fn echo_handler(Json(body): Json<Value>) -> Json<Value> {
    Json(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimitProfileConfig;

    fn state_with_profiles(profiles: Vec<RateLimitProfileConfig>) -> AppState {
        let mut config = GuardConfig::default();
        config.rate_limit.profiles = profiles;
        HttpServer::new(config).state
    }

    #[test]
    fn longest_matching_prefix_wins() {
        let state = state_with_profiles(vec![
            RateLimitProfileConfig {
                name: "general".to_string(),
                window_ms: 1000,
                max_requests: 100,
                path_prefixes: Vec::new(),
            },
            RateLimitProfileConfig {
                name: "api".to_string(),
                window_ms: 1000,
                max_requests: 50,
                path_prefixes: vec!["/api".to_string()],
            },
            RateLimitProfileConfig {
                name: "compute".to_string(),
                window_ms: 1000,
                max_requests: 5,
                path_prefixes: vec!["/api/compute".to_string()],
            },
        ]);

        assert_eq!(state.select_limiter("/health").policy().name, "general");
        assert_eq!(state.select_limiter("/api/items").policy().name, "api");
        assert_eq!(
            state.select_limiter("/api/compute/run").policy().name,
            "compute"
        );
    }

    #[test]
    fn unmatched_path_without_catch_all_falls_back_to_first_profile() {
        let state = state_with_profiles(vec![RateLimitProfileConfig {
            name: "auth".to_string(),
            window_ms: 1000,
            max_requests: 10,
            path_prefixes: vec!["/auth".to_string()],
        }]);

        assert_eq!(state.select_limiter("/other").policy().name, "auth");
    }
}
