//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the guard.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the admission guard service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GuardConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Rate limiting profiles.
    pub rate_limit: RateLimitConfig,

    /// CSRF protection settings.
    pub csrf: CsrfConfig,

    /// Background sweep settings.
    pub sweep: SweepConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Rate limiting configuration.
///
/// Each profile is an independent limiter instance; counts are never shared
/// across profiles. A profile with no path prefixes is the catch-all.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Limiter profiles. Must contain at least one.
    pub profiles: Vec<RateLimitProfileConfig>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            profiles: vec![
                RateLimitProfileConfig {
                    name: "general".to_string(),
                    window_ms: 60_000,
                    max_requests: 100,
                    path_prefixes: Vec::new(),
                },
                // stricter ceiling for authentication endpoints
                RateLimitProfileConfig {
                    name: "auth".to_string(),
                    window_ms: 60_000,
                    max_requests: 10,
                    path_prefixes: vec!["/auth".to_string()],
                },
            ],
        }
    }
}

/// One limiter profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitProfileConfig {
    /// Profile identifier for logging/metrics.
    pub name: String,

    /// Sliding window length in milliseconds.
    pub window_ms: u64,

    /// Maximum admitted requests per key inside the window.
    pub max_requests: u32,

    /// Path prefixes this profile applies to. The longest matching prefix
    /// across all profiles wins; empty means catch-all.
    #[serde(default)]
    pub path_prefixes: Vec<String>,
}

/// CSRF protection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CsrfConfig {
    /// Token time-to-live in seconds.
    pub ttl_secs: u64,

    /// Header carrying the caller-supplied token; the rotated token is
    /// returned under the same name.
    pub header_name: String,

    /// Path prefixes exempt from verification (entry points that predate
    /// having a session, plus the token bootstrap route).
    pub exempt_paths: Vec<String>,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            header_name: "x-csrf-token".to_string(),
            exempt_paths: vec![
                "/auth/login".to_string(),
                "/auth/register".to_string(),
                "/csrf/token".to_string(),
            ],
        }
    }
}

/// Background sweep configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Sweep interval in seconds.
    pub interval_secs: u64,

    /// Retention for limiter entries in seconds. Must cover every
    /// configured window so a sweep never drops a countable arrival.
    pub retention_secs: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            retention_secs: 300,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
