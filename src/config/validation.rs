//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (windows > 0, ceilings > 0)
//! - Check retention covers every configured window
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GuardConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::GuardConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("request timeout must be greater than zero")]
    ZeroRequestTimeout,

    #[error("at least one rate limit profile is required")]
    NoProfiles,

    #[error("rate limit profile has an empty name")]
    EmptyProfileName,

    #[error("duplicate rate limit profile: {0}")]
    DuplicateProfile(String),

    #[error("profile {0}: window must be greater than zero")]
    ZeroWindow(String),

    #[error("profile {0}: max_requests must be greater than zero")]
    ZeroCeiling(String),

    #[error("sweep retention {retention_secs}s is shorter than profile {profile}'s window")]
    RetentionTooShort {
        profile: String,
        retention_secs: u64,
    },

    #[error("sweep interval must be greater than zero")]
    ZeroSweepInterval,

    #[error("csrf ttl must be greater than zero")]
    ZeroCsrfTtl,

    #[error("csrf header name is empty")]
    EmptyCsrfHeader,

    #[error("csrf header name is not a valid header: {0}")]
    InvalidCsrfHeader(String),
}

/// Validate a parsed configuration, collecting every violation.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if config.rate_limit.profiles.is_empty() {
        errors.push(ValidationError::NoProfiles);
    }

    let mut seen = HashSet::new();
    for profile in &config.rate_limit.profiles {
        if profile.name.is_empty() {
            errors.push(ValidationError::EmptyProfileName);
        } else if !seen.insert(profile.name.clone()) {
            errors.push(ValidationError::DuplicateProfile(profile.name.clone()));
        }
        if profile.window_ms == 0 {
            errors.push(ValidationError::ZeroWindow(profile.name.clone()));
        }
        if profile.max_requests == 0 {
            errors.push(ValidationError::ZeroCeiling(profile.name.clone()));
        }
        if config.sweep.retention_secs * 1000 < profile.window_ms {
            errors.push(ValidationError::RetentionTooShort {
                profile: profile.name.clone(),
                retention_secs: config.sweep.retention_secs,
            });
        }
    }

    if config.sweep.interval_secs == 0 {
        errors.push(ValidationError::ZeroSweepInterval);
    }

    if config.csrf.ttl_secs == 0 {
        errors.push(ValidationError::ZeroCsrfTtl);
    }
    if config.csrf.header_name.is_empty() {
        errors.push(ValidationError::EmptyCsrfHeader);
    } else if HeaderName::from_bytes(config.csrf.header_name.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidCsrfHeader(
            config.csrf.header_name.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RateLimitProfileConfig;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GuardConfig::default()).is_ok());
    }

    #[test]
    fn duplicate_profiles_are_rejected() {
        let mut config = GuardConfig::default();
        config.rate_limit.profiles.push(RateLimitProfileConfig {
            name: "general".to_string(),
            window_ms: 1000,
            max_requests: 5,
            path_prefixes: Vec::new(),
        });

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicateProfile("general".to_string())));
    }

    #[test]
    fn retention_must_cover_every_window() {
        let mut config = GuardConfig::default();
        config.sweep.retention_secs = 1;
        config.rate_limit.profiles = vec![RateLimitProfileConfig {
            name: "slow".to_string(),
            window_ms: 5000,
            max_requests: 5,
            path_prefixes: Vec::new(),
        }];

        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(
            errors[0],
            ValidationError::RetentionTooShort { .. }
        ));
    }

    #[test]
    fn all_violations_are_collected() {
        let mut config = GuardConfig::default();
        config.listener.bind_address = "not-an-address".to_string();
        config.timeouts.request_secs = 0;
        config.csrf.ttl_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
