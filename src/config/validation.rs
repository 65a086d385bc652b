//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - A malformed upstream proxy URL is not rejected here; it fails the
//!   affected requests with 500 instead of preventing startup

use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid listener.bind_address `{0}`")]
    BindAddress(String),

    #[error("invalid observability.metrics_address `{0}`")]
    MetricsAddress(String),

    #[error("dump.max_body_bytes must be greater than zero")]
    MaxBodyBytes,

    #[error("timeouts.request_secs must be greater than zero")]
    RequestTimeout,
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.dump.max_body_bytes == 0 {
        errors.push(ValidationError::MaxBodyBytes);
    }

    if config.timeouts.request_secs == Some(0) {
        errors.push(ValidationError::RequestTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
