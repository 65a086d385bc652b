//! Per-request failures and their HTTP mapping.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::routing::TargetError;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Failed to parse proxy target: {0}")]
    Target(#[from] TargetError),

    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    Body(String),

    #[error("Failed to parse proxy URL: {0}")]
    UpstreamProxy(String),

    #[error("destination request failed: {0}")]
    Destination(#[from] reqwest::Error),

    #[error("destination sent no response headers within {0:?}")]
    DestinationTimeout(Duration),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::Target(_) | GatewayError::Body(_) => StatusCode::BAD_REQUEST,
            GatewayError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::UpstreamProxy(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Destination(_) => StatusCode::BAD_GATEWAY,
            GatewayError::DestinationTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Log at the level the failure deserves.
    pub fn log(&self) {
        match self {
            GatewayError::Unauthorized => tracing::info!("Unauthorized"),
            GatewayError::Target(_) | GatewayError::Body(_) | GatewayError::BodyTooLarge { .. } => {
                tracing::warn!(error = %self, "Rejected request")
            }
            GatewayError::UpstreamProxy(_) => tracing::error!(error = %self, "Upstream proxy misconfigured"),
            GatewayError::Destination(e) => {
                tracing::error!(error = %e, url = ?e.url().map(|u| u.as_str()), "Destination request failed")
            }
            GatewayError::DestinationTimeout(limit) => {
                tracing::error!(timeout = ?limit, "Destination request timed out")
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let reason = status.canonical_reason().unwrap_or("Error");
        (status, format!("{}\n", reason)).into_response()
    }
}
