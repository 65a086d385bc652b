//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (X-Proxy-Target, X-Proxy-Auth)
//!     → RoutingDirective (borrowed header values)
//!     → target.rs (destination URL)
//!     → Return: URL or TargetError
//! ```
//!
//! # Design Decisions
//! - The destination is chosen per request by the caller; there is no route table
//! - Routing headers are stripped before the request leaves the gateway

pub mod target;

use axum::http::{HeaderMap, HeaderValue};
use url::Url;

pub use target::{authority, resolve, TargetError};

/// Header carrying the destination origin.
pub const X_PROXY_TARGET: &str = "x-proxy-target";
/// Header carrying the shared secret.
pub const X_PROXY_AUTH: &str = "x-proxy-auth";

/// The (target, credential) pair carried by an inbound request.
#[derive(Debug, Clone, Copy)]
pub struct RoutingDirective<'a> {
    target: Option<&'a HeaderValue>,
    credential: Option<&'a HeaderValue>,
}

impl<'a> RoutingDirective<'a> {
    pub fn from_headers(headers: &'a HeaderMap) -> Self {
        Self {
            target: headers.get(X_PROXY_TARGET),
            credential: headers.get(X_PROXY_AUTH),
        }
    }

    /// The presented secret. Non-text values count as absent.
    pub fn credential(&self) -> Option<&'a str> {
        self.credential.and_then(|v| v.to_str().ok())
    }

    pub fn resolve_target(&self) -> Result<Url, TargetError> {
        let raw = match self.target {
            Some(value) => Some(value.to_str().map_err(|_| TargetError::Encoding)?),
            None => None,
        };
        resolve(raw)
    }

    /// Remove both routing headers so they never reach the destination.
    pub fn strip(headers: &mut HeaderMap) {
        headers.remove(X_PROXY_TARGET);
        headers.remove(X_PROXY_AUTH);
    }
}
