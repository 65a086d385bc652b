//! Shared-secret authentication.
//!
//! # Design Decisions
//! - No secret (absent or empty) disables authentication
//! - Exact byte comparison: case-sensitive, no trimming
//! - A missing header never matches a configured secret

/// Stateless predicate over the presented `X-Proxy-Auth` credential.
#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    secret: Option<String>,
}

impl Authenticator {
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()).map(str::to_string),
        }
    }

    /// Whether authentication is switched on.
    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    pub fn authenticate(&self, presented: Option<&str>) -> bool {
        match &self.secret {
            None => true,
            Some(secret) => presented == Some(secret.as_str()),
        }
    }
}
