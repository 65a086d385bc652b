//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → auth.rs (shared secret in X-Proxy-Auth)
//!     → headers.rs (strip hop-by-hop, add X-Forwarded-For)
//!     → Pass to dispatch
//! ```
//!
//! # Design Decisions
//! - Fail closed: a wrong or missing credential stops the request before any
//!   destination contact
//! - Credentials for the gateway never reach the destination

pub mod auth;
pub mod headers;

pub use auth::Authenticator;
