//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, single fallback handler)
//!     → request.rs (buffer for dump, rewrite URL, Host and headers)
//!     → [proxy dispatcher executes against the destination]
//!     → response.rs (relay head, captured body stream)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::OutboundBody;
pub use server::{AppState, GatewayServer};
