//! Client helper for the forwarding gateway.

pub mod client;

pub use client::{ClientError, GatewayClient, X_PROXY_AUTH, X_PROXY_TARGET};
