//! Destination forwarding.
//!
//! `egress` decides how destination connections are made; `dispatcher`
//! drives one exchange from outbound request to relayed response.

pub mod dispatcher;
pub mod egress;

pub use dispatcher::{Dispatcher, ForwardingSession};
pub use egress::Egress;
