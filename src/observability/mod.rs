//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, request/response dumps)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout or an append-only log file
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured logging with tracing fields for machine parsing
//! - Metrics are cheap (atomic increments) and off by default
//! - Nothing here may block or fail the relay path

pub mod logging;
pub mod metrics;
