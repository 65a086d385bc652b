//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Apply flags → Validate → Logging → Bind → Serve
//!
//! Shutdown (shutdown.rs):
//!     Ctrl-C received → Stop accepting → Drain in-flight exchanges → Exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Per-request failures never end the process

pub mod shutdown;

pub use shutdown::Shutdown;
