//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → resolve wait_for_termination()
//!
//! Shutdown (shutdown.rs):
//!     trigger() → broadcast to subscribers
//!     → HttpServer stops accepting, drains in-flight requests
//!     → Service::stop() clears routes and mappings
//! ```
//!
//! # Design Decisions
//! - One broadcast channel; every long-running task subscribes
//! - Shutdown is graceful: in-flight requests finish before exit

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
