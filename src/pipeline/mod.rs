//! Request-lifecycle pipeline.
//!
//! # Data Flow
//! ```text
//! RawRequest + route snapshot
//!     → context.rs (RequestContext: method, raw path, Accept, facades)
//!     → phases.rs BEFORE filters (all matches, registration order)
//!     → phases.rs ROUTE (first match, accept-type negotiated)
//!     → phases.rs AFTER filters
//!        (halt/error at any point above skips straight to resolution)
//!     → executor.rs resolution (halt | exception.rs mapping | error_pages.rs 500)
//!     → phases.rs AFTER-ALWAYS filters (always, interruptions resolved too)
//!     → executor.rs not-found page if the body is still unset
//!     → Finished { status, headers, body }
//! ```
//!
//! # Design Decisions
//! - Halts and errors share the `Result` channel as `Interrupt`, but only
//!   errors reach the exception mappings or get logged as failures
//! - The body is a single cell; "unset" is meaningful and means not found

pub mod body;
pub mod context;
pub mod error_pages;
pub mod exception;
pub mod executor;
pub mod interrupt;
mod phases;

pub use body::{Body, IntoBody, Payload};
pub use context::RequestContext;
pub use error_pages::{ErrorPage, ErrorPages};
pub use exception::ExceptionMapper;
pub use executor::{execute, Finished};
pub use interrupt::{halt, halt_ok, halt_status, Halt, Interrupt};
