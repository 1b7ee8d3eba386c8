//! HTTP transport subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → server.rs dispatch (buffer body into RawRequest)
//!     → [spawn_blocking] Service::handle (pipeline, using request.rs /
//!       response.rs facades)
//!     → response.rs serialize (status, headers, body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RawRequest, Request};
pub use response::Response;
pub use server::{HttpServer, X_REQUEST_ID};
