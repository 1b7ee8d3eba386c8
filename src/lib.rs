//! Waypoint: an HTTP routing layer.
//!
//! Matches requests to handlers by method, path pattern and accept type,
//! then runs them through a BEFORE → ROUTE → AFTER → AFTER-ALWAYS pipeline
//! with explicit halts and mapped errors.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (axum, request ID, trace, timeout)
//!                         │
//!                         ▼  spawn_blocking
//!                     service::Service::handle
//!                         │
//!                         ▼
//!                     pipeline (context → phases → executor)
//!                         │          │
//!                         │          └─▶ routing (table snapshot, matcher, mime)
//!                         ▼
//!                     Finished { status, headers, body }
//!     ◀────────────── http::response::serialize
//!
//!     Cross-cutting: config (TOML + hot reload), observability
//!     (tracing, metrics), lifecycle (signals, shutdown)
//! ```

// Core
pub mod error;
pub mod handler;
pub mod pipeline;
pub mod redirect;
pub mod routing;
pub mod service;

// Transport
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::ServerConfig;
pub use cookie::{Cookie, SameSite};
pub use error::{HeaderError, RouteError, ServerError};
pub use handler::{Filter, Route};
pub use http::{HttpServer, RawRequest, Request, Response};
pub use lifecycle::Shutdown;
pub use pipeline::{halt, halt_ok, halt_status, Finished, Halt, Interrupt, IntoBody, Payload};
pub use redirect::Redirect;
pub use routing::HttpMethod;
pub use service::{PathGroup, Routable, RouteSummary, Service};
