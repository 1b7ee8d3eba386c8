//! Crate-level error types.

use thiserror::Error;

/// Errors raised while registering routes and filters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("route path must not be empty")]
    EmptyPath,

    #[error("route path must start with '/': {0}")]
    MissingLeadingSlash(String),

    #[error("accept type must not be empty for path {0}")]
    EmptyAcceptType(String),

    #[error("redirect target is not a valid Location header: {0:?}")]
    InvalidRedirect(String),
}

/// Errors raised by the HTTP transport adapter.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metrics exporter failed to start: {0}")]
    Metrics(String),

    #[error("logging initialisation failed: {0}")]
    Logging(String),
}

/// Invalid header written through the response facade.
#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("invalid header name: {0}")]
    Name(#[from] axum::http::header::InvalidHeaderName),

    #[error("invalid header value: {0}")]
    Value(#[from] axum::http::header::InvalidHeaderValue),
}
