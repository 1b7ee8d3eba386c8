//! Early termination of a request: halts and handler errors.
//!
//! A halt is an explicit outcome chosen by a handler. It travels through the
//! same `Result` channel as errors but is never logged or mapped as one.

use std::error::Error;
use std::fmt;

use axum::http::StatusCode;

/// Explicit stop with a status and optional body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Halt {
    pub status: StatusCode,
    pub body: Option<String>,
}

impl Halt {
    pub fn new(status: StatusCode) -> Self {
        Self { status, body: None }
    }

    pub fn with_body(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: Some(body.into()),
        }
    }
}

/// Why a handler stopped the normal flow.
pub enum Interrupt {
    Halt(Halt),
    Error(Box<dyn Error + Send + Sync>),
}

impl Interrupt {
    /// Wrap an arbitrary message as an unmapped error.
    pub fn failure(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Interrupt::Error(message.into())
    }

    pub fn is_halt(&self) -> bool {
        matches!(self, Interrupt::Halt(_))
    }
}

impl fmt::Debug for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interrupt::Halt(halt) => f.debug_tuple("Halt").field(halt).finish(),
            Interrupt::Error(err) => f.debug_tuple("Error").field(err).finish(),
        }
    }
}

impl fmt::Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interrupt::Halt(halt) => write!(f, "halted with {}", halt.status),
            Interrupt::Error(err) => write!(f, "{}", err),
        }
    }
}

impl<E> From<E> for Interrupt
where
    E: Error + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Interrupt::Error(Box::new(err))
    }
}

impl From<Halt> for Interrupt {
    fn from(halt: Halt) -> Self {
        Interrupt::Halt(halt)
    }
}

/// Stop with `status` and `body`.
pub fn halt(status: StatusCode, body: impl Into<String>) -> Interrupt {
    Interrupt::Halt(Halt::with_body(status, body))
}

/// Stop with `status` and an empty body.
pub fn halt_status(status: StatusCode) -> Interrupt {
    Interrupt::Halt(Halt::new(status))
}

/// Stop with 200 and an empty body.
pub fn halt_ok() -> Interrupt {
    halt_status(StatusCode::OK)
}
