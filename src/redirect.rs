//! Route-level redirects.
//!
//! `service.redirect().get("/old", "/new")` registers a route that only
//! answers with a `Location` header. Defaults follow common browser
//! expectations: 302 for GET and `any`, 303 for POST, PUT and DELETE.

use std::sync::Arc;

use axum::http::{HeaderValue, StatusCode};

use crate::error::RouteError;
use crate::http::{Request, Response};
use crate::pipeline::Interrupt;
use crate::routing::{mime, HttpMethod};
use crate::service::Routable;

/// Redirect registration scope returned by [`Routable::redirect`].
#[derive(Debug)]
pub struct Redirect<'a, R: Routable> {
    scope: &'a R,
}

impl<'a, R: Routable> Redirect<'a, R> {
    pub(crate) fn new(scope: &'a R) -> Self {
        Self { scope }
    }

    pub fn get(&self, from: &str, to: &str) -> Result<(), RouteError> {
        self.get_with(from, to, StatusCode::FOUND)
    }

    pub fn get_with(&self, from: &str, to: &str, status: StatusCode) -> Result<(), RouteError> {
        self.route(HttpMethod::Get, from, to, status)
    }

    pub fn post(&self, from: &str, to: &str) -> Result<(), RouteError> {
        self.post_with(from, to, StatusCode::SEE_OTHER)
    }

    pub fn post_with(&self, from: &str, to: &str, status: StatusCode) -> Result<(), RouteError> {
        self.route(HttpMethod::Post, from, to, status)
    }

    pub fn put(&self, from: &str, to: &str) -> Result<(), RouteError> {
        self.put_with(from, to, StatusCode::SEE_OTHER)
    }

    pub fn put_with(&self, from: &str, to: &str, status: StatusCode) -> Result<(), RouteError> {
        self.route(HttpMethod::Put, from, to, status)
    }

    pub fn delete(&self, from: &str, to: &str) -> Result<(), RouteError> {
        self.delete_with(from, to, StatusCode::SEE_OTHER)
    }

    pub fn delete_with(&self, from: &str, to: &str, status: StatusCode) -> Result<(), RouteError> {
        self.route(HttpMethod::Delete, from, to, status)
    }

    /// Redirect every verb. Registered as a BEFORE filter, so it also wins
    /// over routes mapped at `from`.
    pub fn any(&self, from: &str, to: &str) -> Result<(), RouteError> {
        self.any_with(from, to, StatusCode::FOUND)
    }

    pub fn any_with(&self, from: &str, to: &str, status: StatusCode) -> Result<(), RouteError> {
        let location = location(to)?;
        self.scope.add_filter(
            HttpMethod::Before,
            Some(from),
            mime::ANY,
            Arc::new(move |_: &mut Request, res: &mut Response| -> Result<(), Interrupt> {
                res.redirect_with(&location, status)?;
                Ok(())
            }),
        )
    }

    fn route(&self, method: HttpMethod, from: &str, to: &str, status: StatusCode) -> Result<(), RouteError> {
        let location = location(to)?;
        self.scope.add_route(
            method,
            from,
            mime::ANY,
            Arc::new(move |_: &mut Request, res: &mut Response| -> Result<(), Interrupt> {
                res.redirect_with(&location, status)?;
                Ok(())
            }),
        )
    }
}

/// Reject targets that could never be sent as a `Location` header.
fn location(to: &str) -> Result<String, RouteError> {
    if to.is_empty() || HeaderValue::from_str(to).is_err() {
        return Err(RouteError::InvalidRedirect(to.to_string()));
    }
    Ok(to.to_string())
}
