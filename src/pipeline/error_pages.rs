//! Custom and generic error pages.
//!
//! Pages are consulted for a request nothing handled (404) and for an error
//! nothing mapped (500). Any status may carry a page.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::http::StatusCode;

use crate::handler::Route;
use crate::http::{Request, Response};
use crate::pipeline::{Interrupt, Payload};

pub const NOT_FOUND: &str = "<html><body><h2>404 Not found</h2></body></html>";
pub const INTERNAL_ERROR: &str = "<html><body><h2>500 Internal Server Error</h2></body></html>";

/// Body rendered when no custom page exists, or when one fails.
pub fn generic_page(status: StatusCode) -> String {
    match status {
        StatusCode::NOT_FOUND => NOT_FOUND.to_string(),
        StatusCode::INTERNAL_SERVER_ERROR => INTERNAL_ERROR.to_string(),
        other => format!(
            "<html><body><h2>{} {}</h2></body></html>",
            other.as_u16(),
            other.canonical_reason().unwrap_or("Error")
        ),
    }
}

#[derive(Clone)]
pub enum ErrorPage {
    Static(String),
    Handler(Arc<dyn Route>),
}

impl fmt::Debug for ErrorPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorPage::Static(text) => f.debug_tuple("Static").field(text).finish(),
            ErrorPage::Handler(_) => f.write_str("Handler"),
        }
    }
}

/// Status code to page registry.
#[derive(Debug)]
pub struct ErrorPages {
    pages: ArcSwap<HashMap<u16, ErrorPage>>,
}

impl ErrorPages {
    pub fn new() -> Self {
        Self {
            pages: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    pub fn set(&self, status: StatusCode, page: ErrorPage) {
        let code = status.as_u16();
        self.pages.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.insert(code, page.clone());
            next
        });
    }

    pub fn remove(&self, status: StatusCode) -> bool {
        let code = status.as_u16();
        let mut removed = false;
        self.pages.rcu(|current| {
            let mut next = HashMap::clone(current);
            removed = next.remove(&code).is_some();
            next
        });
        removed
    }

    pub fn has(&self, status: StatusCode) -> bool {
        self.pages.load().contains_key(&status.as_u16())
    }

    pub fn clear(&self) {
        self.pages.store(Arc::new(HashMap::new()));
    }

    /// Body for `status`. A custom handler that fails falls back to the
    /// generic page; one that halts supplies the halt body instead.
    ///
    /// Handlers start from an empty body: whatever the failed request left
    /// behind is discarded, and a handler that sets nothing gets the generic
    /// page.
    pub fn render(&self, status: StatusCode, request: &mut Request, response: &mut Response) -> Payload {
        let page = self.pages.load().get(&status.as_u16()).cloned();
        match page {
            None => Payload::Text(generic_page(status)),
            Some(ErrorPage::Static(text)) => Payload::Text(text),
            Some(ErrorPage::Handler(route)) => {
                response.body_mut().clear();
                Self::render_handler(route.as_ref(), status, request, response)
            }
        }
    }

    fn render_handler(
        route: &dyn Route,
        status: StatusCode,
        request: &mut Request,
        response: &mut Response,
    ) -> Payload {
        match route.handle(request, response) {
            Ok(Some(payload)) => payload,
            Ok(None) => response
                .body_mut()
                .take()
                .unwrap_or_else(|| Payload::Text(generic_page(status))),
            Err(Interrupt::Halt(halt)) => {
                response.set_status(halt.status);
                Payload::Text(halt.body.unwrap_or_default())
            }
            Err(Interrupt::Error(err)) => {
                tracing::warn!(
                    status = status.as_u16(),
                    error = %err,
                    "Custom error page failed, using generic page"
                );
                Payload::Text(generic_page(status))
            }
        }
    }
}

impl Default for ErrorPages {
    fn default() -> Self {
        Self::new()
    }
}
