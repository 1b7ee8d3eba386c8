//! Response facade and serialization.
//!
//! # Responsibilities
//! - Collect status, headers and the body cell while phases run
//! - Record redirects
//! - Append `Set-Cookie` headers, one per cookie
//! - Serialize a finished response for axum
//!
//! # Design Decisions
//! - Default status is 200; `Content-Type` falls back to the configured
//!   default only at serialization time
//! - The body is moved out exactly once

use axum::body::Body as HttpBody;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use cookie::time::Duration;
use cookie::Cookie;

use crate::error::HeaderError;
use crate::pipeline::{Body, Finished, IntoBody, Payload};

/// Response view for handlers.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
    redirected: bool,
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Body::new(),
            redirected: false,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    pub fn set_content_type(&mut self, content_type: &str) -> Result<(), HeaderError> {
        let value = HeaderValue::from_str(content_type)?;
        self.headers.insert(header::CONTENT_TYPE, value);
        Ok(())
    }

    /// Set a header, replacing earlier values.
    pub fn header(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Add a header value, keeping earlier ones.
    pub fn append_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        self.headers.append(name, value);
        Ok(())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Session cookie with no attributes.
    pub fn cookie(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        self.set_cookie(Cookie::new(name.to_string(), value.to_string()))
    }

    /// Append a fully built cookie:
    ///
    /// ```ignore
    /// res.set_cookie(
    ///     Cookie::build(("session", "abc"))
    ///         .path("/")
    ///         .max_age(Duration::hours(1))
    ///         .secure(true)
    ///         .http_only(true)
    ///         .build(),
    /// )?;
    /// ```
    pub fn set_cookie(&mut self, cookie: Cookie<'_>) -> Result<(), HeaderError> {
        let value = HeaderValue::from_str(&cookie.to_string())?;
        self.headers.append(header::SET_COOKIE, value);
        Ok(())
    }

    /// Expire `name` on the client.
    pub fn remove_cookie(&mut self, name: &str) -> Result<(), HeaderError> {
        self.remove_cookie_at(name, None, None)
    }

    /// Expire a cookie that was set with a path or domain; browsers only
    /// drop it when both match.
    pub fn remove_cookie_at(
        &mut self,
        name: &str,
        path: Option<&str>,
        domain: Option<&str>,
    ) -> Result<(), HeaderError> {
        let mut removal = Cookie::build((name.to_string(), String::new())).max_age(Duration::ZERO);
        if let Some(path) = path {
            removal = removal.path(path.to_string());
        }
        if let Some(domain) = domain {
            removal = removal.domain(domain.to_string());
        }
        self.set_cookie(removal.build())
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    pub fn set_body(&mut self, content: impl IntoBody) {
        self.body.set(content);
    }

    /// 302 to `location`.
    pub fn redirect(&mut self, location: &str) -> Result<(), HeaderError> {
        self.redirect_with(location, StatusCode::FOUND)
    }

    pub fn redirect_with(&mut self, location: &str, status: StatusCode) -> Result<(), HeaderError> {
        let value = HeaderValue::from_str(location)?;
        self.headers.insert(header::LOCATION, value);
        self.status = status;
        self.redirected = true;
        tracing::trace!(location = %location, status = status.as_u16(), "Redirect recorded");
        Ok(())
    }

    pub fn is_redirected(&self) -> bool {
        self.redirected
    }

    pub(crate) fn into_parts(mut self) -> (StatusCode, HeaderMap, Option<Payload>) {
        let body = self.body.take();
        (self.status, self.headers, body)
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the axum response, applying `default_content_type` when no
/// `Content-Type` was set.
pub fn serialize(finished: Finished, default_content_type: &str) -> axum::response::Response {
    let Finished {
        status,
        mut headers,
        body,
    } = finished;

    if !headers.contains_key(header::CONTENT_TYPE) {
        match HeaderValue::from_str(default_content_type) {
            Ok(value) => {
                headers.insert(header::CONTENT_TYPE, value);
            }
            Err(e) => {
                tracing::warn!(
                    content_type = %default_content_type,
                    error = %e,
                    "Invalid default content type"
                );
            }
        }
    }

    let mut response = axum::response::Response::new(HttpBody::from(body.into_bytes()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
