//! Request facade handed to routes and filters.
//!
//! # Responsibilities
//! - Hold the buffered request as the transport delivered it
//! - Expose params and splat for whichever entry is currently running
//! - Offer query, header, cookie, client and attribute helpers
//!
//! # Design Decisions
//! - One `Request` lives for the whole lifecycle; binding a new match
//!   replaces params and splat, never the object
//! - Attributes are typed (`Extensions`) and survive across phases

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::body::Bytes;
use axum::http::{header, Extensions, HeaderMap, HeaderName, HeaderValue, Method};
use cookie::Cookie;

use crate::routing::{HttpMethod, PathPattern, RouteMatch};

/// Buffered request as delivered by the transport.
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub method: Method,
    /// Raw, still percent-encoded path.
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub remote_addr: Option<SocketAddr>,
}

impl RawRequest {
    /// `target` is a path with an optional `?query`.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (target, None),
        };
        Self {
            method,
            path: path.to_string(),
            query,
            ..Self::default()
        }
    }

    /// Append a header; invalid names or values are skipped.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }
}

impl Default for RawRequest {
    fn default() -> Self {
        Self {
            method: Method::GET,
            path: "/".to_string(),
            query: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            remote_addr: None,
        }
    }
}

/// Request view for handlers.
#[derive(Debug)]
pub struct Request {
    raw: RawRequest,
    routing_method: HttpMethod,
    params: HashMap<String, String>,
    splat: Vec<String>,
    matched_path: Option<PathPattern>,
    attributes: Extensions,
}

impl Request {
    pub fn new(raw: RawRequest) -> Self {
        Self {
            routing_method: HttpMethod::from_wire(raw.method.as_str()),
            raw,
            params: HashMap::new(),
            splat: Vec::new(),
            matched_path: None,
            attributes: Extensions::new(),
        }
    }

    /// Point params and splat at a new match.
    pub(crate) fn bind(&mut self, m: &RouteMatch) {
        self.params = m.params();
        self.splat = m.splat();
        self.matched_path = Some(m.matched_path.clone());
    }

    /// Method as sent on the wire, before any `X-HTTP-Method-Override`.
    pub fn method(&self) -> &Method {
        &self.raw.method
    }

    /// Method the request was routed by. Differs from [`Request::method`]
    /// when a method override header was honoured.
    pub fn routing_method(&self) -> HttpMethod {
        self.routing_method
    }

    pub(crate) fn set_routing_method(&mut self, method: HttpMethod) {
        self.routing_method = method;
    }

    /// Raw request path.
    pub fn uri(&self) -> &str {
        &self.raw.path
    }

    pub fn query_string(&self) -> Option<&str> {
        self.raw.query.as_deref()
    }

    /// Pattern of the entry currently running.
    pub fn matched_path(&self) -> Option<&str> {
        self.matched_path.as_ref().map(PathPattern::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Named parameter; `"name"` and `":NAME"` address the same value.
    pub fn param(&self, name: &str) -> Option<&str> {
        let key = name.to_lowercase();
        let key = if key.starts_with(':') { key } else { format!(":{}", key) };
        self.params.get(&key).map(String::as_str)
    }

    pub fn splat(&self) -> &[String] {
        &self.splat
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.raw.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.raw.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.raw.body
    }

    pub fn body_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.raw.body)
    }

    /// Decoded query pairs in order of appearance.
    pub fn query_params(&self) -> Vec<(String, String)> {
        match &self.raw.query {
            Some(query) => url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
            None => Vec::new(),
        }
    }

    /// First value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query_params()
            .into_iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.header(header::USER_AGENT.as_str())
    }

    /// Cookies from every `Cookie` header. Malformed pairs are skipped;
    /// the last value wins for repeated names.
    pub fn cookies(&self) -> HashMap<String, String> {
        self.raw
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect()
    }

    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies().remove(name)
    }

    pub fn accept(&self) -> Option<&str> {
        self.header(header::ACCEPT.as_str())
    }

    /// Client address: first `X-Forwarded-For` hop, else the peer.
    pub fn ip(&self) -> Option<String> {
        self.header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .or_else(|| self.raw.remote_addr.map(|a| a.ip().to_string()))
    }

    pub fn attribute<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.attributes.get::<T>()
    }

    pub fn set_attribute<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.attributes.insert(value)
    }

    pub fn remove_attribute<T: Clone + Send + Sync + 'static>(&mut self) -> Option<T> {
        self.attributes.remove::<T>()
    }
}
