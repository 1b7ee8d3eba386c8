//! Per-request state threaded through every phase.

use crate::http::{RawRequest, Request, Response};
use crate::routing::method::HttpMethod;
use crate::routing::router::RouteSnapshot;

pub const METHOD_OVERRIDE_HEADER: &str = "x-http-method-override";

/// Mutable aggregate owned by the thread handling one request.
#[derive(Debug)]
pub struct RequestContext {
    pub snapshot: RouteSnapshot,
    /// Raw, still percent-encoded path used for matching.
    pub uri: String,
    pub accept_type: Option<String>,
    pub method: HttpMethod,
    pub request: Request,
    pub response: Response,
}

impl RequestContext {
    pub fn new(snapshot: RouteSnapshot, raw: RawRequest, method_override: bool) -> Self {
        let wire_method = method_override
            .then(|| {
                raw.headers
                    .get(METHOD_OVERRIDE_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            })
            .flatten()
            .unwrap_or_else(|| raw.method.as_str().to_string());

        let method = HttpMethod::from_wire(&wire_method);
        let accept_type = raw
            .headers
            .get(axum::http::header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let uri = raw.path.clone();
        let mut request = Request::new(raw);
        request.set_routing_method(method);

        Self {
            snapshot,
            uri,
            accept_type,
            method,
            request,
            response: Response::new(),
        }
    }
}
