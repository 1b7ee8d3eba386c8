//! Route entries and per-entry matching.
//!
//! # Responsibilities
//! - Hold one immutable (method, pattern, accept type, target) binding
//! - Decide whether a method/path pair hits the entry
//! - Describe a successful hit as a `RouteMatch`
//!
//! # Design Decisions
//! - Entries never change after construction; tables share them via `Arc`
//! - Method must match exactly, then the pattern decides
//! - Accept-type checks live in the table, which sees every candidate at once

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::RouteError;
use crate::handler::{Filter, Route};
use crate::routing::method::HttpMethod;
use crate::routing::mime;
use crate::routing::path::{self, PathPattern};

/// What a matched entry invokes.
#[derive(Clone)]
pub enum Target {
    Route(Arc<dyn Route>),
    Filter(Arc<dyn Filter>),
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Route(_) => f.write_str("Target::Route"),
            Target::Filter(_) => f.write_str("Target::Filter"),
        }
    }
}

/// A single registered route or filter.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    method: HttpMethod,
    path: PathPattern,
    accept_type: String,
    target: Target,
}

impl RouteEntry {
    pub fn new(
        method: HttpMethod,
        path: PathPattern,
        accept_type: impl Into<String>,
        target: Target,
    ) -> Result<Self, RouteError> {
        let accept_type = accept_type.into();
        if accept_type.trim().is_empty() {
            return Err(RouteError::EmptyAcceptType(path.to_string()));
        }
        Ok(Self {
            method,
            path,
            accept_type,
            target,
        })
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &PathPattern {
        &self.path
    }

    pub fn accept_type(&self) -> &str {
        &self.accept_type
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Structural match on method and path only.
    pub fn matches(&self, method: HttpMethod, path: &str) -> bool {
        self.method == method && self.path.matches(path)
    }

    /// Whether the client's `Accept` header admits this entry's type.
    pub fn accepts(&self, accept_header: Option<&str>) -> bool {
        mime::accepts(&self.accept_type, accept_header)
    }

    pub(crate) fn to_match(&self, request_uri: &str, accept_header: Option<&str>) -> RouteMatch {
        RouteMatch {
            target: self.target.clone(),
            matched_path: self.path.clone(),
            request_uri: request_uri.to_string(),
            accept_type: accept_header.map(str::to_string),
            method: self.method,
        }
    }
}

/// Outcome of matching a request against one entry.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub target: Target,
    pub matched_path: PathPattern,
    pub request_uri: String,
    pub accept_type: Option<String>,
    pub method: HttpMethod,
}

impl RouteMatch {
    /// Named parameters, keyed by lowercased `:name`.
    pub fn params(&self) -> HashMap<String, String> {
        match &self.matched_path {
            PathPattern::AllPaths => HashMap::new(),
            PathPattern::Pattern(p) => path::extract_params(p, &self.request_uri),
        }
    }

    pub fn splat(&self) -> Vec<String> {
        match &self.matched_path {
            PathPattern::AllPaths => Vec::new(),
            PathPattern::Pattern(p) => path::extract_splat(p, &self.request_uri),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Request, Response};
    use crate::pipeline::Interrupt;

    fn filter() -> Target {
        Target::Filter(Arc::new(|_: &mut Request, _: &mut Response| -> Result<(), Interrupt> {
            Ok(())
        }))
    }

    fn entry(method: HttpMethod, path: &str) -> RouteEntry {
        RouteEntry::new(method, PathPattern::parse(path).unwrap(), "*/*", filter()).unwrap()
    }

    #[test]
    fn test_before_and_after_on_all_paths() {
        for method in [HttpMethod::Before, HttpMethod::After, HttpMethod::AfterAlways] {
            let e = RouteEntry::new(method, PathPattern::AllPaths, "*/*", filter()).unwrap();
            assert!(e.matches(method, "/anything"));
            assert!(e.matches(method, "/"));
        }
    }

    #[test]
    fn test_method_must_match() {
        let e = entry(HttpMethod::Post, "/test");
        assert!(!e.matches(HttpMethod::Get, "/test"));
        assert!(!e.matches(HttpMethod::Get, "/path"));
    }

    #[test]
    fn test_trailing_slash_rules() {
        assert!(!entry(HttpMethod::Get, "/test").matches(HttpMethod::Get, "/test/"));
        assert!(!entry(HttpMethod::Get, "/test/").matches(HttpMethod::Get, "/test"));
        assert!(entry(HttpMethod::Get, "/test/").matches(HttpMethod::Get, "/test/"));
    }

    #[test]
    fn test_wildcards() {
        assert!(entry(HttpMethod::Get, "/test/*").matches(HttpMethod::Get, "/test/me"));
        assert!(entry(HttpMethod::Get, "/test/this/resource/*")
            .matches(HttpMethod::Get, "/test/this/resource/child/id"));
        assert!(!entry(HttpMethod::Get, "/test/me").matches(HttpMethod::Get, "/test/other"));
    }

    #[test]
    fn test_empty_accept_type_rejected() {
        let err = RouteEntry::new(HttpMethod::Get, PathPattern::parse("/x").unwrap(), " ", filter());
        assert!(matches!(err, Err(RouteError::EmptyAcceptType(_))));
    }

    #[test]
    fn test_match_derives_params_and_splat() {
        let e = entry(HttpMethod::Get, "/paramandwild/:param/stuff/*");
        let m = e.to_match("/paramandwild/x/stuff/y/z", None);
        assert_eq!(m.params()[":param"], "x");
        assert_eq!(m.splat(), vec!["y/z"]);

        let all = RouteEntry::new(HttpMethod::Before, PathPattern::AllPaths, "*/*", filter())
            .unwrap()
            .to_match("/a/b", None);
        assert!(all.params().is_empty());
        assert!(all.splat().is_empty());
    }
}
