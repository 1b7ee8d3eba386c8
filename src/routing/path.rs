//! Path patterns and segment-wise matching.
//!
//! # Responsibilities
//! - Validate registered patterns
//! - Match a raw request path against a pattern
//! - Extract named parameters and splat values from a matched path
//!
//! # Design Decisions
//! - Matching runs on the raw (still percent-encoded) path, so an encoded
//!   `/` never splits a segment; only extracted values are decoded
//! - Literal segments are case-sensitive, parameter names are not
//! - Trailing slash is part of equality, never normalized away

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use crate::error::RouteError;

/// Segment that captures the rest of the path.
pub const SPLAT: &str = "*";

/// A registered path pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathPattern {
    /// Reserved pattern for filters registered without a path.
    AllPaths,
    /// `/literal/:param/*` style pattern.
    Pattern(String),
}

impl PathPattern {
    /// Validate and wrap a textual pattern.
    pub fn parse(path: &str) -> Result<Self, RouteError> {
        if path.is_empty() {
            return Err(RouteError::EmptyPath);
        }
        if !path.starts_with('/') {
            return Err(RouteError::MissingLeadingSlash(path.to_string()));
        }
        Ok(PathPattern::Pattern(path.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            PathPattern::AllPaths => SPLAT,
            PathPattern::Pattern(p) => p,
        }
    }

    /// True when this pattern is exactly the given registration string.
    pub fn is_literally(&self, path: &str) -> bool {
        matches!(self, PathPattern::Pattern(p) if p == path)
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::AllPaths => true,
            PathPattern::Pattern(p) => matches(p, path),
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split a path into its non-empty `/`-delimited segments.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

pub fn is_param(segment: &str) -> bool {
    segment.starts_with(':')
}

pub fn is_splat(segment: &str) -> bool {
    segment == SPLAT
}

fn segment_matches(pattern: &str, actual: &str) -> bool {
    is_param(pattern) || is_splat(pattern) || pattern == actual
}

/// Match a raw request path against a textual pattern.
pub fn matches(pattern: &str, path: &str) -> bool {
    let ends_in_splat = pattern.ends_with(SPLAT);

    if !ends_in_splat && (pattern.ends_with('/') != path.ends_with('/')) {
        return false;
    }
    if pattern == path {
        return true;
    }

    let pattern_parts = segments(pattern);
    let mut path_parts = segments(path);
    let last = pattern_parts.len().saturating_sub(1);

    if pattern_parts.len() == path_parts.len() {
        for (i, (p, actual)) in pattern_parts.iter().zip(&path_parts).enumerate() {
            if i == last && ends_in_splat && is_splat(p) {
                return true;
            }
            if !segment_matches(p, actual) {
                return false;
            }
        }
        return true;
    }

    if !ends_in_splat {
        return false;
    }

    // `/a/*` also accepts `/a/`, with nothing captured.
    if path_parts.len() + 1 == pattern_parts.len() && path.ends_with('/') {
        path_parts.push("");
        path_parts.push("");
    }
    if pattern_parts.len() >= path_parts.len() {
        return false;
    }

    for (i, p) in pattern_parts.iter().enumerate() {
        if i == last && is_splat(p) {
            return true;
        }
        if !segment_matches(p, path_parts[i]) {
            return false;
        }
    }
    true
}

/// Percent-decode a path fragment. `+` is kept as-is; undecodable input is
/// returned raw.
pub fn decode(fragment: &str) -> String {
    urlencoding::decode(fragment)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| fragment.to_string())
}

/// Named parameters keyed by lowercased `:name`.
pub fn extract_params(pattern: &str, path: &str) -> HashMap<String, String> {
    segments(pattern)
        .into_iter()
        .zip(segments(path))
        .filter(|(p, _)| is_param(p))
        .map(|(p, actual)| {
            let value = decode(actual);
            tracing::trace!(param = %p, value = %value, "Extracted path parameter");
            (p.to_lowercase(), value)
        })
        .collect()
}

/// Splat values in pattern order. A trailing splat absorbs every remaining
/// request segment.
pub fn extract_splat(pattern: &str, path: &str) -> Vec<String> {
    let pattern_parts = segments(pattern);
    let path_parts = segments(path);
    let same_length = pattern_parts.len() == path_parts.len();

    let mut splat = Vec::new();
    for (i, (p, actual)) in pattern_parts.iter().zip(&path_parts).enumerate() {
        if !is_splat(p) {
            continue;
        }
        if !same_length && i == pattern_parts.len() - 1 {
            splat.push(decode(&path_parts[i..].join("/")));
        } else {
            splat.push(decode(actual));
        }
    }
    splat
}
