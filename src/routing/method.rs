//! HTTP verbs plus the filter pseudo-verbs.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Method an entry is registered under.
///
/// `Before`, `After` and `AfterAlways` never arrive on the wire; they tag
/// filter entries so filters and routes can live in one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Trace,
    Connect,
    Options,
    Before,
    After,
    AfterAlways,
    Unsupported,
}

impl HttpMethod {
    /// Map a wire method (any case) to a verb. Unknown verbs and the
    /// pseudo-verbs map to `Unsupported`, so no route can ever match them.
    pub fn from_wire(method: &str) -> Self {
        match method.parse::<HttpMethod>() {
            Ok(m) if !m.is_filter() => m,
            _ => HttpMethod::Unsupported,
        }
    }

    /// True for the filter pseudo-verbs.
    pub fn is_filter(self) -> bool {
        matches!(
            self,
            HttpMethod::Before | HttpMethod::After | HttpMethod::AfterAlways
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::Head => "head",
            HttpMethod::Trace => "trace",
            HttpMethod::Connect => "connect",
            HttpMethod::Options => "options",
            HttpMethod::Before => "before",
            HttpMethod::After => "after",
            HttpMethod::AfterAlways => "afterAlways",
            HttpMethod::Unsupported => "unsupported",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let method = match s.to_ascii_lowercase().as_str() {
            "get" => HttpMethod::Get,
            "post" => HttpMethod::Post,
            "put" => HttpMethod::Put,
            "patch" => HttpMethod::Patch,
            "delete" => HttpMethod::Delete,
            "head" => HttpMethod::Head,
            "trace" => HttpMethod::Trace,
            "connect" => HttpMethod::Connect,
            "options" => HttpMethod::Options,
            "before" => HttpMethod::Before,
            "after" => HttpMethod::After,
            "afteralways" => HttpMethod::AfterAlways,
            _ => return Err(()),
        };
        Ok(method)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
