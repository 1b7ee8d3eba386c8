//! Route table: storage, mutation and lookup.
//!
//! # Responsibilities
//! - Store entries in registration order
//! - Add and remove entries while requests are in flight
//! - Look up the first matching route or every matching filter
//!
//! # Design Decisions
//! - Copy-on-write: writers swap in a new `Vec`, readers keep the snapshot
//!   they loaded, so lookups never take a lock
//! - Registration order is priority: first route wins, all filters fire
//! - Removal compares the registered pattern text, it does not match a
//!   sample request against patterns

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::routing::matcher::{RouteEntry, RouteMatch};
use crate::routing::method::HttpMethod;
use crate::routing::mime;

/// Shared, mutable route table.
#[derive(Debug)]
pub struct RouteTable {
    entries: ArcSwap<Vec<Arc<RouteEntry>>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self {
            entries: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Append an entry at the lowest priority.
    pub fn add(&self, entry: RouteEntry) {
        let entry = Arc::new(entry);
        tracing::debug!(
            method = %entry.method(),
            path = %entry.path(),
            accept_type = %entry.accept_type(),
            "Route registered"
        );
        self.entries.rcu(|current| {
            let mut next: Vec<Arc<RouteEntry>> = current.iter().cloned().collect();
            next.push(entry.clone());
            next
        });
    }

    /// Remove every entry registered under exactly `path`, whatever its method.
    pub fn remove(&self, path: &str) -> bool {
        self.remove_where(path, None)
    }

    /// Remove entries registered under exactly `path` for one method.
    pub fn remove_method(&self, path: &str, method: HttpMethod) -> bool {
        self.remove_where(path, Some(method))
    }

    fn remove_where(&self, path: &str, method: Option<HttpMethod>) -> bool {
        let mut removed = false;
        self.entries.rcu(|current| {
            let next: Vec<Arc<RouteEntry>> = current
                .iter()
                .filter(|e| {
                    let hit = e.path().is_literally(path)
                        && method.map_or(true, |m| e.method() == m);
                    !hit
                })
                .cloned()
                .collect();
            removed = next.len() != current.len();
            next
        });
        if removed {
            tracing::debug!(path = %path, method = ?method, "Route removed");
        }
        removed
    }

    pub fn clear(&self) {
        self.entries.store(Arc::new(Vec::new()));
    }

    /// Consistent view for one request or one listing.
    pub fn snapshot(&self) -> RouteSnapshot {
        RouteSnapshot {
            entries: self.entries.load_full(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, method: HttpMethod, path: &str, accept: Option<&str>) -> Option<RouteMatch> {
        self.snapshot().find(method, path, accept)
    }

    pub fn find_multiple(&self, method: HttpMethod, path: &str, accept: Option<&str>) -> Vec<RouteMatch> {
        self.snapshot().find_multiple(method, path, accept)
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable view of the table at one point in time.
#[derive(Debug, Clone)]
pub struct RouteSnapshot {
    entries: Arc<Vec<Arc<RouteEntry>>>,
}

impl RouteSnapshot {
    pub fn entries(&self) -> &[Arc<RouteEntry>] {
        &self.entries
    }

    /// First structurally matching route whose accept type best fits the
    /// client's header. Among candidates only the first entry per accept type
    /// competes.
    pub fn find(&self, method: HttpMethod, path: &str, accept: Option<&str>) -> Option<RouteMatch> {
        let mut candidates: Vec<&Arc<RouteEntry>> = Vec::new();
        for entry in self.entries.iter().filter(|e| e.matches(method, path)) {
            if !candidates.iter().any(|c| c.accept_type() == entry.accept_type()) {
                candidates.push(entry);
            }
        }
        if candidates.is_empty() {
            return None;
        }

        let types: Vec<&str> = candidates.iter().map(|e| e.accept_type()).collect();
        mime::best_match_index(&types, accept).map(|i| candidates[i].to_match(path, accept))
    }

    /// Every matching entry, in registration order.
    pub fn find_multiple(&self, method: HttpMethod, path: &str, accept: Option<&str>) -> Vec<RouteMatch> {
        self.entries
            .iter()
            .filter(|e| e.matches(method, path) && e.accepts(accept))
            .map(|e| e.to_match(path, accept))
            .collect()
    }
}
