//! Error-to-handler mappings.
//!
//! # Responsibilities
//! - Keep an ordered list of (predicate, handler) pairs
//! - Resolve an error to the handler registered for it or for an error it wraps
//!
//! # Design Decisions
//! - Typed registrations downcast with `downcast_ref`; no type hierarchy walk
//! - Lookup starts at the outermost error and follows `source()`; at each
//!   link the first registered mapping wins
//! - Copy-on-write list so lookups never contend with registration

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::http::{Request, Response};
use crate::pipeline::Interrupt;

type Predicate = dyn Fn(&(dyn Error + 'static)) -> bool + Send + Sync;
type Handler =
    dyn Fn(&(dyn Error + 'static), &mut Request, &mut Response) -> Result<(), Interrupt> + Send + Sync;

/// One registered error mapping.
pub struct ExceptionMapping {
    name: String,
    predicate: Box<Predicate>,
    handler: Box<Handler>,
}

impl ExceptionMapping {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(
        &self,
        err: &(dyn Error + 'static),
        request: &mut Request,
        response: &mut Response,
    ) -> Result<(), Interrupt> {
        (self.handler)(err, request, response)
    }
}

impl fmt::Debug for ExceptionMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionMapping").field("name", &self.name).finish()
    }
}

/// Ordered error mappings shared by every request.
#[derive(Debug)]
pub struct ExceptionMapper {
    mappings: ArcSwap<Vec<Arc<ExceptionMapping>>>,
}

impl ExceptionMapper {
    pub fn new() -> Self {
        Self {
            mappings: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Map errors of type `E`, including errors that wrap one.
    pub fn map<E, F>(&self, handler: F)
    where
        E: Error + 'static,
        F: Fn(&E, &mut Request, &mut Response) -> Result<(), Interrupt> + Send + Sync + 'static,
    {
        let mapping = ExceptionMapping {
            name: std::any::type_name::<E>().to_string(),
            predicate: Box::new(|err: &(dyn Error + 'static)| err.is::<E>()),
            handler: Box::new(
                move |err: &(dyn Error + 'static), request: &mut Request, response: &mut Response| {
                    match err.downcast_ref::<E>() {
                        Some(err) => handler(err, request, response),
                        None => Ok(()),
                    }
                },
            ),
        };
        self.push(mapping);
    }

    /// Map every error the predicate accepts.
    pub fn map_matching<P, F>(&self, name: impl Into<String>, predicate: P, handler: F)
    where
        P: Fn(&(dyn Error + 'static)) -> bool + Send + Sync + 'static,
        F: Fn(&(dyn Error + 'static), &mut Request, &mut Response) -> Result<(), Interrupt>
            + Send
            + Sync
            + 'static,
    {
        self.push(ExceptionMapping {
            name: name.into(),
            predicate: Box::new(predicate),
            handler: Box::new(handler),
        });
    }

    fn push(&self, mapping: ExceptionMapping) {
        tracing::debug!(error_type = %mapping.name, "Exception mapping registered");
        let mapping = Arc::new(mapping);
        self.mappings.rcu(|current| {
            let mut next: Vec<Arc<ExceptionMapping>> = current.iter().cloned().collect();
            next.push(mapping.clone());
            next
        });
    }

    /// Mapping for `err` and the link of its source chain that selected it.
    pub fn find<'e>(
        &self,
        err: &'e (dyn Error + 'static),
    ) -> Option<(Arc<ExceptionMapping>, &'e (dyn Error + 'static))> {
        let mappings = self.mappings.load();
        let mut current = Some(err);
        while let Some(link) = current {
            if let Some(mapping) = mappings.iter().find(|m| (m.predicate)(link)) {
                return Some((mapping.clone(), link));
            }
            current = link.source();
        }
        None
    }

    pub fn len(&self) -> usize {
        self.mappings.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.mappings.store(Arc::new(Vec::new()));
    }
}

impl Default for ExceptionMapper {
    fn default() -> Self {
        Self::new()
    }
}
