//! Handler traits for routes and filters.
//!
//! Closures with the right shape implement these automatically, so most code
//! registers plain `|req, res| ...` closures.

use crate::http::{Request, Response};
use crate::pipeline::{IntoBody, Interrupt, Payload};

/// Terminal handler producing the response payload.
pub trait Route: Send + Sync {
    fn handle(&self, request: &mut Request, response: &mut Response)
        -> Result<Option<Payload>, Interrupt>;
}

impl<F, R> Route for F
where
    F: Fn(&mut Request, &mut Response) -> Result<R, Interrupt> + Send + Sync,
    R: IntoBody,
{
    fn handle(
        &self,
        request: &mut Request,
        response: &mut Response,
    ) -> Result<Option<Payload>, Interrupt> {
        self(request, response).map(IntoBody::into_body)
    }
}

/// Side-effecting handler run before or after routes.
pub trait Filter: Send + Sync {
    fn handle(&self, request: &mut Request, response: &mut Response) -> Result<(), Interrupt>;
}

impl<F> Filter for F
where
    F: Fn(&mut Request, &mut Response) -> Result<(), Interrupt> + Send + Sync,
{
    fn handle(&self, request: &mut Request, response: &mut Response) -> Result<(), Interrupt> {
        self(request, response)
    }
}
