//! Request-lifecycle executor.
//!
//! # Responsibilities
//! - Run BEFORE → ROUTE → AFTER, stopping at the first interruption
//! - Always run AFTER-ALWAYS
//! - Turn halts, errors and unhandled requests into a body
//! - Hand back exactly one finished response
//!
//! # Design Decisions
//! - Synchronous: one request runs start to finish on one thread
//! - Errors raised while resolving an error are not resolved again; they are
//!   logged and answered with a fixed generic 500
//! - The not-found page is installed only after AFTER-ALWAYS, so those
//!   filters still see an unset body for unhandled requests

use std::error::Error;

use axum::http::{HeaderMap, StatusCode};

use crate::pipeline::error_pages::{self, ErrorPages};
use crate::pipeline::{phases, ExceptionMapper, Halt, Interrupt, Payload, RequestContext};

/// Fully resolved response, ready for serialization.
#[derive(Debug, Clone)]
pub struct Finished {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Payload,
}

/// Run every phase for one request.
pub fn execute(mut ctx: RequestContext, exceptions: &ExceptionMapper, pages: &ErrorPages) -> Finished {
    if let Err(interrupt) = run_main_phases(&mut ctx) {
        resolve(&mut ctx, interrupt, exceptions, pages);
    }

    if let Err(interrupt) = phases::after_always(&mut ctx) {
        resolve(&mut ctx, interrupt, exceptions, pages);
    }

    if ctx.response.body().is_unset() {
        if ctx.response.is_redirected() {
            ctx.response.body_mut().set(Payload::default());
        } else {
            tracing::info!(method = %ctx.method, path = %ctx.uri, "No route matched");
            ctx.response.set_status(StatusCode::NOT_FOUND);
            let page = pages.render(StatusCode::NOT_FOUND, &mut ctx.request, &mut ctx.response);
            ctx.response.body_mut().set(page);
        }
    }

    let (status, headers, body) = ctx.response.into_parts();
    Finished {
        status,
        headers,
        body: body.unwrap_or_default(),
    }
}

fn run_main_phases(ctx: &mut RequestContext) -> Result<(), Interrupt> {
    phases::before(ctx)?;
    phases::route(ctx)?;
    phases::after(ctx)
}

fn resolve(ctx: &mut RequestContext, interrupt: Interrupt, exceptions: &ExceptionMapper, pages: &ErrorPages) {
    match interrupt {
        Interrupt::Halt(halt) => apply_halt(ctx, halt),
        Interrupt::Error(err) => resolve_error(ctx, err, exceptions, pages),
    }
}

fn apply_halt(ctx: &mut RequestContext, halt: Halt) {
    tracing::debug!(
        method = %ctx.method,
        path = %ctx.uri,
        status = halt.status.as_u16(),
        "Request halted"
    );
    ctx.response.set_status(halt.status);
    ctx.response
        .body_mut()
        .set(Payload::Text(halt.body.unwrap_or_default()));
}

fn resolve_error(
    ctx: &mut RequestContext,
    err: Box<dyn Error + Send + Sync>,
    exceptions: &ExceptionMapper,
    pages: &ErrorPages,
) {
    let err: &(dyn Error + 'static) = err.as_ref();

    let Some((mapping, link)) = exceptions.find(err) else {
        tracing::error!(
            method = %ctx.method,
            path = %ctx.uri,
            error = %err,
            error_debug = ?err,
            "Unmapped error while handling request"
        );
        metrics::counter!("router_unmapped_errors_total").increment(1);
        ctx.response.set_status(StatusCode::INTERNAL_SERVER_ERROR);
        let page = pages.render(StatusCode::INTERNAL_SERVER_ERROR, &mut ctx.request, &mut ctx.response);
        ctx.response.body_mut().set(page);
        return;
    };

    tracing::debug!(mapping = %mapping.name(), error = %link, "Error mapped to handler");
    match mapping.handle(link, &mut ctx.request, &mut ctx.response) {
        Ok(()) => {
            if ctx.response.body().is_unset() {
                ctx.response.body_mut().set(Payload::default());
            }
        }
        Err(Interrupt::Halt(halt)) => apply_halt(ctx, halt),
        Err(Interrupt::Error(second)) => {
            tracing::error!(
                method = %ctx.method,
                path = %ctx.uri,
                original = %err,
                error = %second,
                "Error handler failed"
            );
            metrics::counter!("router_unmapped_errors_total").increment(1);
            ctx.response.set_status(StatusCode::INTERNAL_SERVER_ERROR);
            ctx.response
                .body_mut()
                .set(Payload::Text(error_pages::INTERNAL_ERROR.to_string()));
        }
    }
}
