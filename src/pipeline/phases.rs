//! The individual lifecycle phases.
//!
//! Each phase returns `Err` to short-circuit; the executor decides what an
//! interruption means.

use crate::pipeline::{Interrupt, Payload, RequestContext};
use crate::routing::{HttpMethod, Target};

pub(crate) fn before(ctx: &mut RequestContext) -> Result<(), Interrupt> {
    run_filters(ctx, HttpMethod::Before)
}

pub(crate) fn after(ctx: &mut RequestContext) -> Result<(), Interrupt> {
    run_filters(ctx, HttpMethod::After)
}

pub(crate) fn after_always(ctx: &mut RequestContext) -> Result<(), Interrupt> {
    run_filters(ctx, HttpMethod::AfterAlways)
}

/// Every matching filter in registration order, each bound to its own match.
fn run_filters(ctx: &mut RequestContext, phase: HttpMethod) -> Result<(), Interrupt> {
    let matches = ctx
        .snapshot
        .find_multiple(phase, &ctx.uri, ctx.accept_type.as_deref());

    for m in &matches {
        let Target::Filter(filter) = &m.target else {
            continue;
        };
        tracing::trace!(phase = %phase, pattern = %m.matched_path, "Running filter");
        ctx.request.bind(m);
        filter.handle(&mut ctx.request, &mut ctx.response)?;
    }
    Ok(())
}

/// First matching route. A HEAD request with no HEAD route falls back to an
/// empty body when a GET route matches.
pub(crate) fn route(ctx: &mut RequestContext) -> Result<(), Interrupt> {
    let accept = ctx.accept_type.as_deref();
    let Some(m) = ctx.snapshot.find(ctx.method, &ctx.uri, accept) else {
        if ctx.method == HttpMethod::Head
            && ctx.response.body().is_unset()
            && ctx.snapshot.find(HttpMethod::Get, &ctx.uri, accept).is_some()
        {
            tracing::trace!(path = %ctx.uri, "HEAD answered from GET route");
            ctx.response.body_mut().set(Payload::default());
        }
        return Ok(());
    };

    let Target::Route(route) = &m.target else {
        return Ok(());
    };

    ctx.request.bind(&m);
    let result = route.handle(&mut ctx.request, &mut ctx.response)?;
    if !ctx.response.is_redirected() {
        ctx.response.body_mut().set_if_unset(result);
    }
    Ok(())
}
