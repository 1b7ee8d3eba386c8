//! Application-facing configuration surface.
//!
//! # Responsibilities
//! - Register routes, filters, path groups, error mappings and error pages
//! - Unmap and list routes at runtime
//! - Run one request through the lifecycle against a consistent snapshot
//!
//! # Design Decisions
//! - `Service` is a cheap `Clone` handle; every table inside is copy-on-write
//! - Registration is shared by `Service` and `PathGroup` through `Routable`
//! - Invalid patterns are reported as `RouteError`, never panics

use std::error::Error;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::http::StatusCode;
use serde::Serialize;

use crate::config::RoutingConfig;
use crate::error::RouteError;
use crate::handler::{Filter, Route};
use crate::http::{RawRequest, Request, Response};
use crate::pipeline::{
    self, ErrorPage, ErrorPages, ExceptionMapper, Finished, IntoBody, Interrupt, RequestContext,
};
use crate::redirect::Redirect;
use crate::routing::{mime, HttpMethod, PathPattern, RouteEntry, RouteTable, Target};

#[derive(Debug)]
struct Inner {
    routes: RouteTable,
    exceptions: ExceptionMapper,
    error_pages: ErrorPages,
    settings: ArcSwap<RoutingConfig>,
}

/// Routes, mappings and settings for one application.
#[derive(Debug, Clone)]
pub struct Service {
    inner: Arc<Inner>,
}

/// One row of the route listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    pub method: HttpMethod,
    pub path: String,
    pub accept_type: String,
    pub filter: bool,
}

impl Service {
    pub fn new() -> Self {
        Self::with_config(RoutingConfig::default())
    }

    pub fn with_config(settings: RoutingConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                routes: RouteTable::new(),
                exceptions: ExceptionMapper::new(),
                error_pages: ErrorPages::new(),
                settings: ArcSwap::from_pointee(settings),
            }),
        }
    }

    /// Run the full lifecycle for one request. Blocks for as long as the
    /// handlers do.
    pub fn handle(&self, raw: RawRequest) -> Finished {
        let method_override = self.inner.settings.load().method_override;
        let ctx = RequestContext::new(self.inner.routes.snapshot(), raw, method_override);
        pipeline::execute(ctx, &self.inner.exceptions, &self.inner.error_pages)
    }

    pub fn settings(&self) -> Arc<RoutingConfig> {
        self.inner.settings.load_full()
    }

    /// Swap in new lifecycle settings; in-flight requests keep the old ones.
    pub fn apply_config(&self, settings: RoutingConfig) {
        tracing::info!(
            method_override = settings.method_override,
            default_content_type = %settings.default_content_type,
            "Routing settings updated"
        );
        self.inner.settings.store(Arc::new(settings));
    }

    pub fn route_table(&self) -> &RouteTable {
        &self.inner.routes
    }

    /// Map errors of type `E`, or errors wrapping one, to a handler.
    pub fn exception<E, F>(&self, handler: F)
    where
        E: Error + 'static,
        F: Fn(&E, &mut Request, &mut Response) -> Result<(), Interrupt> + Send + Sync + 'static,
    {
        self.inner.exceptions.map::<E, F>(handler);
    }

    /// Map every error the predicate accepts to a handler.
    pub fn exception_matching<P, F>(&self, name: &str, predicate: P, handler: F)
    where
        P: Fn(&(dyn Error + 'static)) -> bool + Send + Sync + 'static,
        F: Fn(&(dyn Error + 'static), &mut Request, &mut Response) -> Result<(), Interrupt>
            + Send
            + Sync
            + 'static,
    {
        self.inner.exceptions.map_matching(name, predicate, handler);
    }

    pub fn not_found(&self, page: impl Into<String>) {
        self.error_page(StatusCode::NOT_FOUND, ErrorPage::Static(page.into()));
    }

    pub fn not_found_route<F, T>(&self, handler: F)
    where
        F: Fn(&mut Request, &mut Response) -> Result<T, Interrupt> + Send + Sync + 'static,
        T: IntoBody,
    {
        self.error_page(StatusCode::NOT_FOUND, ErrorPage::Handler(Arc::new(handler)));
    }

    pub fn internal_server_error(&self, page: impl Into<String>) {
        self.error_page(StatusCode::INTERNAL_SERVER_ERROR, ErrorPage::Static(page.into()));
    }

    pub fn internal_server_error_route<F, T>(&self, handler: F)
    where
        F: Fn(&mut Request, &mut Response) -> Result<T, Interrupt> + Send + Sync + 'static,
        T: IntoBody,
    {
        self.error_page(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorPage::Handler(Arc::new(handler)),
        );
    }

    pub fn error_page(&self, status: StatusCode, page: ErrorPage) {
        tracing::debug!(status = status.as_u16(), "Custom error page registered");
        self.inner.error_pages.set(status, page);
    }

    /// Remove every method registered under exactly `path`.
    pub fn unmap(&self, path: &str) -> bool {
        self.inner.routes.remove(path)
    }

    /// Remove one method registered under exactly `path`. Unknown method
    /// names remove nothing.
    pub fn unmap_method(&self, path: &str, method: &str) -> bool {
        match method.parse::<HttpMethod>() {
            Ok(method) => self.inner.routes.remove_method(path, method),
            Err(()) => false,
        }
    }

    /// Every entry in priority order.
    pub fn routes(&self) -> Vec<RouteSummary> {
        self.inner
            .routes
            .snapshot()
            .entries()
            .iter()
            .map(|e| RouteSummary {
                method: e.method(),
                path: e.path().to_string(),
                accept_type: e.accept_type().to_string(),
                filter: matches!(e.target(), Target::Filter(_)),
            })
            .collect()
    }

    /// Drop every route, mapping and error page.
    pub fn stop(&self) {
        self.inner.routes.clear();
        self.inner.exceptions.clear();
        self.inner.error_pages.clear();
        tracing::info!("Service stopped, routes cleared");
    }
}

impl Default for Service {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration API shared by the service and path groups.
pub trait Routable {
    fn service(&self) -> &Service;

    /// Prefix prepended to every path registered through this value.
    fn prefix(&self) -> &str {
        ""
    }

    /// Register a route for any verb and accept type.
    fn add_route(
        &self,
        method: HttpMethod,
        path: &str,
        accept_type: &str,
        route: Arc<dyn Route>,
    ) -> Result<(), RouteError> {
        let pattern = PathPattern::parse(&format!("{}{}", self.prefix(), path))?;
        let entry = RouteEntry::new(method, pattern, accept_type, Target::Route(route))?;
        self.service().inner.routes.add(entry);
        Ok(())
    }

    /// Register a filter; `None` means every path (or every path under the
    /// prefix inside a group).
    fn add_filter(
        &self,
        phase: HttpMethod,
        path: Option<&str>,
        accept_type: &str,
        filter: Arc<dyn Filter>,
    ) -> Result<(), RouteError> {
        let pattern = match (path, self.prefix()) {
            (None, "") => PathPattern::AllPaths,
            (None, prefix) => PathPattern::parse(&format!("{}/*", prefix))?,
            (Some(path), prefix) => PathPattern::parse(&format!("{}{}", prefix, path))?,
        };
        let entry = RouteEntry::new(phase, pattern, accept_type, Target::Filter(filter))?;
        self.service().inner.routes.add(entry);
        Ok(())
    }

    /// Route restricted to clients accepting `accept_type`.
    fn on<F, T>(&self, method: HttpMethod, path: &str, accept_type: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(&mut Request, &mut Response) -> Result<T, Interrupt> + Send + Sync + 'static,
        T: IntoBody,
    {
        self.add_route(method, path, accept_type, Arc::new(handler))
    }

    fn get<F, T>(&self, path: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(&mut Request, &mut Response) -> Result<T, Interrupt> + Send + Sync + 'static,
        T: IntoBody,
    {
        self.on(HttpMethod::Get, path, mime::ANY, handler)
    }

    fn post<F, T>(&self, path: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(&mut Request, &mut Response) -> Result<T, Interrupt> + Send + Sync + 'static,
        T: IntoBody,
    {
        self.on(HttpMethod::Post, path, mime::ANY, handler)
    }

    fn put<F, T>(&self, path: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(&mut Request, &mut Response) -> Result<T, Interrupt> + Send + Sync + 'static,
        T: IntoBody,
    {
        self.on(HttpMethod::Put, path, mime::ANY, handler)
    }

    fn patch<F, T>(&self, path: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(&mut Request, &mut Response) -> Result<T, Interrupt> + Send + Sync + 'static,
        T: IntoBody,
    {
        self.on(HttpMethod::Patch, path, mime::ANY, handler)
    }

    fn delete<F, T>(&self, path: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(&mut Request, &mut Response) -> Result<T, Interrupt> + Send + Sync + 'static,
        T: IntoBody,
    {
        self.on(HttpMethod::Delete, path, mime::ANY, handler)
    }

    fn head<F, T>(&self, path: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(&mut Request, &mut Response) -> Result<T, Interrupt> + Send + Sync + 'static,
        T: IntoBody,
    {
        self.on(HttpMethod::Head, path, mime::ANY, handler)
    }

    fn options<F, T>(&self, path: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(&mut Request, &mut Response) -> Result<T, Interrupt> + Send + Sync + 'static,
        T: IntoBody,
    {
        self.on(HttpMethod::Options, path, mime::ANY, handler)
    }

    fn trace<F, T>(&self, path: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(&mut Request, &mut Response) -> Result<T, Interrupt> + Send + Sync + 'static,
        T: IntoBody,
    {
        self.on(HttpMethod::Trace, path, mime::ANY, handler)
    }

    fn connect<F, T>(&self, path: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(&mut Request, &mut Response) -> Result<T, Interrupt> + Send + Sync + 'static,
        T: IntoBody,
    {
        self.on(HttpMethod::Connect, path, mime::ANY, handler)
    }

    /// Filter restricted to clients accepting `accept_type`.
    fn filter_on<F>(
        &self,
        phase: HttpMethod,
        path: Option<&str>,
        accept_type: &str,
        filter: F,
    ) -> Result<(), RouteError>
    where
        F: Fn(&mut Request, &mut Response) -> Result<(), Interrupt> + Send + Sync + 'static,
    {
        self.add_filter(phase, path, accept_type, Arc::new(filter))
    }

    fn before<F>(&self, path: &str, filter: F) -> Result<(), RouteError>
    where
        F: Fn(&mut Request, &mut Response) -> Result<(), Interrupt> + Send + Sync + 'static,
    {
        self.filter_on(HttpMethod::Before, Some(path), mime::ANY, filter)
    }

    fn before_all<F>(&self, filter: F) -> Result<(), RouteError>
    where
        F: Fn(&mut Request, &mut Response) -> Result<(), Interrupt> + Send + Sync + 'static,
    {
        self.filter_on(HttpMethod::Before, None, mime::ANY, filter)
    }

    fn after<F>(&self, path: &str, filter: F) -> Result<(), RouteError>
    where
        F: Fn(&mut Request, &mut Response) -> Result<(), Interrupt> + Send + Sync + 'static,
    {
        self.filter_on(HttpMethod::After, Some(path), mime::ANY, filter)
    }

    fn after_all<F>(&self, filter: F) -> Result<(), RouteError>
    where
        F: Fn(&mut Request, &mut Response) -> Result<(), Interrupt> + Send + Sync + 'static,
    {
        self.filter_on(HttpMethod::After, None, mime::ANY, filter)
    }

    fn after_always<F>(&self, path: &str, filter: F) -> Result<(), RouteError>
    where
        F: Fn(&mut Request, &mut Response) -> Result<(), Interrupt> + Send + Sync + 'static,
    {
        self.filter_on(HttpMethod::AfterAlways, Some(path), mime::ANY, filter)
    }

    fn after_always_all<F>(&self, filter: F) -> Result<(), RouteError>
    where
        F: Fn(&mut Request, &mut Response) -> Result<(), Interrupt> + Send + Sync + 'static,
    {
        self.filter_on(HttpMethod::AfterAlways, None, mime::ANY, filter)
    }

    /// Route-level redirects registered in this scope.
    fn redirect(&self) -> Redirect<'_, Self>
    where
        Self: Sized,
    {
        Redirect::new(self)
    }

    /// Register everything inside `group` under `prefix`. Groups nest.
    fn path<F>(&self, prefix: &str, group: F) -> Result<(), RouteError>
    where
        F: FnOnce(&PathGroup<'_>) -> Result<(), RouteError>,
    {
        let group_prefix = format!("{}{}", self.prefix(), prefix);
        PathPattern::parse(&group_prefix)?;
        group(&PathGroup {
            service: self.service(),
            prefix: group_prefix,
        })
    }
}

impl Routable for Service {
    fn service(&self) -> &Service {
        self
    }
}

/// Registration scope created by [`Routable::path`].
#[derive(Debug)]
pub struct PathGroup<'a> {
    service: &'a Service,
    prefix: String,
}

impl Routable for PathGroup<'_> {
    fn service(&self) -> &Service {
        self.service
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    fn body(finished: Finished) -> String {
        finished.body.into_text()
    }

    #[test]
    fn test_invalid_patterns_are_rejected() {
        let service = Service::new();
        assert_eq!(service.get("", |_, _| Ok("x")), Err(RouteError::EmptyPath));
        assert_eq!(
            service.get("hello", |_, _| Ok("x")),
            Err(RouteError::MissingLeadingSlash("hello".into()))
        );
        assert!(service.routes().is_empty());
    }

    #[test]
    fn test_path_groups_prefix_registrations() {
        let service = Service::new();
        service
            .path("/api", |api| {
                api.before_all(|_, res| {
                    res.header("x-api", "1")?;
                    Ok(())
                })?;
                api.get("/users", |_, _| Ok("users"))?;
                api.path("/v2", |v2| {
                    v2.get("/users/:id", |req, _| {
                        Ok(format!("v2 {}", req.param("id").unwrap_or_default()))
                    })
                })
            })
            .unwrap();

        let listed: Vec<(HttpMethod, String)> =
            service.routes().into_iter().map(|r| (r.method, r.path)).collect();
        assert_eq!(
            listed,
            vec![
                (HttpMethod::Before, "/api/*".to_string()),
                (HttpMethod::Get, "/api/users".to_string()),
                (HttpMethod::Get, "/api/v2/users/:id".to_string()),
            ]
        );

        let finished = service.handle(RawRequest::new(Method::GET, "/api/v2/users/7"));
        assert_eq!(finished.headers["x-api"], "1");
        assert_eq!(body(finished), "v2 7");
    }

    #[test]
    fn test_route_listing_marks_filters() {
        let service = Service::new();
        service.before_all(|_, _| Ok(())).unwrap();
        service
            .on(HttpMethod::Get, "/json", "application/json", |_, _| Ok("{}"))
            .unwrap();

        let routes = service.routes();
        assert_eq!(routes[0].path, "*");
        assert!(routes[0].filter);
        assert_eq!(routes[1].accept_type, "application/json");
        assert!(!routes[1].filter);

        let json = serde_json::to_value(&routes[1]).unwrap();
        assert_eq!(json["method"], "get");
        assert_eq!(json["acceptType"], "application/json");
    }

    #[test]
    fn test_unmap_method_by_name() {
        let service = Service::new();
        service.get("/thing", |_, _| Ok("get")).unwrap();
        service.post("/thing", |_, _| Ok("post")).unwrap();

        assert!(!service.unmap_method("/thing", "brew"));
        assert!(service.unmap_method("/thing", "GET"));

        let get = service.handle(RawRequest::new(Method::GET, "/thing"));
        assert_eq!(get.status, StatusCode::NOT_FOUND);
        let post = service.handle(RawRequest::new(Method::POST, "/thing"));
        assert_eq!(body(post), "post");
    }

    #[test]
    fn test_apply_config_switches_method_override() {
        let service = Service::new();
        service.delete("/item", |_, _| Ok("deleted")).unwrap();
        let overridden = || {
            RawRequest::new(Method::POST, "/item").header("X-HTTP-Method-Override", "DELETE")
        };

        assert_eq!(body(service.handle(overridden())), "deleted");

        service.apply_config(RoutingConfig {
            method_override: false,
            ..RoutingConfig::default()
        });
        assert!(!service.settings().method_override);
        assert_eq!(service.handle(overridden()).status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_stop_clears_everything() {
        let service = Service::new();
        service.get("/a", |_, _| Ok("a")).unwrap();
        service.not_found("custom");
        service.exception::<std::fmt::Error, _>(|_, _, _| Ok(()));

        service.stop();
        assert!(service.routes().is_empty());
        let finished = service.handle(RawRequest::new(Method::GET, "/a"));
        assert_eq!(finished.status, StatusCode::NOT_FOUND);
        assert_eq!(body(finished), pipeline::error_pages::NOT_FOUND);
    }
}
