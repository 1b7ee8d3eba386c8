//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all dispatcher
//! - Wire up middleware (request ID, tracing, timeout)
//! - Buffer each request and run it through the `Service` on a blocking thread
//! - Serve the route listing when an admin endpoint is configured
//! - Apply hot-reloaded routing settings
//! - Record request metrics

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::http::request::RawRequest;
use crate::http::response::serialize;
use crate::observability::metrics;
use crate::pipeline::error_pages;
use crate::service::Service;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a UUID v4 for requests that arrive without an ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
struct AppState {
    service: Service,
    max_body_bytes: usize,
    routes_endpoint: Option<String>,
}

/// HTTP transport adapter for a `Service`.
pub struct HttpServer {
    service: Service,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a server; the config's routing section is applied to `service`.
    pub fn new(service: Service, config: ServerConfig) -> Self {
        service.apply_config(config.routing.clone());
        Self { service, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn router(&self) -> Router {
        let state = AppState {
            service: self.service.clone(),
            max_body_bytes: self.config.limits.max_body_bytes,
            routes_endpoint: self.config.admin.routes_endpoint.clone(),
        };

        Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                        let request_id = request
                            .headers()
                            .get(X_REQUEST_ID)
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or("unknown");
                        tracing::info_span!(
                            "request",
                            request_id = %request_id,
                            method = %request.method(),
                            path = %request.uri().path()
                        )
                    }))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        self.config.timeouts.request_secs,
                    ))),
            )
    }

    /// Run the server until `shutdown` fires, applying config updates as
    /// they arrive.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ServerConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.service.route_table().len(),
            "HTTP server starting"
        );

        let service = self.service.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                service.apply_config(config.routing);
            }
        });

        let app = self
            .router()
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn service(&self) -> &Service {
        &self.service
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Catch-all handler: buffer, run the lifecycle off the async runtime,
/// serialize.
async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let method = parts.method.clone();

    if method == Method::GET && state.routes_endpoint.as_deref() == Some(parts.uri.path()) {
        metrics::record_request(method.as_str(), 200, start);
        return Json(state.service.routes()).into_response();
    }

    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(
                method = %method,
                path = %parts.uri.path(),
                error = %e,
                "Request body rejected"
            );
            metrics::record_request(method.as_str(), 413, start);
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let raw = RawRequest {
        method: parts.method,
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        remote_addr: parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr),
        headers: parts.headers,
        body,
    };

    let default_content_type = state.service.settings().default_content_type.clone();
    let service = state.service.clone();
    let response = match tokio::task::spawn_blocking(move || service.handle(raw)).await {
        Ok(finished) => serialize(finished, &default_content_type),
        Err(e) => {
            tracing::error!(method = %method, error = %e, "Request handler panicked");
            let mut response = Response::new(Body::from(error_pages::INTERNAL_ERROR));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            if let Ok(value) = HeaderValue::from_str(&default_content_type) {
                response
                    .headers_mut()
                    .insert(axum::http::header::CONTENT_TYPE, value);
            }
            response
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}
