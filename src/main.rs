//! Waypoint demo server.
//!
//! Loads configuration, registers a small set of routes and serves them
//! until SIGINT/SIGTERM.

use std::path::PathBuf;

use axum::http::StatusCode;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use waypoint::config::{load_config, ConfigWatcher, ServerConfig};
use waypoint::observability::{logging, metrics};
use waypoint::{halt, Cookie, HttpMethod, HttpServer, Routable, RouteError, Service, Shutdown};

#[derive(Parser)]
#[command(name = "waypoint")]
#[command(about = "HTTP routing layer demo server", long_about = None)]
struct Cli {
    /// TOML configuration file; watched for changes when given.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "waypoint starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        max_body_bytes = config.limits.max_body_bytes,
        method_override = config.routing.method_override,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let service = Service::new();
    register_routes(&service)?;

    // Keep the watcher alive for the lifetime of the server.
    let (config_updates, _watcher) = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            let watcher = watcher.with_current(config.clone());
            (updates, Some(watcher.run()?))
        }
        None => (mpsc::unbounded_channel().1, None),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let _signals = shutdown.trigger_on_signal();

    let server = HttpServer::new(service.clone(), config);
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    service.stop();
    tracing::info!("Shutdown complete");
    Ok(())
}

fn register_routes(service: &Service) -> Result<(), RouteError> {
    // Registered first: among equally acceptable routes the earliest wins.
    service.on(HttpMethod::Get, "/hello", "application/json", |_, res| {
        res.set_content_type("application/json")?;
        Ok(serde_json::json!({ "message": "Hello World!" }))
    })?;
    service.get("/hello", |_, _| Ok("Hello World!"))?;

    service.get("/hello/:name", |req, _| {
        Ok(format!("Hello, {}!", req.param("name").unwrap_or_default()))
    })?;

    service.get("/square/:n", |req, _| {
        let n: i64 = req.param("n").unwrap_or_default().parse()?;
        match n.checked_mul(n) {
            Some(square) => Ok(square.to_string()),
            None => Err(halt(StatusCode::BAD_REQUEST, "number too large")),
        }
    })?;

    service.get("/visits", |req, res| {
        let visits = req.cookie("visits").and_then(|v| v.parse::<u64>().ok()).unwrap_or(0).saturating_add(1);
        res.set_cookie(
            Cookie::build(("visits", visits.to_string()))
                .path("/")
                .http_only(true)
                .build(),
        )?;
        Ok(format!("visit #{}", visits))
    })?;

    service.redirect().get("/hi", "/hello")?;

    service.before("/protected/*", |req, _| match req.header("authorization") {
        Some(_) => Ok(()),
        None => Err(halt(StatusCode::UNAUTHORIZED, "Go Away!")),
    })?;

    service.get("/protected/resource", |_, _| Ok("secret"))?;

    service.after_always_all(|_, res| {
        res.header("x-served-by", "waypoint")?;
        Ok(())
    })?;

    service.exception::<std::num::ParseIntError, _>(|err, _, res| {
        res.set_status(StatusCode::BAD_REQUEST);
        res.set_body(format!("not a number: {}", err));
        Ok(())
    });

    Ok(())
}
