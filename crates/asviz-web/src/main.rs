// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! asviz-web - SCION AS Viewer with Web UI
//!
//! Serves one query page that shows the topology graph, the segment and path
//! graph, and the nested segment/path listing for a source/destination pair,
//! plus JSON endpoints for the same data.
//!
//! # Usage
//!
//! ```bash
//! # Start on default port 8000
//! asviz-web
//!
//! # Custom port, generated topology root and daemon socket directory
//! asviz-web --port 9000 --gen-dir /opt/scion/gen --socket-dir /run/shm/sciond
//! ```
//!
//! # Endpoints
//!
//! - `GET /?src=1-18&dst=2-26&tab=paths&data=sdapi&mp=5&addr=` - Query page
//! - `GET /api/v1/report` - Full report (same query parameters)
//! - `GET /api/v1/topology` - Topology graph
//! - `GET /api/v1/paths` - Segment/path link graph and path links
//! - `GET /api/v1/segments` - Raw segment listing
//! - `GET /api/v1/info` - Server info

mod handlers;
mod routes;

use asviz::{DaemonPool, ViewerConfig};
use axum::Router;
use clap::Parser;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;
use tera::Tera;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// SCION AS Viewer web server
#[derive(Parser, Debug)]
#[command(name = "asviz-web")]
#[command(about = "SCION AS topology and path viewer with Web UI")]
#[command(version)]
struct Args {
    /// HTTP server port
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Bind address
    #[arg(short, long, default_value = "127.0.0.1")]
    bind: String,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the path daemon sockets
    #[arg(long)]
    socket_dir: Option<PathBuf>,

    /// Root of the generated per-AS configuration tree
    #[arg(long)]
    gen_dir: Option<PathBuf>,

    /// Default daemon bind address
    #[arg(long)]
    addr: Option<Ipv4Addr>,

    /// Never start a missing path daemon
    #[arg(long)]
    no_launch: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Disable Web UI (API only)
    #[arg(long)]
    api_only: bool,
}

/// Shared application state
pub struct AppState {
    pool: DaemonPool,
    config: ViewerConfig,
    templates: Tera,
}

impl AppState {
    pub fn new(config: ViewerConfig) -> Result<Self, tera::Error> {
        Ok(Self {
            pool: config.build_pool(),
            templates: handlers::load_templates()?,
            config,
        })
    }

    pub fn templates(&self) -> &Tera {
        &self.templates
    }

    pub fn pool(&self) -> &DaemonPool {
        &self.pool
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }
}

fn load_config(args: &Args) -> Result<ViewerConfig, asviz::ConfigError> {
    let mut config = match &args.config {
        Some(path) => ViewerConfig::from_file(path)?,
        None => ViewerConfig::default(),
    };
    if let Some(dir) = &args.socket_dir {
        config.socket_dir = dir.clone();
    }
    if let Some(dir) = &args.gen_dir {
        config.gen_dir = dir.clone();
    }
    if args.addr.is_some() {
        config.addr = args.addr;
    }
    if args.no_launch {
        config.auto_launch = false;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Setup logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = load_config(&args)?;
    info!("asviz-web v{}", env!("CARGO_PKG_VERSION"));
    info!("Daemon sockets: {}", config.socket_dir.display());
    info!("Generated topology: {}", config.gen_dir.display());

    let state = Arc::new(AppState::new(config)?);
    let app = build_router(state, args.api_only);

    let addr = format!("{}:{}", args.bind, args.port);
    info!("HTTP server: http://{}", addr);
    if !args.api_only {
        info!("Web UI: http://{}/", addr);
    }

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, api_only: bool) -> Router {
    let mut router = Router::new();

    // API routes (v1)
    router = router.merge(routes::api_routes());

    // Web UI routes (unless api_only)
    if !api_only {
        router = router.merge(routes::ui_routes());
    }

    router
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
