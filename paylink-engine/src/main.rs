//! Paylink payment verification engine HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # Run with default config (config.toml in current directory)
//! cargo run -p paylink-engine --release
//!
//! # Run with custom config path
//! CONFIG=/path/to/config.toml cargo run -p paylink-engine
//!
//! # Configure logging level
//! RUST_LOG=info cargo run -p paylink-engine
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to TOML configuration file (default: `config.toml`)
//! - `HOST` / `PORT` - Override bind address and port
//! - `RUST_LOG` - Log level filter (default: `info`)

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::Method;
use axum::{Json, Router};
use tokio_util::sync::CancellationToken;
use tower_http::cors;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use paylink::ledger::MemoryLedger;
use paylink_engine::config::EngineConfig;
use paylink_engine::engine::{EngineOptions, PaymentEngine};
use paylink_engine::handlers::engine_router;
use paylink_evm::ChainAccess;

#[tokio::main]
async fn main() {
    // Initialize tracing with RUST_LOG env filter
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    dotenvy::dotenv().ok();

    if let Err(e) = run().await {
        tracing::error!("Engine failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::load()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        chains = config.chains.len(),
        cache_ttl_secs = config.cache_ttl_secs,
        freshness_window_secs = config.freshness_window_secs,
        "Loaded configuration"
    );

    let endpoints = config.endpoints();
    if endpoints.is_empty() {
        tracing::warn!("No chains configured - verification requests will be rejected");
    }

    let reader = Arc::new(ChainAccess::new(endpoints, config.rpc_timeout()));

    // The in-memory ledger serves local runs and development; production
    // deployments implement `PaymentLedger` against the platform's
    // relational store, whose unique tx-hash index enforces exactly-once
    // recording across processes.
    let ledger = Arc::new(MemoryLedger::new());

    let engine = Arc::new(PaymentEngine::new(
        reader,
        ledger,
        EngineOptions {
            cache_ttl: config.cache_ttl(),
            freshness_window: config.freshness_window(),
            scan_lookback: config.scan_lookback_blocks,
            tokens: config.tokens(),
        },
    ));

    let shutdown = CancellationToken::new();
    let sweeper = engine.spawn_cache_sweeper(config.cache_sweep_interval(), shutdown.clone());

    let app = Router::new()
        .merge(engine_router(Arc::clone(&engine)))
        .route("/health", axum::routing::get(health))
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(cors::Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Engine listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.cancel();
    sweeper.await?;
    tracing::info!("Engine shut down gracefully");
    Ok(())
}

/// Health check endpoint.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Waits for Ctrl-C or SIGTERM (Unix) to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down..."),
            _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down..."),
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.expect("failed to listen for Ctrl-C");
        tracing::info!("Received Ctrl-C, shutting down...");
    }
}
