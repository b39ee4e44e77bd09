//! HTTP server assembly: MCP under `/mcp`, health, OAuth discovery stubs.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use wick::{McpState, SessionStore};

use crate::api::LanternHandler;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(30);
const MAX_IDLE: Duration = Duration::from_secs(1800);

#[derive(Clone)]
struct HealthState {
    sessions: Arc<dyn SessionStore>,
    tools: usize,
    start_time: Instant,
}

async fn health_handler(State(state): State<HealthState>) -> Json<Value> {
    let sessions = state.sessions.stats();
    Json(json!({
        "status": "healthy",
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
        "tools": state.tools,
        "sessions": sessions,
    }))
}

/// Return 404 with JSON to indicate no OAuth required
async fn no_oauth() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "application/json")],
        r#"{"error": "not_found", "error_description": "This MCP server does not require authentication"}"#,
    )
}

pub fn app_router(state: Arc<McpState<LanternHandler>>, start_time: Instant) -> Router {
    let health_state = HealthState {
        sessions: state.sessions.clone(),
        tools: state.handler.invoker.registry().len(),
        start_time,
    };

    let health_router = Router::new()
        .route("/health", get(health_handler))
        .with_state(health_state);

    Router::new()
        .merge(health_router)
        .route("/mcp/.well-known/oauth-authorization-server", get(no_oauth))
        .route("/mcp/.well-known/oauth-protected-resource", get(no_oauth))
        .route("/.well-known/oauth-authorization-server", get(no_oauth))
        .route("/.well-known/oauth-protected-resource", get(no_oauth))
        .nest("/mcp", wick::streamable_router(state))
}

/// Serve until SIGINT or SIGTERM.
pub async fn serve_http(state: Arc<McpState<LanternHandler>>, addr: SocketAddr) -> Result<()> {
    let shutdown = CancellationToken::new();

    let cleanup = wick::spawn_cleanup_task(
        state.sessions.clone(),
        CLEANUP_INTERVAL,
        MAX_IDLE,
        shutdown.clone(),
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("MCP endpoint: http://{}/mcp", addr);
    tracing::info!("Health: GET http://{}/health", addr);

    let router = app_router(state, Instant::now());
    let server_token = shutdown.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                server_token.cancelled().await;
                tracing::info!("Server shutdown signal received");
            })
            .await
    });

    wait_for_signal().await;
    shutdown.cancel();

    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("Server shutdown with error: {:?}", e),
        Err(e) => tracing::error!("Server task failed: {:?}", e),
    }
    if let Err(e) = cleanup.await {
        tracing::warn!("Session cleanup task failed: {:?}", e);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolve on SIGINT (Ctrl+C) or SIGTERM.
async fn wait_for_signal() {
    let sigterm = async {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::warn!("Failed to set up SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            }
            tracing::info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = sigterm => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}
