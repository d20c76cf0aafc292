//! HTTP transport — JSON-RPC over `POST /mcp` plus a health probe.
//!
//! The body is taken as a raw string rather than through the `Json`
//! extractor so malformed JSON still produces a proper JSON-RPC
//! `-32700` response instead of a bare 400. Notifications return
//! `202 Accepted` with no body. `GET /health` answers `{"status":"ok"}`
//! for load balancers and k8s probes.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::server::{McpHandler, error_response};

/// Build the transport router around a shared handler.
pub fn router(handler: Arc<McpHandler>) -> Router {
    Router::new()
        .route("/mcp", post(handle_mcp_request))
        .route("/health", get(handle_health))
        .with_state(handler)
}

/// Run the HTTP server on `0.0.0.0:{port}`, blocking until shutdown.
///
/// # Errors
///
/// Returns an error if the runtime cannot be built, the port cannot be
/// bound, or the server fails while serving.
pub fn run_http_server(config: &ServerConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    runtime.block_on(serve(config))
}

async fn serve(config: &ServerConfig) -> Result<()> {
    let app = router(Arc::new(McpHandler::new(config)));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(
        addr = %addr,
        project_root = %config.project_root.display(),
        artifacts_root = %config.artifacts_root.display(),
        "project-mcp server starting (http)"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server error")?;

    info!("project-mcp server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// `POST /mcp`: one JSON-RPC message per request.
///
/// Dispatch runs on the blocking pool; tool calls may sit in
/// subprocesses for minutes and must not stall the async workers.
async fn handle_mcp_request(State(handler): State<Arc<McpHandler>>, body: String) -> Response {
    let result = tokio::task::spawn_blocking(move || {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Some(error_response(None, -32700, "parse error: empty request body"));
        }
        handler.handle_line(trimmed)
    })
    .await;

    match result {
        Ok(Some(resp)) => (StatusCode::OK, Json(resp)).into_response(),
        // Notification: acknowledged, no body.
        Ok(None) => StatusCode::ACCEPTED.into_response(),
        Err(e) => {
            error!(error = %e, "request task failed");
            let resp = error_response(None, -32603, "internal error: request task failed");
            (StatusCode::OK, Json(resp)).into_response()
        }
    }
}
