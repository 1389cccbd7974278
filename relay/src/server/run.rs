// Run and routing helpers (build_router, run_server, static serving).

use std::net::SocketAddr;
use std::path::Path;

use axum::{routing::get, Json, Router};
use tower_http::services::ServeDir;

use crate::server::{http, ws, AppState};
use anyhow::{Context, Result};

pub fn build_router(state: AppState, public_dir: &Path) -> Router {
    // The game client is a static bundle served next to the relay.
    let serve_public = ServeDir::new(public_dir).append_index_html_on_directories(true);

    Router::new()
        .route(
            "/health",
            get(|| async { Json(serde_json::json!({ "ok": true })) }),
        )
        .route("/ws", get(ws::ws_handler))
        .route(
            "/api/lobbies/:id",
            get(http::exists_handler).post(http::create_handler),
        )
        .fallback_service(serve_public)
        .with_state(state)
}

pub async fn run_server(addr: SocketAddr, state: AppState) -> Result<()> {
    let public_dir = state.config.read().await.public_dir.clone();
    let app = build_router(state.clone(), &public_dir);

    let display_addr = if addr.ip().to_string() == "127.0.0.1" {
        format!("localhost:{}", addr.port())
    } else {
        addr.to_string()
    };

    tracing::info!(display_addr = %display_addr, "lobby relay running");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", display_addr))?;
    axum::serve(listener, app)
        .await
        .context("serving HTTP/WebSocket traffic")?;
    Ok(())
}
