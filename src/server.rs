//! Metrics and health HTTP surface
//!
//! Small read-only server over the snapshot store:
//! - `GET /metrics` - Prometheus text exposition, always 200
//! - `GET /health` - JSON readiness probe, 503 until the first
//!   primary-backed snapshot exists
//!
//! Handlers never block on collection; they read whatever snapshot is
//! currently published and return immediately.

use crate::metrics;
use crate::store::{Current, SnapshotStore};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
struct AppState {
    store: Arc<SnapshotStore>,
    started_at: Instant,
}

/// Build the router serving `/metrics` and `/health`
pub fn router(store: Arc<SnapshotStore>, started_at: Instant) -> Router {
    let state = AppState { store, started_at };
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Bind and serve until the process exits
pub async fn serve(
    store: Arc<SnapshotStore>,
    port: u16,
    started_at: Instant,
) -> Result<(), std::io::Error> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Metrics server listening on {}", addr);
    axum::serve(listener, router(store, started_at)).await
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    let body = metrics::render_metrics(&state.store.current(), state.started_at.elapsed());
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, metrics::CONTENT_TYPE)],
        body,
    )
        .into_response()
}

async fn health_handler(State(state): State<AppState>) -> Response {
    let uptime = state.started_at.elapsed().as_secs();
    match state.store.current() {
        Current::Ready(snapshot) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "uptime_seconds": uptime,
                "degraded": snapshot.degraded,
                "last_update": snapshot.collected_at.to_rfc3339(),
            })),
        )
            .into_response(),
        Current::NotReady => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "uptime_seconds": uptime,
            })),
        )
            .into_response(),
    }
}
