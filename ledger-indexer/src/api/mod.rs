//! Metrics and health endpoints

pub mod metrics;

pub use metrics::Metrics;

use crate::core::error::IndexerResult;
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

/// A running metrics server
pub struct MetricsServer {
    pub addr: SocketAddr,
    pub handle: JoinHandle<()>,
}

/// Router serving `/metrics` and `/health`
pub fn metrics_router(metrics: Arc<Metrics>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(metrics)
        .layer(TraceLayer::new_for_http())
}

/// Start the metrics server; port 0 picks a free port
pub async fn start_metrics_server(port: u16, metrics: Arc<Metrics>) -> IndexerResult<MetricsServer> {
    let app = metrics_router(metrics);

    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    let addr = listener.local_addr()?;
    info!("Metrics server listening on {}", addr);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Metrics server error: {}", e);
        }
    });

    Ok(MetricsServer { addr, handle })
}

async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().timestamp(),
        "service": "ledger-indexer"
    }))
}

async fn metrics_handler(State(metrics): State<Arc<Metrics>>) -> Result<String, StatusCode> {
    metrics.encode().map_err(|e| {
        tracing::error!("Failed to encode metrics: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}
