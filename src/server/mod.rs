//! HTTP API server wrapping a collection registry.

pub mod routes;

use crate::metrics::MetricsCollector;
use crate::registry::CollectionRegistry;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

/// Shared application state for the HTTP server.
#[derive(Debug, Default)]
pub struct AppState {
    pub registry: CollectionRegistry,
    pub metrics: RwLock<MetricsCollector>,
}

impl AppState {
    pub fn new(registry: CollectionRegistry) -> Self {
        Self {
            registry,
            metrics: RwLock::new(MetricsCollector::new()),
        }
    }
}

/// Serve `registry` over HTTP until the process is stopped.
pub async fn start(addr: &str, registry: CollectionRegistry) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(registry));

    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr, "Server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
