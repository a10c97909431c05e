// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.

use std::sync::Arc;
use std::time::Instant;

use axum::routing::{get, patch, post, put};
use axum::Router;
use custreg_core::{OutboxStore, PluginAdapter, RegistryError};
use custreg_customer::CustomerService;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Shared state for the `/health` and `/metrics` endpoints.
#[derive(Clone)]
pub struct HealthState {
    pub start_time: Instant,
    /// Outbox backlog source for the health report.
    pub outbox: Arc<dyn OutboxStore>,
    /// Backends whose health checks are folded into `/health`.
    pub adapters: Vec<Arc<dyn PluginAdapter>>,
    /// Renders Prometheus text. `/metrics` answers 404 when unset.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

/// State shared by every route.
#[derive(Clone)]
pub struct GatewayState {
    pub service: CustomerService,
    pub health: HealthState,
}

/// Gateway server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Build the full route table.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route(
            "/api/customers",
            post(handlers::create_customer).get(handlers::list_customers),
        )
        .route("/api/customers/enquiry", post(handlers::create_enquiry))
        .route("/api/customers/search", get(handlers::search_customers))
        .route(
            "/api/customers/status/{status}",
            get(handlers::list_by_status),
        )
        .route("/api/customers/uuid/{uuid}", get(handlers::get_by_uuid))
        .route("/api/customers/pan/{pan}", get(handlers::get_by_pan))
        .route("/api/customers/email/{email}", get(handlers::get_by_email))
        .route(
            "/api/customers/{id}",
            get(handlers::get_customer).put(handlers::update_customer),
        )
        .route("/api/customers/{id}/kyc", put(handlers::complete_kyc))
        .route("/api/customers/{id}/status", patch(handlers::update_status))
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .fallback(handlers::route_not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind `host:port` and serve until `cancel` fires.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), RegistryError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        RegistryError::Internal(format!("failed to bind gateway to {addr}: {e}"))
    })?;
    serve(listener, state, cancel).await
}

/// Serve on an already-bound listener until `cancel` fires.
pub async fn serve(
    listener: TcpListener,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), RegistryError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("gateway listening on {addr}");
    }
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| RegistryError::Internal(format!("gateway server error: {e}")))?;
    tracing::info!("gateway stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_debug() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("127.0.0.1"));
        assert!(debug.contains("8080"));
    }
}
