// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `custreg serve`: gateway plus in-process outbox relay.

use std::sync::Arc;
use std::time::Instant;

use custreg_config::RegistryConfig;
use custreg_core::{BrokerPublisher, PluginAdapter, RegistryError};
use custreg_customer::CustomerService;
use custreg_gateway::{GatewayState, HealthState, ServerConfig};
use custreg_outbox::{Relay, RelaySettings};
use custreg_prometheus::PrometheusAdapter;
use custreg_storage::SqliteStorage;
use tracing::{error, info, warn};

use crate::shutdown;

/// Run the service until SIGINT/SIGTERM.
pub async fn run_serve(config: RegistryConfig) -> Result<(), RegistryError> {
    init_tracing(&config.service.log_level);
    info!(service = %config.service.name, "starting custreg");

    let storage = Arc::new(SqliteStorage::open(&config.storage).await?);
    let broker = custreg_broker::build_publisher(&config.broker)?;
    info!(broker = broker.name(), topic = %config.outbox.topic, "broker publisher ready");

    let prometheus = if config.prometheus.enabled {
        Some(Arc::new(PrometheusAdapter::new()?))
    } else {
        None
    };

    let cancel = shutdown::install_signal_handler();

    let relay_task = if config.outbox.relay_enabled {
        let relay = Arc::new(Relay::new(
            storage.clone(),
            broker.clone(),
            RelaySettings::from(&config.outbox),
        ));
        Some(relay.spawn(cancel.clone()))
    } else {
        info!("outbox relay disabled; events stay PENDING until a relay runs");
        None
    };

    if config.gateway.enabled {
        let state = gateway_state(&storage, &broker, prometheus);
        let server = ServerConfig {
            host: config.gateway.host.clone(),
            port: config.gateway.port,
        };
        if let Err(e) = custreg_gateway::start_server(&server, state, cancel.clone()).await {
            error!(error = %e, "gateway failed");
            cancel.cancel();
            shutdown_backends(relay_task, broker.as_ref(), &storage).await;
            return Err(e);
        }
    } else {
        cancel.cancelled().await;
    }

    cancel.cancel();
    shutdown_backends(relay_task, broker.as_ref(), &storage).await;
    info!("custreg stopped");
    Ok(())
}

/// Gateway state over the running backends. Storage, broker and (when
/// enabled) Prometheus all report through `/health`.
pub(crate) fn gateway_state(
    storage: &Arc<SqliteStorage>,
    broker: &Arc<dyn BrokerPublisher>,
    prometheus: Option<Arc<PrometheusAdapter>>,
) -> GatewayState {
    let storage_adapter: Arc<dyn PluginAdapter> = storage.clone();
    let broker_adapter: Arc<dyn PluginAdapter> = broker.clone();
    let mut adapters = vec![storage_adapter, broker_adapter];
    let prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>> =
        prometheus.map(|adapter| {
            adapters.push(adapter.clone());
            Arc::new(move || adapter.render()) as Arc<dyn Fn() -> String + Send + Sync>
        });
    GatewayState {
        service: CustomerService::new(storage.database().clone()),
        health: HealthState {
            start_time: Instant::now(),
            outbox: storage.clone(),
            adapters,
            prometheus_render,
        },
    }
}

/// Wait for the relay to finish its current cycle, then close backends.
pub(crate) async fn shutdown_backends(
    relay_task: Option<tokio::task::JoinHandle<()>>,
    broker: &dyn BrokerPublisher,
    storage: &SqliteStorage,
) {
    if let Some(task) = relay_task
        && let Err(e) = task.await
    {
        warn!(error = %e, "relay task ended abnormally");
    }
    if let Err(e) = broker.shutdown().await {
        warn!(error = %e, "broker shutdown failed");
    }
    if let Err(e) = storage.shutdown().await {
        warn!(error = %e, "storage shutdown failed");
    }
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the config level.
pub(crate) fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("custreg={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
