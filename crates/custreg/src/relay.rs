// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `custreg relay`: the outbox relay without the gateway.

use std::sync::Arc;

use custreg_config::RegistryConfig;
use custreg_core::{BrokerPublisher, RegistryError};
use custreg_outbox::{CycleOutcome, Relay, RelaySettings};
use custreg_storage::SqliteStorage;
use tracing::info;

use crate::serve::{init_tracing, shutdown_backends};
use crate::shutdown;

struct RelayParts {
    storage: Arc<SqliteStorage>,
    broker: Arc<dyn BrokerPublisher>,
    relay: Arc<Relay>,
}

async fn build_relay(config: &RegistryConfig) -> Result<RelayParts, RegistryError> {
    let storage = Arc::new(SqliteStorage::open(&config.storage).await?);
    let broker = custreg_broker::build_publisher(&config.broker)?;
    let relay = Relay::new(
        storage.clone(),
        broker.clone(),
        RelaySettings::from(&config.outbox),
    );
    Ok(RelayParts {
        storage,
        broker,
        relay: Arc::new(relay),
    })
}

/// One-line summary printed by `custreg relay --once`.
fn describe(outcome: &CycleOutcome) -> String {
    match outcome {
        CycleOutcome::Completed(report) => format!("relay cycle completed: {report}"),
        CycleOutcome::Overlapping => "relay cycle skipped: a cycle is already running".to_string(),
        CycleOutcome::LeaseUnavailable => {
            "relay cycle skipped: another worker holds the relay lease".to_string()
        }
    }
}

/// Run exactly one cycle and print its report.
pub async fn run_once(config: RegistryConfig) -> Result<(), RegistryError> {
    init_tracing(&config.service.log_level);
    let parts = build_relay(&config).await?;
    let outcome = parts.relay.run_cycle().await;
    shutdown_backends(None, parts.broker.as_ref(), &parts.storage).await;
    println!("{}", describe(&outcome?));
    Ok(())
}

/// Run the relay loop until SIGINT/SIGTERM.
pub async fn run_relay(config: RegistryConfig) -> Result<(), RegistryError> {
    init_tracing(&config.service.log_level);
    let parts = build_relay(&config).await?;
    info!(worker_id = %config.outbox.worker_id, "starting standalone relay");

    let cancel = shutdown::install_signal_handler();
    let task = parts.relay.clone().spawn(cancel);
    shutdown_backends(Some(task), parts.broker.as_ref(), &parts.storage).await;
    info!("relay stopped");
    Ok(())
}
