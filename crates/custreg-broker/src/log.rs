// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Publisher that only logs.

use async_trait::async_trait;
use custreg_core::{AdapterType, BrokerPublisher, HealthStatus, PluginAdapter, RegistryError};
use tracing::info;

/// Writes each message to the `tracing` log instead of a broker.
#[derive(Debug, Default, Clone)]
pub struct LogPublisher;

impl LogPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PluginAdapter for LogPublisher {
    fn name(&self) -> &str {
        "log"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Broker
    }

    async fn health_check(&self) -> Result<HealthStatus, RegistryError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RegistryError> {
        Ok(())
    }
}

#[async_trait]
impl BrokerPublisher for LogPublisher {
    async fn publish(&self, topic: &str, key: &str, body: &[u8]) -> Result<(), RegistryError> {
        info!(
            topic,
            key,
            bytes = body.len(),
            body = %String::from_utf8_lossy(body),
            "message published to log broker"
        );
        Ok(())
    }
}
