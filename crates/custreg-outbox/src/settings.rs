// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::time::Duration;

use custreg_config::model::OutboxConfig;

/// Relay tuning, resolved from `[outbox]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySettings {
    /// Broker topic every event is published to.
    pub topic: String,
    /// Maximum events selected per cycle.
    pub batch_size: usize,
    /// Delay between the end of one cycle and the start of the next.
    pub interval: Duration,
    pub publish_timeout: Duration,
    /// Failed attempts after which an event becomes `FAILED`.
    pub max_retries: u32,
    pub lease_ttl: Duration,
    /// Lease holder identity of this process.
    pub worker_id: String,
}

impl From<&OutboxConfig> for RelaySettings {
    fn from(config: &OutboxConfig) -> Self {
        Self {
            topic: config.topic.clone(),
            batch_size: config.batch_size,
            interval: Duration::from_secs(config.interval_secs),
            publish_timeout: Duration::from_millis(config.publish_timeout_ms),
            max_retries: config.max_retries,
            lease_ttl: Duration::from_secs(config.lease_ttl_secs),
            worker_id: config.worker_id.clone(),
        }
    }
}
