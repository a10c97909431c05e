// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broker publish port implementations.
//!
//! - [`LogPublisher`] writes every message to the log and always succeeds.
//!   Useful for local runs without a broker.
//! - [`KafkaRestPublisher`] produces to a Kafka REST Proxy (v2 API).
//!
//! [`build_publisher`] picks one from the `[broker]` config section.

pub mod kafka_rest;
pub mod log;

use std::sync::Arc;
use std::time::Duration;

use custreg_config::model::{BrokerConfig, BrokerKind};
use custreg_core::{BrokerPublisher, RegistryError};

pub use kafka_rest::KafkaRestPublisher;
pub use log::LogPublisher;

/// Build the publisher selected by `config.kind`.
pub fn build_publisher(config: &BrokerConfig) -> Result<Arc<dyn BrokerPublisher>, RegistryError> {
    match config.kind {
        BrokerKind::Log => Ok(Arc::new(LogPublisher::new())),
        BrokerKind::KafkaRest => {
            let url = config.rest_url.as_deref().ok_or_else(|| {
                RegistryError::Config("broker.rest_url is required for kind = \"kafka_rest\"".into())
            })?;
            let publisher = KafkaRestPublisher::new(
                url,
                Duration::from_secs(config.request_timeout_secs),
            )?;
            Ok(Arc::new(publisher))
        }
    }
}
