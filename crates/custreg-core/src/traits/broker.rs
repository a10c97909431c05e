// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broker publish port.

use async_trait::async_trait;

use crate::error::RegistryError;
use crate::traits::adapter::PluginAdapter;

/// Sends one message to a message broker.
///
/// The outcome is binary: `Ok(())` means the broker acknowledged the
/// message, any `Err` means it must be treated as not delivered. A publisher
/// may be called again for a message it already delivered (at-least-once).
#[async_trait]
pub trait BrokerPublisher: PluginAdapter {
    /// Publish `body` to `topic`, partitioned by `key`.
    async fn publish(&self, topic: &str, key: &str, body: &[u8]) -> Result<(), RegistryError>;
}
