// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock broker for deterministic relay testing.
//!
//! `MockBroker` implements `BrokerPublisher`, records every call in order and
//! can be scripted to fail or stall by key, by call index, or for all calls.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use custreg_core::traits::adapter::PluginAdapter;
use custreg_core::traits::broker::BrokerPublisher;
use custreg_core::types::{AdapterType, HealthStatus};
use custreg_core::RegistryError;

/// One publish call as seen by the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub key: String,
    pub body: Vec<u8>,
}

impl PublishedMessage {
    pub fn body_str(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap_or("")
    }
}

#[derive(Default)]
struct Script {
    fail_keys: HashSet<String>,
    fail_calls: HashSet<usize>,
    fail_all: bool,
    stall_keys: HashSet<String>,
    stall_all: bool,
}

#[derive(Default)]
struct State {
    attempts: Vec<PublishedMessage>,
    delivered: Vec<PublishedMessage>,
    script: Script,
}

/// A broker that remembers what it was asked to publish.
///
/// `attempts()` lists every call; `delivered()` only the calls that
/// succeeded. Call indexes for [`MockBroker::fail_call`] are zero-based over
/// all attempts.
#[derive(Default)]
pub struct MockBroker {
    state: Mutex<State>,
}

impl MockBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every publish whose key is `key`.
    pub async fn fail_key(&self, key: &str) {
        self.state.lock().await.script.fail_keys.insert(key.to_string());
    }

    /// Fail the `index`-th publish call.
    pub async fn fail_call(&self, index: usize) {
        self.state.lock().await.script.fail_calls.insert(index);
    }

    /// Fail every publish.
    pub async fn fail_all(&self) {
        self.state.lock().await.script.fail_all = true;
    }

    /// Never return from publishes whose key is `key`.
    pub async fn stall_key(&self, key: &str) {
        self.state.lock().await.script.stall_keys.insert(key.to_string());
    }

    /// Never return from any publish.
    pub async fn stall_all(&self) {
        self.state.lock().await.script.stall_all = true;
    }

    /// Clear all scripted failures and stalls.
    pub async fn heal(&self) {
        self.state.lock().await.script = Script::default();
    }

    pub async fn attempts(&self) -> Vec<PublishedMessage> {
        self.state.lock().await.attempts.clone()
    }

    pub async fn delivered(&self) -> Vec<PublishedMessage> {
        self.state.lock().await.delivered.clone()
    }

    /// Keys of delivered messages, in delivery order.
    pub async fn delivered_keys(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .delivered
            .iter()
            .map(|m| m.key.clone())
            .collect()
    }
}

enum Outcome {
    Deliver,
    Fail,
    Stall,
}

#[async_trait]
impl PluginAdapter for MockBroker {
    fn name(&self) -> &str {
        "mock-broker"
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
impl BrokerPublisher for MockBroker {
    async fn publish(&self, topic: &str, key: &str, body: &[u8]) -> Result<(), RegistryError> {
        let message = PublishedMessage {
            topic: topic.to_string(),
            key: key.to_string(),
            body: body.to_vec(),
        };

        let outcome = {
            let mut state = self.state.lock().await;
            let index = state.attempts.len();
            state.attempts.push(message.clone());
            let script = &state.script;
            if script.stall_all || script.stall_keys.contains(key) {
                Outcome::Stall
            } else if script.fail_all
                || script.fail_keys.contains(key)
                || script.fail_calls.contains(&index)
            {
                Outcome::Fail
            } else {
                state.delivered.push(message);
                Outcome::Deliver
            }
        };

        match outcome {
            Outcome::Deliver => Ok(()),
            Outcome::Fail => Err(RegistryError::Publish {
                message: format!("mock broker rejected key {key}"),
                source: None,
            }),
            Outcome::Stall => std::future::pending().await,
        }
    }
}
