// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Kafka REST Proxy publisher.
//!
//! Produces one record per call via `POST {base}/topics/{topic}` using the
//! v2 binary embedded format. Key and value are base64-encoded; the key is the
//! aggregate id so the proxy partitions all events of one customer together.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use custreg_core::{AdapterType, BrokerPublisher, HealthStatus, PluginAdapter, RegistryError};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const BINARY_CONTENT_TYPE: &str = "application/vnd.kafka.binary.v2+json";
const ACCEPT_V2: &str = "application/vnd.kafka.v2+json";

#[derive(Debug, Serialize)]
struct ProduceRequest<'a> {
    records: [ProduceRecord<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ProduceRecord<'a> {
    key: &'a str,
    value: &'a str,
}

#[derive(Debug, Deserialize)]
struct ProduceResponse {
    #[serde(default)]
    offsets: Vec<PartitionOffset>,
}

#[derive(Debug, Deserialize)]
struct PartitionOffset {
    #[serde(default)]
    partition: Option<i32>,
    #[serde(default)]
    offset: Option<i64>,
    #[serde(default)]
    error_code: Option<i32>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProxyError {
    error_code: i32,
    message: String,
}

/// Publisher backed by a Kafka REST Proxy.
#[derive(Debug, Clone)]
pub struct KafkaRestPublisher {
    client: reqwest::Client,
    base_url: String,
}

impl KafkaRestPublisher {
    /// Create a publisher for the proxy at `base_url`.
    ///
    /// `timeout` bounds each HTTP request. The relay applies its own
    /// per-publish timeout on top.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RegistryError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_V2));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(BINARY_CONTENT_TYPE));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| RegistryError::Publish {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn topic_url(&self, topic: &str) -> String {
        format!("{}/topics/{}", self.base_url, topic)
    }
}

#[async_trait]
impl PluginAdapter for KafkaRestPublisher {
    fn name(&self) -> &str {
        "kafka-rest"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Broker
    }

    async fn health_check(&self) -> Result<HealthStatus, RegistryError> {
        let url = format!("{}/topics", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => Ok(HealthStatus::Healthy),
            Ok(resp) => Ok(HealthStatus::Degraded(format!(
                "kafka rest proxy returned {}",
                resp.status()
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "kafka rest proxy unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), RegistryError> {
        Ok(())
    }
}

#[async_trait]
impl BrokerPublisher for KafkaRestPublisher {
    async fn publish(&self, topic: &str, key: &str, body: &[u8]) -> Result<(), RegistryError> {
        let encoded_key = STANDARD.encode(key.as_bytes());
        let encoded_value = STANDARD.encode(body);
        let request = ProduceRequest {
            records: [ProduceRecord {
                key: &encoded_key,
                value: &encoded_value,
            }],
        };
        let payload = serde_json::to_vec(&request).map_err(|e| RegistryError::Serialization {
            source: Box::new(e),
        })?;

        let response = self
            .client
            .post(self.topic_url(topic))
            .body(payload)
            .send()
            .await
            .map_err(|e| RegistryError::Publish {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| RegistryError::Publish {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ProxyError>(&text) {
                Ok(err) => format!(
                    "kafka rest proxy error {} ({status}): {}",
                    err.error_code, err.message
                ),
                Err(_) => format!("kafka rest proxy returned {status}: {text}"),
            };
            warn!(topic, key, status = %status, "produce request rejected");
            return Err(RegistryError::Publish {
                message,
                source: None,
            });
        }

        let parsed: ProduceResponse =
            serde_json::from_str(&text).map_err(|e| RegistryError::Publish {
                message: format!("failed to parse produce response: {e}"),
                source: Some(Box::new(e)),
            })?;

        if let Some(failed) = parsed.offsets.iter().find(|o| o.error_code.is_some()) {
            return Err(RegistryError::Publish {
                message: format!(
                    "record rejected with error code {}: {}",
                    failed.error_code.unwrap_or_default(),
                    failed.error.as_deref().unwrap_or("unknown error")
                ),
                source: None,
            });
        }

        if let Some(ack) = parsed.offsets.first() {
            debug!(
                topic,
                key,
                partition = ?ack.partition,
                offset = ?ack.offset,
                "record acknowledged"
            );
        }
        Ok(())
    }
}
