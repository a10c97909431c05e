// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the custreg service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level custreg configuration.
///
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Service identity and log level.
    #[serde(default)]
    pub service: ServiceConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Outbox relay settings.
    #[serde(default)]
    pub outbox: OutboxConfig,

    /// Message broker settings.
    #[serde(default)]
    pub broker: BrokerConfig,

    /// REST gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Prometheus exporter settings.
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "custreg".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("custreg").join("custreg.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("custreg.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Outbox relay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OutboxConfig {
    /// Run the relay inside `custreg serve`.
    #[serde(default = "default_true")]
    pub relay_enabled: bool,

    /// Delay between the end of one cycle and the start of the next.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Maximum events selected per cycle.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Broker topic every customer event is published to.
    #[serde(default = "default_topic")]
    pub topic: String,

    /// Upper bound on a single publish call.
    #[serde(default = "default_publish_timeout_ms")]
    pub publish_timeout_ms: u64,

    /// Failed attempts after which an event is moved to `FAILED`.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Lifetime of the relay lease row.
    #[serde(default = "default_lease_ttl_secs")]
    pub lease_ttl_secs: u64,

    /// Lease holder identity for this process.
    #[serde(default = "default_worker_id")]
    pub worker_id: String,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            relay_enabled: true,
            interval_secs: default_interval_secs(),
            batch_size: default_batch_size(),
            topic: default_topic(),
            publish_timeout_ms: default_publish_timeout_ms(),
            max_retries: default_max_retries(),
            lease_ttl_secs: default_lease_ttl_secs(),
            worker_id: default_worker_id(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    5
}

fn default_batch_size() -> usize {
    50
}

fn default_topic() -> String {
    "customer-topic".to_string()
}

fn default_publish_timeout_ms() -> u64 {
    10_000
}

fn default_max_retries() -> u32 {
    10
}

fn default_lease_ttl_secs() -> u64 {
    30
}

fn default_worker_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Which broker publisher to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BrokerKind {
    /// Write each message to the log. Local development only.
    #[default]
    Log,
    /// Publish through a Kafka REST Proxy (v2 API).
    KafkaRest,
}

/// Message broker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BrokerConfig {
    #[serde(default)]
    pub kind: BrokerKind,

    /// Base URL of the Kafka REST Proxy, e.g. `http://localhost:8082`.
    #[serde(default)]
    pub rest_url: Option<String>,

    /// HTTP request timeout for the REST publisher.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            kind: BrokerKind::default(),
            rest_url: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    10
}

/// REST gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Prometheus exporter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrometheusConfig {
    /// Install the Prometheus recorder and serve `/metrics`.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
