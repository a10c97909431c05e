// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for integration testing.
//!
//! `TestHarness` assembles a temp SQLite database (migrated), the storage
//! adapter, a [`MockBroker`] and the customer service, plus a config tuned
//! for fast relay tests.

use std::sync::Arc;

use custreg_config::model::{OutboxConfig, RegistryConfig, StorageConfig};
use custreg_core::{OutboxEvent, RegistryError};
use custreg_customer::CustomerService;
use custreg_storage::queries::outbox;
use custreg_storage::{Database, OutboxWriter, SqliteStorage};
use serde::Serialize;

use crate::mock_broker::MockBroker;

/// Builder for creating test environments with configurable relay settings.
pub struct TestHarnessBuilder {
    outbox: OutboxConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            outbox: OutboxConfig {
                interval_secs: 1,
                publish_timeout_ms: 200,
                lease_ttl_secs: 5,
                worker_id: "test-worker".to_string(),
                ..OutboxConfig::default()
            },
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.outbox.batch_size = batch_size;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.outbox.max_retries = max_retries;
        self
    }

    pub fn with_publish_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.outbox.publish_timeout_ms = timeout_ms;
        self
    }

    /// Build the harness, creating and migrating a fresh database.
    pub async fn build(self) -> Result<TestHarness, RegistryError> {
        let temp_dir = tempfile::TempDir::new().map_err(RegistryError::storage)?;
        let db_path = temp_dir.path().join("test.db");
        let storage_config = StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        };

        let storage = SqliteStorage::open(&storage_config).await?;
        let db = storage.database().clone();
        let service = CustomerService::new(db.clone());

        let config = RegistryConfig {
            storage: storage_config,
            outbox: self.outbox,
            ..RegistryConfig::default()
        };

        Ok(TestHarness {
            db,
            storage: Arc::new(storage),
            broker: Arc::new(MockBroker::new()),
            service,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete, isolated service stack for one test.
pub struct TestHarness {
    pub db: Database,
    pub storage: Arc<SqliteStorage>,
    pub broker: Arc<MockBroker>,
    pub service: CustomerService,
    pub config: RegistryConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with default test settings.
    pub async fn new() -> Result<Self, RegistryError> {
        Self::builder().build().await
    }

    /// Record one outbox event in its own transaction.
    pub async fn seed_event<S>(
        &self,
        aggregate_id: &str,
        event_type: &str,
        snapshot: S,
    ) -> Result<OutboxEvent, RegistryError>
    where
        S: Serialize + Send + 'static,
    {
        let aggregate_id = aggregate_id.to_string();
        let event_type = event_type.to_string();
        self.db
            .transact(move |tx| OutboxWriter::record(tx, &aggregate_id, &event_type, &snapshot))
            .await
    }

    /// Current state of one event.
    pub async fn event(&self, id: i64) -> Result<OutboxEvent, RegistryError> {
        outbox::get_event(&self.db, id)
            .await?
            .ok_or_else(|| RegistryError::not_found("outbox event", id))
    }
}
