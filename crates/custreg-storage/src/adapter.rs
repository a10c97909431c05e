// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the relay's [`OutboxStore`] port.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use custreg_config::model::StorageConfig;
use custreg_core::{
    AdapterType, HealthStatus, OutboxEvent, OutboxStatus, OutboxStore, PluginAdapter,
    RegistryError,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates to the typed query modules.
/// The same handle is shared with the customer service.
#[derive(Clone)]
pub struct SqliteStorage {
    db: Database,
}

impl SqliteStorage {
    /// Wrap an already opened database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open the database described by `config`, running migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, RegistryError> {
        let db = Database::open_with(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, "SQLite storage initialized");
        Ok(Self::new(db))
    }

    /// The underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, RegistryError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("SELECT 1", [], |_| Ok(()))?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RegistryError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        debug!("shutdown: WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl OutboxStore for SqliteStorage {
    async fn select_pending_batch(&self, limit: usize) -> Result<Vec<OutboxEvent>, RegistryError> {
        queries::outbox::select_pending_batch(&self.db, limit).await
    }

    async fn mark_sent(&self, id: i64, processed_at: &str) -> Result<bool, RegistryError> {
        queries::outbox::mark_sent(&self.db, id, processed_at).await
    }

    async fn record_failure(
        &self,
        id: i64,
        error: &str,
        max_retries: u32,
    ) -> Result<OutboxStatus, RegistryError> {
        queries::outbox::record_failure(&self.db, id, error, max_retries).await
    }

    async fn count_by_status(&self, status: OutboxStatus) -> Result<u64, RegistryError> {
        queries::outbox::count_by_status(&self.db, status).await
    }

    async fn try_acquire_lease(&self, holder: &str, ttl: Duration) -> Result<bool, RegistryError> {
        queries::lease::try_acquire(&self.db, holder, ttl).await
    }

    async fn release_lease(&self, holder: &str) -> Result<(), RegistryError> {
        queries::lease::release(&self.db, holder).await
    }
}
