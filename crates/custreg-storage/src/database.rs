// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;

use custreg_core::RegistryError;
use rusqlite::{ErrorCode, TransactionBehavior};
use tracing::debug;

/// Handle to the service database.
///
/// Cloning is cheap; every clone talks to the same background connection
/// thread, so the customer service and the outbox relay share one writer.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` in WAL mode and run
    /// pending migrations.
    pub async fn open(path: &str) -> Result<Self, RegistryError> {
        Self::open_with(path, true).await
    }

    /// Open the database, choosing the journal mode explicitly.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, RegistryError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(RegistryError::storage)?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| RegistryError::Storage {
                source: Box::new(e),
            })?;

        conn.call(move |conn| -> Result<Result<(), RegistryError>, rusqlite::Error> {
            if wal_mode {
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                    row.get::<_, String>(0)
                })?;
            }
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.busy_timeout(std::time::Duration::from_secs(5))?;
            Ok(crate::migrations::run_migrations(conn))
        })
        .await
        .map_err(map_tr_err)??;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The underlying async connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Run `f` inside one IMMEDIATE transaction.
    ///
    /// Commits when `f` returns `Ok`, rolls back when it returns `Err`. Every
    /// write `f` performs, including outbox inserts, shares that fate.
    pub async fn transact<F, T>(&self, f: F) -> Result<T, RegistryError>
    where
        F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T, RegistryError> + Send + 'static,
        T: Send + 'static,
    {
        self.conn
            .call(move |conn| -> Result<Result<T, RegistryError>, rusqlite::Error> {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                match f(&tx) {
                    Ok(value) => {
                        tx.commit()?;
                        Ok(Ok(value))
                    }
                    Err(e) => {
                        tx.rollback()?;
                        Ok(Err(e))
                    }
                }
            })
            .await
            .map_err(map_tr_err)?
    }

    /// Run a read-only closure against the connection.
    pub async fn read<F, T>(&self, f: F) -> Result<T, RegistryError>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<T, RegistryError> + Send + 'static,
        T: Send + 'static,
    {
        self.conn
            .call(move |conn| -> Result<Result<T, RegistryError>, rusqlite::Error> {
                Ok(f(conn))
            })
            .await
            .map_err(map_tr_err)?
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), RegistryError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(map_tr_err)?;
        debug!("database closed");
        Ok(())
    }
}

/// Convert a tokio-rusqlite error into `RegistryError::Storage`.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> RegistryError {
    RegistryError::Storage {
        source: Box::new(e),
    }
}

/// Convert a rusqlite error raised inside a unit of work.
///
/// UNIQUE violations become `AlreadyExists` so callers can answer 409 even
/// when a concurrent insert slipped past their own existence checks.
pub fn sql_err(e: rusqlite::Error) -> RegistryError {
    if let rusqlite::Error::SqliteFailure(ref failure, ref message) = e
        && failure.code == ErrorCode::ConstraintViolation
        && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    {
        return RegistryError::AlreadyExists(
            message
                .clone()
                .unwrap_or_else(|| "unique constraint violated".to_string()),
        );
    }
    RegistryError::Storage {
        source: Box::new(e),
    }
}
