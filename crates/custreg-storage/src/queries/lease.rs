// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relay lease: a single row that keeps two relay processes from working
//! the same outbox at once.

use std::time::Duration;

use custreg_core::RegistryError;
use rusqlite::params;

use crate::database::{map_tr_err, Database};

/// Name of the only lease row.
pub const RELAY_LEASE: &str = "outbox-relay";

fn timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Acquire or extend the lease for `holder`.
///
/// Succeeds when no lease exists, the current lease has expired, or
/// `holder` already owns it. On success the lease expires `ttl` from now.
pub async fn try_acquire(db: &Database, holder: &str, ttl: Duration) -> Result<bool, RegistryError> {
    let holder = holder.to_string();
    let now = chrono::Utc::now();
    let ttl = chrono::Duration::from_std(ttl).map_err(RegistryError::storage)?;
    let now_str = timestamp(now);
    let expires_at = timestamp(now + ttl);

    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "INSERT INTO outbox_relay_lease (name, holder, expires_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(name) DO UPDATE
                 SET holder = excluded.holder, expires_at = excluded.expires_at
                 WHERE outbox_relay_lease.holder = excluded.holder
                    OR outbox_relay_lease.expires_at <= ?4",
                params![RELAY_LEASE, holder, expires_at, now_str],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Drop the lease if `holder` owns it.
pub async fn release(db: &Database, holder: &str) -> Result<(), RegistryError> {
    let holder = holder.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "DELETE FROM outbox_relay_lease WHERE name = ?1 AND holder = ?2",
                params![RELAY_LEASE, holder],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
