// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbox event table operations.
//!
//! Inserts only happen through [`crate::OutboxWriter`] inside a caller's
//! transaction. Every update below is guarded by `status = 'PENDING'`, so a
//! `SENT` or `FAILED` row is never touched again. No statement updates
//! `payload`.

use custreg_core::{OutboxEvent, OutboxStatus, RegistryError};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension};

use crate::database::{map_tr_err, sql_err, Database};

/// Longest `last_error` text kept on a row.
const MAX_ERROR_LEN: usize = 1024;

const EVENT_COLUMNS: &str = "id, aggregate_id, event_type, payload, status, retry_count,
     last_error, created_at, processed_at";

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<OutboxEvent> {
    let status: String = row.get(4)?;
    let status = status
        .parse::<OutboxStatus>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
    Ok(OutboxEvent {
        id: row.get(0)?,
        aggregate_id: row.get(1)?,
        event_type: row.get(2)?,
        payload: row.get(3)?,
        status,
        retry_count: row.get(5)?,
        last_error: row.get(6)?,
        created_at: row.get(7)?,
        processed_at: row.get(8)?,
    })
}

/// Insert a new `PENDING` event. Returns the assigned id.
///
/// Takes a plain connection so it can run on a borrowed transaction.
pub(crate) fn insert_event(
    conn: &rusqlite::Connection,
    aggregate_id: &str,
    event_type: &str,
    payload: &str,
    created_at: &str,
) -> Result<i64, RegistryError> {
    conn.execute(
        "INSERT INTO customer_outbox_event
             (aggregate_id, event_type, payload, status, retry_count, created_at)
         VALUES (?1, ?2, ?3, ?4, 0, ?5)",
        params![
            aggregate_id,
            event_type,
            payload,
            OutboxStatus::Pending.as_str(),
            created_at
        ],
    )
    .map_err(sql_err)?;
    Ok(conn.last_insert_rowid())
}

/// Up to `limit` `PENDING` events in insertion order.
///
/// Ordered by the AUTOINCREMENT id, so a wall clock that steps backwards
/// cannot put an event ahead of one written before it.
pub async fn select_pending_batch(
    db: &Database,
    limit: usize,
) -> Result<Vec<OutboxEvent>, RegistryError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| -> Result<Vec<OutboxEvent>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EVENT_COLUMNS}
                 FROM customer_outbox_event
                 WHERE status = ?1
                 ORDER BY id ASC
                 LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(params![OutboxStatus::Pending.as_str(), limit], row_to_event)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)
}

/// Move a `PENDING` event to `SENT`. Returns `false` if it was not pending.
pub async fn mark_sent(db: &Database, id: i64, processed_at: &str) -> Result<bool, RegistryError> {
    let processed_at = processed_at.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE customer_outbox_event
                 SET status = ?1, processed_at = ?2
                 WHERE id = ?3 AND status = ?4",
                params![
                    OutboxStatus::Sent.as_str(),
                    processed_at,
                    id,
                    OutboxStatus::Pending.as_str()
                ],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Count a failed attempt against a `PENDING` event.
///
/// Increments `retry_count`, stores the error, and moves the event to
/// `FAILED` once the new count reaches `max_retries`. For an event that is
/// no longer pending nothing changes and its current status is returned.
pub async fn record_failure(
    db: &Database,
    id: i64,
    error: &str,
    max_retries: u32,
) -> Result<OutboxStatus, RegistryError> {
    let error: String = error.chars().take(MAX_ERROR_LEN).collect();
    let status = db
        .connection()
        .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
            let updated: Option<String> = conn
                .query_row(
                    "UPDATE customer_outbox_event
                     SET retry_count = retry_count + 1,
                         last_error = ?2,
                         status = CASE WHEN retry_count + 1 >= ?3 THEN ?4 ELSE status END
                     WHERE id = ?1 AND status = ?5
                     RETURNING status",
                    params![
                        id,
                        error,
                        i64::from(max_retries),
                        OutboxStatus::Failed.as_str(),
                        OutboxStatus::Pending.as_str()
                    ],
                    |row| row.get(0),
                )
                .optional()?;
            match updated {
                Some(status) => Ok(Some(status)),
                None => conn
                    .query_row(
                        "SELECT status FROM customer_outbox_event WHERE id = ?1",
                        params![id],
                        |row| row.get(0),
                    )
                    .optional(),
            }
        })
        .await
        .map_err(map_tr_err)?;

    match status {
        Some(s) => s.parse::<OutboxStatus>().map_err(RegistryError::storage),
        None => Err(RegistryError::not_found("outbox event", id)),
    }
}

/// Number of events currently in `status`.
pub async fn count_by_status(db: &Database, status: OutboxStatus) -> Result<u64, RegistryError> {
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM customer_outbox_event WHERE status = ?1",
                params![status.as_str()],
                |row| row.get(0),
            )
        })
        .await
        .map(|n| n.max(0) as u64)
        .map_err(map_tr_err)
}

/// Fetch a single event by id.
pub async fn get_event(db: &Database, id: i64) -> Result<Option<OutboxEvent>, RegistryError> {
    db.connection()
        .call(move |conn| -> Result<Option<OutboxEvent>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {EVENT_COLUMNS} FROM customer_outbox_event WHERE id = ?1"),
                params![id],
                row_to_event,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// All events for one aggregate in insertion order.
pub async fn list_for_aggregate(
    db: &Database,
    aggregate_id: &str,
) -> Result<Vec<OutboxEvent>, RegistryError> {
    let aggregate_id = aggregate_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<OutboxEvent>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EVENT_COLUMNS}
                 FROM customer_outbox_event
                 WHERE aggregate_id = ?1
                 ORDER BY id ASC"
            ))?;
            let rows = stmt
                .query_map(params![aggregate_id], row_to_event)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)
}
