// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbox writer.
//!
//! Records a domain event in the same transaction as the business change it
//! announces. It only accepts a borrowed [`rusqlite::Transaction`], so it
//! cannot run outside a caller-owned unit of work, and it never touches the
//! network.

use custreg_core::types::now_timestamp;
use custreg_core::{OutboxEvent, OutboxStatus, RegistryError};
use serde::Serialize;
use tracing::debug;

use crate::queries::outbox::insert_event;

/// Writes outbox events inside the caller's transaction.
pub struct OutboxWriter;

impl OutboxWriter {
    /// Serialize `snapshot` and insert it as a `PENDING` event.
    ///
    /// A serialization failure returns [`RegistryError::Serialization`]
    /// before anything is written; returning it from the enclosing
    /// [`crate::Database::transact`] closure rolls back the business change too.
    pub fn record<S>(
        tx: &rusqlite::Transaction<'_>,
        aggregate_id: &str,
        event_type: &str,
        snapshot: &S,
    ) -> Result<OutboxEvent, RegistryError>
    where
        S: Serialize + ?Sized,
    {
        let payload = serde_json::to_string(snapshot).map_err(|e| RegistryError::Serialization {
            source: Box::new(e),
        })?;
        let created_at = now_timestamp();
        let id = insert_event(tx, aggregate_id, event_type, &payload, &created_at)?;

        debug!(event_id = id, aggregate_id, event_type, "outbox event recorded");

        Ok(OutboxEvent {
            id,
            aggregate_id: aggregate_id.to_string(),
            event_type: event_type.to_string(),
            payload,
            status: OutboxStatus::Pending,
            retry_count: 0,
            last_error: None,
            created_at,
            processed_at: None,
        })
    }
}
