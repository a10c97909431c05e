// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record store operations used by the outbox relay.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::RegistryError;
use crate::types::{OutboxEvent, OutboxStatus};

/// The relay's view of the outbox table.
///
/// Writing events is not part of this trait: events are only ever inserted
/// inside the business transaction that produced them.
#[async_trait]
pub trait OutboxStore: Send + Sync + 'static {
    /// Up to `limit` `PENDING` events in insertion order (storage id).
    async fn select_pending_batch(&self, limit: usize) -> Result<Vec<OutboxEvent>, RegistryError>;

    /// Mark a `PENDING` event as `SENT`.
    ///
    /// Returns `false` without changing anything when the event is not
    /// `PENDING` (already sent, dead-lettered, or missing).
    async fn mark_sent(&self, id: i64, processed_at: &str) -> Result<bool, RegistryError>;

    /// Record a failed delivery attempt for a `PENDING` event.
    ///
    /// Increments `retry_count` and stores `error`. The event moves to
    /// `FAILED` once `retry_count` reaches `max_retries`. Returns the
    /// resulting status.
    async fn record_failure(
        &self,
        id: i64,
        error: &str,
        max_retries: u32,
    ) -> Result<OutboxStatus, RegistryError>;

    /// Number of events currently in `status`.
    async fn count_by_status(&self, status: OutboxStatus) -> Result<u64, RegistryError>;

    /// Acquire or extend the relay lease for `holder`.
    ///
    /// Succeeds when the lease is free, expired, or already held by `holder`.
    async fn try_acquire_lease(&self, holder: &str, ttl: Duration) -> Result<bool, RegistryError>;

    /// Release the relay lease if `holder` owns it.
    async fn release_lease(&self, holder: &str) -> Result<(), RegistryError>;
}
