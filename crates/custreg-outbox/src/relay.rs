// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relay cycle and periodic runner.
//!
//! One cycle:
//!
//! 1. Acquire the relay lease; give up quietly if another worker holds it.
//! 2. Select up to `batch_size` `PENDING` events, oldest first.
//! 3. For each event, publish under `publish_timeout`, then mark it `SENT`
//!    or record the failure. Each event is its own unit of work, so a late
//!    failure never undoes earlier deliveries.
//! 4. Release the lease.
//!
//! After a failure for an aggregate, its later events in the same batch are
//! skipped so they are never published ahead of their predecessor.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use custreg_core::types::now_timestamp;
use custreg_core::{BrokerPublisher, OutboxEvent, OutboxStatus, OutboxStore, RegistryError};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::settings::RelaySettings;

/// Counters for one completed cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Events returned by the pending select.
    pub selected: usize,
    /// Published and marked `SENT`.
    pub sent: usize,
    /// Publish attempts that failed or timed out (dead-lettered ones included).
    pub failed: usize,
    /// Events moved to `FAILED` in this cycle.
    pub dead_lettered: usize,
    /// Left untouched because an earlier event of the same aggregate failed.
    pub skipped: usize,
    /// Left untouched because of shutdown or a lost lease.
    pub abandoned: usize,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "selected={} sent={} failed={} dead_lettered={} skipped={} abandoned={}",
            self.selected, self.sent, self.failed, self.dead_lettered, self.skipped, self.abandoned
        )
    }
}

/// What a call to [`Relay::run_cycle`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed(CycleReport),
    /// Another cycle was already running in this process.
    Overlapping,
    /// Another worker holds the relay lease.
    LeaseUnavailable,
}

impl CycleOutcome {
    pub fn report(&self) -> Option<&CycleReport> {
        match self {
            CycleOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }
}

/// Publishes pending outbox events to the broker.
pub struct Relay {
    store: Arc<dyn OutboxStore>,
    broker: Arc<dyn BrokerPublisher>,
    settings: RelaySettings,
    /// Held for the duration of a cycle; cycles never overlap.
    cycle_lock: Mutex<()>,
}

impl Relay {
    pub fn new(
        store: Arc<dyn OutboxStore>,
        broker: Arc<dyn BrokerPublisher>,
        settings: RelaySettings,
    ) -> Self {
        Self {
            store,
            broker,
            settings,
            cycle_lock: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    /// Run one cycle to completion.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, RegistryError> {
        self.run_cycle_with(&CancellationToken::new()).await
    }

    /// Run one cycle, abandoning the rest of the batch once `cancel` fires.
    ///
    /// The event in flight when `cancel` fires is finished (publish and
    /// status update) first. A store error aborts the cycle; updates made
    /// earlier in the cycle stay committed.
    pub async fn run_cycle_with(
        &self,
        cancel: &CancellationToken,
    ) -> Result<CycleOutcome, RegistryError> {
        let Ok(_guard) = self.cycle_lock.try_lock() else {
            debug!("relay cycle already running, skipping");
            return Ok(CycleOutcome::Overlapping);
        };

        let worker = self.settings.worker_id.as_str();
        if !self
            .store
            .try_acquire_lease(worker, self.settings.lease_ttl)
            .await?
        {
            debug!(worker, "relay lease held by another worker, skipping cycle");
            return Ok(CycleOutcome::LeaseUnavailable);
        }

        let started = Instant::now();
        let result = self.process_batch(cancel).await;

        if let Err(e) = self.store.release_lease(worker).await {
            warn!(error = %e, worker, "failed to release relay lease");
        }
        let report = result?;

        custreg_prometheus::record_cycle_duration(started.elapsed().as_secs_f64());
        match self.store.count_by_status(OutboxStatus::Pending).await {
            Ok(pending) => custreg_prometheus::set_pending(pending),
            Err(e) => warn!(error = %e, "failed to count pending outbox events"),
        }

        if report.selected > 0 {
            info!(
                selected = report.selected,
                sent = report.sent,
                failed = report.failed,
                dead_lettered = report.dead_lettered,
                skipped = report.skipped,
                abandoned = report.abandoned,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "relay cycle completed"
            );
        } else {
            debug!("relay cycle found no pending events");
        }
        Ok(CycleOutcome::Completed(report))
    }

    async fn process_batch(&self, cancel: &CancellationToken) -> Result<CycleReport, RegistryError> {
        let batch = self
            .store
            .select_pending_batch(self.settings.batch_size)
            .await?;
        let mut report = CycleReport {
            selected: batch.len(),
            ..CycleReport::default()
        };
        let mut blocked: HashSet<&str> = HashSet::new();

        for (index, event) in batch.iter().enumerate() {
            if cancel.is_cancelled() {
                report.abandoned = batch.len() - index;
                info!(abandoned = report.abandoned, "shutdown requested, abandoning rest of batch");
                break;
            }
            if index > 0
                && !self
                    .store
                    .try_acquire_lease(&self.settings.worker_id, self.settings.lease_ttl)
                    .await?
            {
                report.abandoned = batch.len() - index;
                warn!(
                    abandoned = report.abandoned,
                    worker = %self.settings.worker_id,
                    "relay lease lost mid-cycle, abandoning rest of batch"
                );
                break;
            }
            if blocked.contains(event.aggregate_id.as_str()) {
                report.skipped += 1;
                debug!(
                    event_id = event.id,
                    aggregate_id = %event.aggregate_id,
                    "earlier event for aggregate failed, deferring"
                );
                continue;
            }

            match self.publish(event).await {
                Ok(()) => {
                    if self.store.mark_sent(event.id, &now_timestamp()).await? {
                        report.sent += 1;
                        custreg_prometheus::record_published(&event.event_type);
                        debug!(
                            event_id = event.id,
                            aggregate_id = %event.aggregate_id,
                            event_type = %event.event_type,
                            "outbox event sent"
                        );
                    } else {
                        warn!(
                            event_id = event.id,
                            "outbox event was no longer pending after publish"
                        );
                    }
                }
                Err(e) => {
                    blocked.insert(event.aggregate_id.as_str());
                    report.failed += 1;
                    custreg_prometheus::record_publish_failure(&event.event_type);

                    let status = self
                        .store
                        .record_failure(event.id, &e.to_string(), self.settings.max_retries)
                        .await?;
                    if status == OutboxStatus::Failed {
                        report.dead_lettered += 1;
                        custreg_prometheus::record_dead_lettered();
                        error!(
                            event_id = event.id,
                            aggregate_id = %event.aggregate_id,
                            event_type = %event.event_type,
                            attempts = event.retry_count + 1,
                            error = %e,
                            "outbox event exhausted retries, moved to FAILED"
                        );
                    } else {
                        warn!(
                            event_id = event.id,
                            aggregate_id = %event.aggregate_id,
                            event_type = %event.event_type,
                            retry_count = event.retry_count + 1,
                            error = %e,
                            "outbox event publish failed, will retry"
                        );
                    }
                }
            }
        }
        Ok(report)
    }

    async fn publish(&self, event: &OutboxEvent) -> Result<(), RegistryError> {
        let timeout = self.settings.publish_timeout;
        let publish = self.broker.publish(
            &self.settings.topic,
            &event.aggregate_id,
            event.payload.as_bytes(),
        );
        match tokio::time::timeout(timeout, publish).await {
            Ok(result) => result,
            Err(_) => Err(RegistryError::Timeout { duration: timeout }),
        }
    }

    /// Run cycles on a fixed delay until `cancel` fires.
    ///
    /// The first cycle starts immediately. Each following cycle starts one
    /// full `interval` after the previous one finished. Cycle errors are
    /// logged and the next cycle retries.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        info!(
            interval_secs = self.settings.interval.as_secs(),
            batch_size = self.settings.batch_size,
            topic = %self.settings.topic,
            worker = %self.settings.worker_id,
            "outbox relay started"
        );

        while !cancel.is_cancelled() {
            match self.run_cycle_with(&cancel).await {
                Ok(CycleOutcome::Completed(_)) => {}
                Ok(CycleOutcome::Overlapping) => {
                    debug!("relay tick skipped, previous cycle still running");
                }
                Ok(CycleOutcome::LeaseUnavailable) => {}
                Err(e) => {
                    warn!(error = %e, "relay cycle aborted, retrying next interval");
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(self.settings.interval) => {}
            }
        }
        info!("outbox relay shutting down");
    }

    /// Spawn [`Relay::run`] on the current runtime.
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}
