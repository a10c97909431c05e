// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relay behaviour against the real SQLite store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use custreg_core::{OutboxEvent, OutboxStatus, OutboxStore, RegistryError};
use custreg_outbox::{CycleOutcome, CycleReport, Relay, RelaySettings};
use custreg_storage::SqliteStorage;
use custreg_test_utils::TestHarness;

fn relay_for(harness: &TestHarness) -> Relay {
    Relay::new(
        harness.storage.clone(),
        harness.broker.clone(),
        RelaySettings::from(&harness.config.outbox),
    )
}

fn report(outcome: CycleOutcome) -> CycleReport {
    match outcome {
        CycleOutcome::Completed(report) => report,
        other => panic!("expected a completed cycle, got {other:?}"),
    }
}

async fn seed(harness: &TestHarness, aggregate: &str, seq: u32) -> OutboxEvent {
    harness
        .seed_event(aggregate, "CUSTOMER_UPDATED", serde_json::json!({ "seq": seq }))
        .await
        .unwrap()
}

#[tokio::test]
async fn failed_event_stays_pending_and_is_sent_next_cycle() {
    let harness = TestHarness::new().await.unwrap();
    let e1 = seed(&harness, "agg-1", 1).await;
    let e2 = seed(&harness, "agg-2", 2).await;
    let e3 = seed(&harness, "agg-3", 3).await;
    harness.broker.fail_key("agg-2").await;

    let relay = relay_for(&harness);
    let first = report(relay.run_cycle().await.unwrap());
    assert_eq!(first.sent, 2);
    assert_eq!(first.failed, 1);

    for id in [e1.id, e3.id] {
        let event = harness.event(id).await.unwrap();
        assert_eq!(event.status, OutboxStatus::Sent);
        assert!(event.processed_at.is_some());
    }
    let pending = harness.event(e2.id).await.unwrap();
    assert_eq!(pending.status, OutboxStatus::Pending);
    assert_eq!(pending.retry_count, 1);
    assert!(pending.processed_at.is_none());
    assert!(pending.last_error.is_some());

    harness.broker.heal().await;
    let second = report(relay.run_cycle().await.unwrap());
    assert_eq!(second.selected, 1);
    assert_eq!(second.sent, 1);
    let sent = harness.event(e2.id).await.unwrap();
    assert_eq!(sent.status, OutboxStatus::Sent);
    assert!(sent.processed_at.is_some());
}

#[tokio::test]
async fn batch_limit_processes_oldest_first() {
    let harness = TestHarness::builder().with_batch_size(2).build().await.unwrap();
    for n in 1..=5 {
        seed(&harness, &format!("agg-{n}"), n).await;
    }
    let relay = relay_for(&harness);

    let sizes: Vec<usize> = {
        let mut sizes = Vec::new();
        for _ in 0..3 {
            sizes.push(report(relay.run_cycle().await.unwrap()).sent);
        }
        sizes
    };
    assert_eq!(sizes, vec![2, 2, 1]);
    assert_eq!(
        harness.broker.delivered_keys().await,
        vec!["agg-1", "agg-2", "agg-3", "agg-4", "agg-5"]
    );
    assert_eq!(report(relay.run_cycle().await.unwrap()).selected, 0);
}

#[tokio::test]
async fn same_aggregate_events_are_published_in_creation_order() {
    let harness = TestHarness::new().await.unwrap();
    seed(&harness, "cust", 1).await;
    seed(&harness, "other", 2).await;
    seed(&harness, "cust", 3).await;
    harness.broker.fail_call(0).await;

    let relay = relay_for(&harness);
    let first = report(relay.run_cycle().await.unwrap());
    assert_eq!(first.skipped, 1);
    report(relay.run_cycle().await.unwrap());

    let bodies: Vec<String> = harness
        .broker
        .delivered()
        .await
        .iter()
        .filter(|m| m.key == "cust")
        .map(|m| m.body_str().to_string())
        .collect();
    assert_eq!(bodies, vec![r#"{"seq":1}"#, r#"{"seq":3}"#]);
}

/// Wraps the SQLite store and fails the first `mark_sent`, as if the
/// process died between the broker ack and the status update.
struct CrashAfterAck {
    inner: Arc<SqliteStorage>,
    crashed: AtomicBool,
}

#[async_trait]
impl OutboxStore for CrashAfterAck {
    async fn select_pending_batch(&self, limit: usize) -> Result<Vec<OutboxEvent>, RegistryError> {
        self.inner.select_pending_batch(limit).await
    }

    async fn mark_sent(&self, id: i64, processed_at: &str) -> Result<bool, RegistryError> {
        if !self.crashed.swap(true, Ordering::SeqCst) {
            return Err(RegistryError::Storage {
                source: Box::new(std::io::Error::other("connection lost")),
            });
        }
        self.inner.mark_sent(id, processed_at).await
    }

    async fn record_failure(
        &self,
        id: i64,
        error: &str,
        max_retries: u32,
    ) -> Result<OutboxStatus, RegistryError> {
        self.inner.record_failure(id, error, max_retries).await
    }

    async fn count_by_status(&self, status: OutboxStatus) -> Result<u64, RegistryError> {
        self.inner.count_by_status(status).await
    }

    async fn try_acquire_lease(&self, holder: &str, ttl: Duration) -> Result<bool, RegistryError> {
        self.inner.try_acquire_lease(holder, ttl).await
    }

    async fn release_lease(&self, holder: &str) -> Result<(), RegistryError> {
        self.inner.release_lease(holder).await
    }
}

#[tokio::test]
async fn redelivery_after_lost_ack_is_harmless() {
    let harness = TestHarness::new().await.unwrap();
    let event = seed(&harness, "agg-1", 1).await;
    let store = Arc::new(CrashAfterAck {
        inner: harness.storage.clone(),
        crashed: AtomicBool::new(false),
    });
    let relay = Relay::new(
        store,
        harness.broker.clone(),
        RelaySettings::from(&harness.config.outbox),
    );

    assert!(relay.run_cycle().await.is_err());
    assert_eq!(
        harness.event(event.id).await.unwrap().status,
        OutboxStatus::Pending
    );

    report(relay.run_cycle().await.unwrap());
    let delivered = harness.broker.delivered().await;
    assert_eq!(delivered.len(), 2);
    assert_eq!(delivered[0], delivered[1]);

    let stored = harness.event(event.id).await.unwrap();
    assert_eq!(stored.status, OutboxStatus::Sent);
    assert_eq!(stored.retry_count, 0);
}

#[tokio::test]
async fn second_worker_waits_for_lease() {
    let harness = TestHarness::new().await.unwrap();
    seed(&harness, "agg-1", 1).await;

    assert!(
        harness
            .storage
            .try_acquire_lease("worker-b", Duration::from_secs(30))
            .await
            .unwrap()
    );
    let relay = relay_for(&harness);
    assert_eq!(
        relay.run_cycle().await.unwrap(),
        CycleOutcome::LeaseUnavailable
    );
    assert!(harness.broker.attempts().await.is_empty());

    harness.storage.release_lease("worker-b").await.unwrap();
    assert_eq!(report(relay.run_cycle().await.unwrap()).sent, 1);
}

#[tokio::test]
async fn dead_lettered_event_is_never_selected_again() {
    let harness = TestHarness::builder().with_max_retries(2).build().await.unwrap();
    let event = seed(&harness, "agg-1", 1).await;
    harness.broker.fail_all().await;
    let relay = relay_for(&harness);

    report(relay.run_cycle().await.unwrap());
    let last = report(relay.run_cycle().await.unwrap());
    assert_eq!(last.dead_lettered, 1);

    let stored = harness.event(event.id).await.unwrap();
    assert_eq!(stored.status, OutboxStatus::Failed);
    assert_eq!(stored.retry_count, 2);

    harness.broker.heal().await;
    assert_eq!(report(relay.run_cycle().await.unwrap()).selected, 0);
    assert_eq!(
        harness
            .storage
            .count_by_status(OutboxStatus::Failed)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn stalled_broker_times_out_per_event() {
    let harness = TestHarness::builder()
        .with_publish_timeout_ms(50)
        .build()
        .await
        .unwrap();
    let stuck = seed(&harness, "stuck", 1).await;
    seed(&harness, "fine", 2).await;
    harness.broker.stall_key("stuck").await;

    let cycle = report(relay_for(&harness).run_cycle().await.unwrap());
    assert_eq!(cycle.failed, 1);
    assert_eq!(cycle.sent, 1);
    let stored = harness.event(stuck.id).await.unwrap();
    assert_eq!(stored.status, OutboxStatus::Pending);
    assert!(stored.last_error.unwrap().contains("timed out"));
}
