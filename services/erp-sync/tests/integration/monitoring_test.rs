use chrono::{Duration, Utc};
use uuid::Uuid;

use erp_sync::domain::policy::RetryPolicy;
use erp_sync::domain::types::OutboxStatus;
use erp_sync::error::ErpSyncError;
use erp_sync::usecase::monitoring::MonitoringUseCase;
use erp_sync_domain::pagination::PageRequest;

use crate::helpers::{MemoryOutboxStore, test_record};

fn monitoring(store: &MemoryOutboxStore) -> MonitoringUseCase<MemoryOutboxStore> {
    MonitoringUseCase {
        store: store.clone(),
        policy: RetryPolicy::default(),
    }
}

// ── queue_status ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_report_empty_queue() {
    let store = MemoryOutboxStore::new();

    let status = monitoring(&store).queue_status().await.unwrap();

    assert_eq!(status.pending_count, 0);
    assert_eq!(status.total_queue_size, 0);
    assert_eq!(status.oldest_pending_at, None);
    assert_eq!(status.backlog_hours, None);
}

#[tokio::test]
async fn should_count_statuses_and_measure_backlog() {
    let store = MemoryOutboxStore::new();
    let now = Utc::now();
    let mut oldest = test_record(OutboxStatus::Pending, 0);
    oldest.created_at = now - Duration::hours(3);
    let mut newest = test_record(OutboxStatus::Pending, 1);
    newest.created_at = now - Duration::hours(1);
    let (oldest_at, newest_at) = (oldest.created_at, newest.created_at);
    store.insert(oldest);
    store.insert(newest);
    store.insert(test_record(OutboxStatus::InProgress, 1));
    store.insert(test_record(OutboxStatus::Completed, 1));
    store.insert(test_record(OutboxStatus::Completed, 2));
    store.insert(test_record(OutboxStatus::Dead, 5));

    let status = monitoring(&store).queue_status().await.unwrap();

    assert_eq!(status.pending_count, 2);
    assert_eq!(status.in_progress_count, 1);
    assert_eq!(status.completed_count, 2);
    assert_eq!(status.dead_count, 1);
    assert_eq!(status.total_queue_size, 3);
    assert_eq!(status.oldest_pending_at, Some(oldest_at));
    assert_eq!(status.newest_pending_at, Some(newest_at));
    let backlog = status.backlog_hours.unwrap();
    assert!((3.0..3.1).contains(&backlog), "backlog {backlog}");
}

// ── metrics ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_compute_metrics_over_window_only() {
    let store = MemoryOutboxStore::new();
    let now = Utc::now();
    let mut done = test_record(OutboxStatus::Completed, 2);
    done.created_at = now - Duration::hours(2);
    done.processed_at = Some(done.created_at + Duration::seconds(40));
    let mut stale = test_record(OutboxStatus::Completed, 1);
    stale.created_at = now - Duration::hours(48);
    stale.processed_at = Some(stale.created_at + Duration::seconds(5));
    let retrying = test_record(OutboxStatus::Pending, 1);
    let dead = test_record(OutboxStatus::Dead, 5);
    let dead_id = dead.saga_id;
    store.insert(done);
    store.insert(stale);
    store.insert(retrying);
    store.insert(dead);

    let metrics = monitoring(&store).metrics(Some(24)).await.unwrap();

    assert_eq!(metrics.total_processed, 3);
    assert_eq!(metrics.total_succeeded, 1);
    assert_eq!(metrics.total_failed, 2);
    assert!((metrics.success_rate - 100.0 / 3.0).abs() < 1e-9);
    assert_eq!(metrics.avg_latency_seconds, 40.0);
    assert_eq!(metrics.retry_metrics.total_retries, 5);
    assert_eq!(metrics.retry_metrics.sagas_with_retries, 2);
    assert_eq!(metrics.retry_metrics.max_retries_saga_id, Some(dead_id));
    assert_eq!(metrics.retry_metrics.max_retries_count, 5);
    assert_eq!(metrics.dead_letter_queue_size, 1);
    assert_eq!(metrics.period_end - metrics.period_start, Duration::hours(24));
}

#[tokio::test]
async fn should_reject_metrics_window_out_of_range() {
    let store = MemoryOutboxStore::new();

    for hours in [0, 169] {
        let result = monitoring(&store).metrics(Some(hours)).await;
        assert!(
            matches!(result, Err(ErpSyncError::InvalidQuery(_))),
            "expected InvalidQuery for {hours}, got {result:?}"
        );
    }
    assert!(monitoring(&store).metrics(Some(168)).await.is_ok());
    assert!(monitoring(&store).metrics(None).await.is_ok());
}

// ── failed_syncs ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_list_attempted_failures_newest_first() {
    let store = MemoryOutboxStore::new();
    let now = Utc::now();
    let mut retrying = test_record(OutboxStatus::Pending, 2);
    retrying.updated_at = now - Duration::minutes(5);
    retrying.last_error = Some("timeout".to_owned());
    let mut dead = test_record(OutboxStatus::Dead, 5);
    dead.updated_at = now;
    let (retrying_id, dead_id) = (retrying.saga_id, dead.saga_id);
    store.insert(retrying);
    store.insert(dead);
    store.insert(test_record(OutboxStatus::Pending, 0));
    store.insert(test_record(OutboxStatus::Completed, 3));

    let page = monitoring(&store)
        .failed_syncs(PageRequest::default(), true)
        .await
        .unwrap();

    assert_eq!(page.total_count, 2);
    assert_eq!(page.page, 1);
    assert_eq!(page.page_size, 50);
    let ids: Vec<Uuid> = page.items.iter().map(|i| i.saga_id).collect();
    assert_eq!(ids, vec![dead_id, retrying_id]);
    assert_eq!(page.items[1].last_error.as_deref(), Some("timeout"));
    assert_eq!(page.items[0].payload_summary.as_deref(), Some("RCP-100 v1.0"));

    let pending_only = monitoring(&store)
        .failed_syncs(PageRequest::default(), false)
        .await
        .unwrap();
    assert_eq!(pending_only.total_count, 1);
    assert_eq!(pending_only.items[0].saga_id, retrying_id);
}

#[tokio::test]
async fn should_paginate_failures() {
    let store = MemoryOutboxStore::new();
    for _ in 0..5 {
        store.insert(test_record(OutboxStatus::Dead, 1));
    }

    let page = monitoring(&store)
        .failed_syncs(PageRequest { page: 3, page_size: 2 }, true)
        .await
        .unwrap();

    assert_eq!(page.total_count, 5);
    assert_eq!(page.items.len(), 1);
}

#[tokio::test]
async fn should_reject_page_size_above_maximum() {
    let store = MemoryOutboxStore::new();

    let result = monitoring(&store)
        .failed_syncs(PageRequest { page: 1, page_size: 201 }, true)
        .await;

    assert!(
        matches!(result, Err(ErpSyncError::InvalidQuery(_))),
        "expected InvalidQuery, got {result:?}"
    );
}

// ── saga_detail ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_show_current_backoff_for_retrying_saga() {
    let store = MemoryOutboxStore::new();
    let record = test_record(OutboxStatus::Pending, 2);
    let saga_id = record.saga_id;
    store.insert(record);

    let detail = monitoring(&store).saga_detail(saga_id).await.unwrap();

    assert_eq!(detail.backoff_seconds, Some(120));
    assert_eq!(detail.time_in_queue_seconds, None);
    assert_eq!(detail.payload["recipe"]["recipe_code"], "RCP-100");
}

#[tokio::test]
async fn should_show_time_in_queue_for_completed_saga() {
    let store = MemoryOutboxStore::new();
    let mut record = test_record(OutboxStatus::Completed, 1);
    record.processed_at = Some(record.created_at + Duration::milliseconds(1500));
    let saga_id = record.saga_id;
    store.insert(record);

    let detail = monitoring(&store).saga_detail(saga_id).await.unwrap();

    assert_eq!(detail.backoff_seconds, None);
    assert_eq!(detail.time_in_queue_seconds, Some(1.5));
}

#[tokio::test]
async fn should_omit_backoff_for_unattempted_saga() {
    let store = MemoryOutboxStore::new();
    let record = test_record(OutboxStatus::Pending, 0);
    let saga_id = record.saga_id;
    store.insert(record);

    let detail = monitoring(&store).saga_detail(saga_id).await.unwrap();
    assert_eq!(detail.backoff_seconds, None);
}

#[tokio::test]
async fn should_return_not_found_for_unknown_saga_detail() {
    let store = MemoryOutboxStore::new();

    let result = monitoring(&store).saga_detail(Uuid::new_v4()).await;
    assert!(
        matches!(result, Err(ErpSyncError::SagaNotFound)),
        "expected SagaNotFound, got {result:?}"
    );
}
