use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use erp_sync_core::serde::{opt_to_rfc3339_ms, to_rfc3339_ms};
use erp_sync_domain::pagination::{MAX_PAGE_SIZE, PageRequest};

use crate::domain::policy::RetryPolicy;
use crate::domain::repository::OutboxStore;
use crate::domain::types::{OutboxRecord, OutboxStatus};
use crate::error::ErpSyncError;

pub const DEFAULT_METRICS_HOURS: u32 = 24;
pub const MAX_METRICS_HOURS: u32 = 168;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueStatus {
    pub pending_count: u64,
    pub in_progress_count: u64,
    pub completed_count: u64,
    pub dead_count: u64,
    #[serde(serialize_with = "opt_to_rfc3339_ms")]
    pub oldest_pending_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "opt_to_rfc3339_ms")]
    pub newest_pending_at: Option<DateTime<Utc>>,
    pub total_queue_size: u64,
    pub backlog_hours: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetryMetrics {
    pub total_retries: u64,
    pub avg_retries_per_saga: f64,
    pub max_retries_saga_id: Option<Uuid>,
    pub max_retries_count: u32,
    pub sagas_with_retries: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncMetrics {
    /// Percentage, 0 to 100.
    pub success_rate: f64,
    pub avg_latency_seconds: f64,
    pub total_processed: u64,
    pub total_succeeded: u64,
    pub total_failed: u64,
    pub retry_metrics: RetryMetrics,
    pub dead_letter_queue_size: u64,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub period_start: DateTime<Utc>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub period_end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedSync {
    pub saga_id: Uuid,
    pub tenant_id: Uuid,
    pub event_type: String,
    pub idempotency_key: String,
    pub status: OutboxStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub next_run_at: DateTime<Utc>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
    pub payload_summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedSyncPage {
    pub items: Vec<FailedSync>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SagaDetail {
    pub saga_id: Uuid,
    pub tenant_id: Uuid,
    pub idempotency_key: String,
    pub event_type: String,
    pub status: OutboxStatus,
    pub attempts: u32,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub next_run_at: DateTime<Utc>,
    pub last_error: Option<String>,
    pub payload: serde_json::Value,
    pub result_payload: Option<serde_json::Value>,
    #[serde(serialize_with = "opt_to_rfc3339_ms")]
    pub processing_started_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "opt_to_rfc3339_ms")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
    /// Delay applied after the latest failed attempt; only set while a retry is pending.
    pub backoff_seconds: Option<i64>,
    pub time_in_queue_seconds: Option<f64>,
}

/// Read-only projections over the outbox for operators.
pub struct MonitoringUseCase<S>
where
    S: OutboxStore,
{
    pub store: S,
    pub policy: RetryPolicy,
}

impl<S> MonitoringUseCase<S>
where
    S: OutboxStore,
{
    pub async fn queue_status(&self) -> Result<QueueStatus, ErpSyncError> {
        let pending_count = self.store.count_by_status(OutboxStatus::Pending).await?;
        let in_progress_count = self.store.count_by_status(OutboxStatus::InProgress).await?;
        let completed_count = self.store.count_by_status(OutboxStatus::Completed).await?;
        let dead_count = self.store.count_by_status(OutboxStatus::Dead).await?;
        let window = self.store.pending_window().await?;

        let now = Utc::now();
        Ok(QueueStatus {
            pending_count,
            in_progress_count,
            completed_count,
            dead_count,
            oldest_pending_at: window.map(|(oldest, _)| oldest),
            newest_pending_at: window.map(|(_, newest)| newest),
            total_queue_size: pending_count + in_progress_count,
            backlog_hours: window.map(|(oldest, _)| seconds_between(oldest, now) / 3600.0),
        })
    }

    pub async fn metrics(&self, hours: Option<u32>) -> Result<SyncMetrics, ErpSyncError> {
        let hours = hours.unwrap_or(DEFAULT_METRICS_HOURS);
        if !(1..=MAX_METRICS_HOURS).contains(&hours) {
            return Err(ErpSyncError::InvalidQuery(format!(
                "hours must be between 1 and {MAX_METRICS_HOURS}"
            )));
        }

        let period_end = Utc::now();
        let period_start = period_end - Duration::hours(i64::from(hours));
        let records = self.store.list_created_since(period_start).await?;
        let dead_count = self.store.count_by_status(OutboxStatus::Dead).await?;

        Ok(summarize_metrics(
            &records,
            dead_count,
            period_start,
            period_end,
        ))
    }

    pub async fn failed_syncs(
        &self,
        page: PageRequest,
        include_dead: bool,
    ) -> Result<FailedSyncPage, ErpSyncError> {
        if page.page == 0 {
            return Err(ErpSyncError::InvalidQuery("page starts at 1".to_owned()));
        }
        if page.page_size == 0 || page.page_size > MAX_PAGE_SIZE {
            return Err(ErpSyncError::InvalidQuery(format!(
                "page-size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        let statuses: &[OutboxStatus] = if include_dead {
            &[OutboxStatus::Pending, OutboxStatus::Dead]
        } else {
            &[OutboxStatus::Pending]
        };

        let (records, total_count) = self.store.list_attempted(statuses, page).await?;
        Ok(FailedSyncPage {
            items: records.into_iter().map(failed_sync).collect(),
            total_count,
            page: page.page,
            page_size: page.page_size,
        })
    }

    pub async fn saga_detail(&self, saga_id: Uuid) -> Result<SagaDetail, ErpSyncError> {
        let record = self
            .store
            .find_by_saga_id(saga_id)
            .await?
            .ok_or(ErpSyncError::SagaNotFound)?;

        let backoff_seconds = (record.status == OutboxStatus::Pending && record.attempts > 0)
            .then(|| self.policy.backoff_for(record.attempts).num_seconds());
        let time_in_queue_seconds = record
            .processed_at
            .map(|processed_at| seconds_between(record.created_at, processed_at));

        Ok(SagaDetail {
            saga_id: record.saga_id,
            tenant_id: record.tenant_id,
            idempotency_key: record.idempotency_key,
            event_type: record.event_type,
            status: record.status,
            attempts: record.attempts,
            next_run_at: record.next_run_at,
            last_error: record.last_error,
            payload: record.payload,
            result_payload: record.result_payload,
            processing_started_at: record.processing_started_at,
            processed_at: record.processed_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
            backoff_seconds,
            time_in_queue_seconds,
        })
    }
}

/// Aggregate the rows created inside a metrics window.
pub fn summarize_metrics(
    records: &[OutboxRecord],
    dead_letter_queue_size: u64,
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
) -> SyncMetrics {
    let total_processed = records.len() as u64;
    let total_succeeded = records
        .iter()
        .filter(|r| r.status == OutboxStatus::Completed)
        .count() as u64;
    let total_failed = records
        .iter()
        .filter(|r| matches!(r.status, OutboxStatus::Pending | OutboxStatus::Dead) && r.attempts > 0)
        .count() as u64;

    let latencies: Vec<f64> = records
        .iter()
        .filter(|r| r.status == OutboxStatus::Completed)
        .filter_map(|r| r.processed_at.map(|at| seconds_between(r.created_at, at)))
        .collect();

    let retried: Vec<&OutboxRecord> = records.iter().filter(|r| r.attempts > 1).collect();
    let total_retries: u64 = retried.iter().map(|r| u64::from(r.attempts - 1)).sum();

    // First row wins on ties.
    let most_attempted = records
        .iter()
        .fold(None::<&OutboxRecord>, |best, r| match best {
            Some(b) if b.attempts >= r.attempts => Some(b),
            _ => Some(r),
        });

    SyncMetrics {
        success_rate: ratio(total_succeeded as f64, total_processed) * 100.0,
        avg_latency_seconds: mean(&latencies),
        total_processed,
        total_succeeded,
        total_failed,
        retry_metrics: RetryMetrics {
            total_retries,
            avg_retries_per_saga: ratio(total_retries as f64, total_processed),
            max_retries_saga_id: most_attempted.map(|r| r.saga_id),
            max_retries_count: most_attempted.map_or(0, |r| r.attempts),
            sagas_with_retries: retried.len() as u64,
        },
        dead_letter_queue_size,
        period_start,
        period_end,
    }
}

/// `"{recipe_code} v{version}"` for payloads carrying a recipe.
pub fn payload_summary(payload: &serde_json::Value) -> Option<String> {
    let recipe = payload.get("recipe")?;
    let field = |name: &str| match recipe.get(name) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => "N/A".to_owned(),
        Some(other) => other.to_string(),
    };
    Some(format!("{} v{}", field("recipe_code"), field("version")))
}

fn failed_sync(record: OutboxRecord) -> FailedSync {
    FailedSync {
        payload_summary: payload_summary(&record.payload),
        saga_id: record.saga_id,
        tenant_id: record.tenant_id,
        event_type: record.event_type,
        idempotency_key: record.idempotency_key,
        status: record.status,
        attempts: record.attempts,
        last_error: record.last_error,
        next_run_at: record.next_run_at,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

fn ratio(numerator: f64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}

fn mean(values: &[f64]) -> f64 {
    ratio(values.iter().sum(), values.len() as u64)
}
