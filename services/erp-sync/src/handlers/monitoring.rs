use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use serde::Deserialize;
use uuid::Uuid;

use erp_sync_domain::pagination::PageRequest;

use crate::error::ErpSyncError;
use crate::state::AppState;
use crate::usecase::monitoring::{
    FailedSyncPage, MonitoringUseCase, QueueStatus, SagaDetail, SyncMetrics,
};

// ── Query params ─────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct MetricsQuery {
    pub hours: Option<u32>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct FailedQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub include_dead: Option<bool>,
}

fn monitoring(state: &AppState) -> MonitoringUseCase<crate::infra::db::DbOutboxStore> {
    MonitoringUseCase {
        store: state.outbox_store(),
        policy: state.policy.clone(),
    }
}

pub(crate) fn invalid_query(rejection: QueryRejection) -> ErpSyncError {
    ErpSyncError::InvalidQuery(rejection.body_text())
}

// ── GET /erp/status ──────────────────────────────────────────────────────────

pub async fn get_status(State(state): State<AppState>) -> Result<Json<QueueStatus>, ErpSyncError> {
    Ok(Json(monitoring(&state).queue_status().await?))
}

// ── GET /erp/metrics ─────────────────────────────────────────────────────────

pub async fn get_metrics(
    State(state): State<AppState>,
    query: Result<Query<MetricsQuery>, QueryRejection>,
) -> Result<Json<SyncMetrics>, ErpSyncError> {
    let Query(query) = query.map_err(invalid_query)?;
    Ok(Json(monitoring(&state).metrics(query.hours).await?))
}

// ── GET /erp/failed ──────────────────────────────────────────────────────────

pub async fn get_failed(
    State(state): State<AppState>,
    query: Result<Query<FailedQuery>, QueryRejection>,
) -> Result<Json<FailedSyncPage>, ErpSyncError> {
    let Query(query) = query.map_err(invalid_query)?;
    let defaults = PageRequest::default();
    let page = PageRequest {
        page: query.page.unwrap_or(defaults.page),
        page_size: query.page_size.unwrap_or(defaults.page_size),
    };
    let result = monitoring(&state)
        .failed_syncs(page, query.include_dead.unwrap_or(true))
        .await?;
    Ok(Json(result))
}

// ── GET /erp/saga/{saga_id} ──────────────────────────────────────────────────

pub async fn get_saga(
    State(state): State<AppState>,
    Path(saga_id): Path<Uuid>,
) -> Result<Json<SagaDetail>, ErpSyncError> {
    Ok(Json(monitoring(&state).saga_detail(saga_id).await?))
}
