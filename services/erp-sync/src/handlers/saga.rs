use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use serde::Deserialize;
use uuid::Uuid;

use erp_sync_domain::RecipeSyncResult;

use crate::domain::types::OutboxEntry;
use crate::error::ErpSyncError;
use crate::handlers::monitoring::invalid_query;
use crate::state::AppState;
use crate::usecase::saga::{GetEntryUseCase, GetResultUseCase, ListDeadLettersUseCase};

#[derive(Deserialize, Default)]
pub struct DeadLetterQuery {
    pub limit: Option<u64>,
}

// ── GET /erp/dead-letter ─────────────────────────────────────────────────────

pub async fn get_dead_letters(
    State(state): State<AppState>,
    query: Result<Query<DeadLetterQuery>, QueryRejection>,
) -> Result<Json<Vec<OutboxEntry>>, ErpSyncError> {
    let Query(query) = query.map_err(invalid_query)?;
    let uc = ListDeadLettersUseCase {
        store: state.outbox_store(),
    };
    Ok(Json(uc.execute(query.limit).await?))
}

// ── GET /erp/saga/{saga_id}/entry ────────────────────────────────────────────

pub async fn get_entry(
    State(state): State<AppState>,
    Path(saga_id): Path<Uuid>,
) -> Result<Json<OutboxEntry>, ErpSyncError> {
    let uc = GetEntryUseCase {
        store: state.outbox_store(),
    };
    Ok(Json(uc.execute(saga_id).await?))
}

// ── GET /erp/saga/{saga_id}/result ───────────────────────────────────────────

pub async fn get_result(
    State(state): State<AppState>,
    Path(saga_id): Path<Uuid>,
) -> Result<Json<RecipeSyncResult>, ErpSyncError> {
    let uc = GetResultUseCase {
        store: state.outbox_store(),
    };
    Ok(Json(uc.execute(saga_id).await?))
}
