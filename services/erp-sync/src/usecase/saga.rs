use anyhow::Context as _;
use uuid::Uuid;

use erp_sync_domain::RecipeSyncResult;

use crate::domain::repository::OutboxStore;
use crate::domain::types::{OutboxEntry, OutboxStatus};
use crate::error::ErpSyncError;

pub const DEFAULT_DEAD_LETTER_LIMIT: u64 = 100;
pub const MAX_DEAD_LETTER_LIMIT: u64 = 1000;

// ── GetEntry ──────────────────────────────────────────────────────────────────

pub struct GetEntryUseCase<S>
where
    S: OutboxStore,
{
    pub store: S,
}

impl<S> GetEntryUseCase<S>
where
    S: OutboxStore,
{
    pub async fn execute(&self, saga_id: Uuid) -> Result<OutboxEntry, ErpSyncError> {
        self.store
            .find_by_saga_id(saga_id)
            .await?
            .map(|record| record.entry())
            .ok_or(ErpSyncError::SagaNotFound)
    }
}

// ── GetResult ─────────────────────────────────────────────────────────────────

pub struct GetResultUseCase<S>
where
    S: OutboxStore,
{
    pub store: S,
}

impl<S> GetResultUseCase<S>
where
    S: OutboxStore,
{
    /// Stored ERP outcome. Sagas that have not completed have none.
    pub async fn execute(&self, saga_id: Uuid) -> Result<RecipeSyncResult, ErpSyncError> {
        let record = self
            .store
            .find_by_saga_id(saga_id)
            .await?
            .ok_or(ErpSyncError::SagaNotFound)?;
        record
            .result()
            .with_context(|| format!("decode stored result of saga {saga_id}"))?
            .ok_or(ErpSyncError::ResultNotFound)
    }
}

// ── ListDeadLetters ───────────────────────────────────────────────────────────

pub struct ListDeadLettersUseCase<S>
where
    S: OutboxStore,
{
    pub store: S,
}

impl<S> ListDeadLettersUseCase<S>
where
    S: OutboxStore,
{
    pub async fn execute(&self, limit: Option<u64>) -> Result<Vec<OutboxEntry>, ErpSyncError> {
        let limit = limit.unwrap_or(DEFAULT_DEAD_LETTER_LIMIT);
        if limit == 0 || limit > MAX_DEAD_LETTER_LIMIT {
            return Err(ErpSyncError::InvalidQuery(format!(
                "limit must be between 1 and {MAX_DEAD_LETTER_LIMIT}"
            )));
        }
        let records = self.store.list_by_status(OutboxStatus::Dead, limit).await?;
        Ok(records.iter().map(|record| record.entry()).collect())
    }
}
