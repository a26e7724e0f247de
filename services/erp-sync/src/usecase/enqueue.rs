use anyhow::Context as _;
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use erp_sync_domain::{RECIPE_UPSERT_EVENT, RecipeSyncCommand};

use crate::domain::repository::OutboxStore;
use crate::domain::types::{Admission, MAX_IDEMPOTENCY_KEY_LEN, NewOutboxEntry, OutboxEntry};
use crate::error::ErpSyncError;

pub struct EnqueueRecipeSyncUseCase<S>
where
    S: OutboxStore,
{
    pub store: S,
}

impl<S> EnqueueRecipeSyncUseCase<S>
where
    S: OutboxStore,
{
    /// Record the intent to sync a recipe. Repeating a `(tenant_id, idempotency_key)`
    /// returns the saga created by the first call; nothing is sent to the ERP here.
    pub async fn execute(&self, command: &RecipeSyncCommand) -> Result<OutboxEntry, ErpSyncError> {
        validate_idempotency_key(&command.idempotency_key)?;

        let payload =
            serde_json::to_value(command).context("serialize recipe sync command")?;
        let entry = NewOutboxEntry {
            id: Uuid::new_v4(),
            saga_id: Uuid::new_v4(),
            tenant_id: command.tenant_id,
            idempotency_key: command.idempotency_key.clone(),
            event_type: RECIPE_UPSERT_EVENT.to_owned(),
            payload,
            created_at: Utc::now(),
        };

        match self.store.admit(&entry).await? {
            Admission::Created(record) => {
                info!(
                    saga_id = %record.saga_id,
                    tenant_id = %record.tenant_id,
                    recipe_code = %command.recipe.recipe_code,
                    "recipe sync enqueued"
                );
                Ok(record.entry())
            }
            Admission::Existing(record) => {
                debug!(
                    saga_id = %record.saga_id,
                    status = %record.status,
                    "duplicate enqueue collapsed onto existing saga"
                );
                Ok(record.entry())
            }
        }
    }
}

fn validate_idempotency_key(key: &str) -> Result<(), ErpSyncError> {
    if key.trim().is_empty() {
        return Err(ErpSyncError::InvalidCommand(
            "idempotency_key must not be blank".to_owned(),
        ));
    }
    if key.len() > MAX_IDEMPOTENCY_KEY_LEN {
        return Err(ErpSyncError::InvalidCommand(format!(
            "idempotency_key exceeds {MAX_IDEMPOTENCY_KEY_LEN} bytes"
        )));
    }
    Ok(())
}
