use chrono::Utc;
use tracing::{error, info, warn};

use erp_sync_domain::{RECIPE_UPSERT_EVENT, RecipeSyncCommand, RecipeSyncResult};

use crate::domain::policy::RetryPolicy;
use crate::domain::repository::{GatewayError, InventoryGateway, OutboxStore};
use crate::domain::types::{OutboxRecord, OutboxStatus, ProcessSummary, Transition};
use crate::error::ErpSyncError;

pub struct ProcessPendingUseCase<S, G>
where
    S: OutboxStore,
    G: InventoryGateway,
{
    pub store: S,
    pub gateway: G,
    pub policy: RetryPolicy,
}

impl<S, G> ProcessPendingUseCase<S, G>
where
    S: OutboxStore,
    G: InventoryGateway,
{
    /// Claim up to `limit` due sagas and push each one to the ERP.
    ///
    /// Per-saga failures are recorded on the row and never abort the batch; only a
    /// failed claim is returned as an error.
    pub async fn execute(&self, limit: u64) -> Result<ProcessSummary, ErpSyncError> {
        // TODO: rows left in_progress by a crashed worker are never reclaimed; needs a
        // reaper keyed on processing_started_at once the recovery policy is decided.
        let claimed = self.store.claim_due(Utc::now(), limit).await?;
        let mut summary = ProcessSummary::default();

        for record in claimed {
            let saga_id = record.saga_id;
            let transition = self.attempt(&record).await;

            match self.store.complete_attempt(saga_id, &transition).await {
                Ok(Some(_)) if transition.status == OutboxStatus::Completed => {
                    summary.record_success(saga_id);
                }
                Ok(Some(_)) => summary.record_failure(saga_id),
                Ok(None) => {
                    warn!(%saga_id, "saga left in_progress before its outcome was recorded");
                    summary.record_failure(saga_id);
                }
                Err(err) => {
                    error!(%saga_id, error = ?err, "failed to record dispatch outcome");
                    summary.record_failure(saga_id);
                }
            }
        }

        Ok(summary)
    }

    /// One delivery attempt for a claimed row, resolved to the transition to persist.
    async fn attempt(&self, record: &OutboxRecord) -> Transition {
        let saga_id = record.saga_id;
        let command = match decode_command(record) {
            Ok(command) => command,
            Err(reason) => {
                warn!(%saga_id, %reason, "undeliverable payload, dead-lettering");
                return Transition::dead(reason, Utc::now());
            }
        };

        match self.gateway.apply(record.tenant_id, &command).await {
            Ok(external_id) => {
                let result = RecipeSyncResult {
                    external_recipe_id: external_id
                        .filter(|id| !id.is_empty())
                        .unwrap_or_else(|| command.recipe.recipe_code.clone()),
                    processed_at: Utc::now(),
                    attempts: record.attempts,
                    notes: None,
                };
                info!(
                    %saga_id,
                    attempts = record.attempts,
                    external_recipe_id = %result.external_recipe_id,
                    "recipe synced to ERP"
                );
                Transition::completed(result)
            }
            Err(GatewayError::Fatal(message)) => {
                warn!(%saga_id, attempts = record.attempts, error = %message, "ERP rejected recipe, dead-lettering");
                Transition::dead(message, Utc::now())
            }
            Err(GatewayError::Transient(message)) => {
                let transition =
                    self.policy
                        .after_transient_failure(record.attempts, message, Utc::now());
                if transition.status == OutboxStatus::Dead {
                    warn!(%saga_id, attempts = record.attempts, "retry budget exhausted, dead-lettering");
                } else {
                    info!(
                        %saga_id,
                        attempts = record.attempts,
                        next_run_at = %transition.next_run_at,
                        "transient ERP failure, retry scheduled"
                    );
                }
                transition
            }
        }
    }
}

/// Deserialize a stored payload into the command to dispatch.
///
/// Errors here are permanent: the stored bytes cannot change between attempts.
fn decode_command(record: &OutboxRecord) -> Result<RecipeSyncCommand, String> {
    if record.event_type != RECIPE_UPSERT_EVENT {
        return Err(format!("unsupported event type {}", record.event_type));
    }
    let command: RecipeSyncCommand = serde_json::from_value(record.payload.clone())
        .map_err(|e| format!("invalid recipe sync payload: {e}"))?;
    if command.tenant_id != record.tenant_id {
        return Err(format!(
            "payload tenant {} does not own saga tenant {}",
            command.tenant_id, record.tenant_id
        ));
    }
    Ok(command)
}
