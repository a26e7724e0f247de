#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use erp_sync_domain::RecipeSyncCommand;
use erp_sync_domain::pagination::PageRequest;

use crate::domain::types::{Admission, NewOutboxEntry, OutboxRecord, OutboxStatus, Transition};
use crate::error::ErpSyncError;

/// Durable store of outbox sagas. The single source of truth shared by every worker.
pub trait OutboxStore: Send + Sync {
    /// Insert a pending row unless `(tenant_id, idempotency_key)` already exists,
    /// in which case the existing row is returned untouched.
    async fn admit(&self, entry: &NewOutboxEntry) -> Result<Admission, ErpSyncError>;

    async fn find_by_saga_id(&self, saga_id: Uuid) -> Result<Option<OutboxRecord>, ErpSyncError>;

    /// Claim up to `limit` pending rows due at `now`, oldest `created_at` first.
    ///
    /// Rows held by another claimer are skipped, never waited on. Every returned
    /// row has already been persisted as `in_progress` with `attempts` incremented
    /// and `processing_started_at = now`.
    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<OutboxRecord>, ErpSyncError>;

    /// Write the outcome of an attempt onto a claimed row.
    ///
    /// Returns `None` (and writes nothing) if the row is no longer `in_progress`.
    async fn complete_attempt(
        &self,
        saga_id: Uuid,
        transition: &Transition,
    ) -> Result<Option<OutboxRecord>, ErpSyncError>;

    /// Rows in `status`, most recently updated first.
    async fn list_by_status(
        &self,
        status: OutboxStatus,
        limit: u64,
    ) -> Result<Vec<OutboxRecord>, ErpSyncError>;

    async fn count_by_status(&self, status: OutboxStatus) -> Result<u64, ErpSyncError>;

    /// `(oldest, newest)` `created_at` among pending rows.
    async fn pending_window(
        &self,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, ErpSyncError>;

    async fn list_created_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<OutboxRecord>, ErpSyncError>;

    /// Page of rows in any of `statuses` with at least one attempt, most recently
    /// updated first, plus the total number of such rows.
    async fn list_attempted(
        &self,
        statuses: &[OutboxStatus],
        page: PageRequest,
    ) -> Result<(Vec<OutboxRecord>, u64), ErpSyncError>;
}

/// Failure reported by the downstream ERP.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Permanent rejection; no retry can succeed.
    #[error("{0}")]
    Fatal(String),
    /// Anything else: network, timeout, temporary unavailability.
    #[error("{0}")]
    Transient(String),
}

/// Port onto the inventory ERP.
pub trait InventoryGateway: Send + Sync {
    /// Apply one recipe upsert. Returns the ERP's identifier for the recipe, if it sent one.
    async fn apply(
        &self,
        tenant_id: Uuid,
        command: &RecipeSyncCommand,
    ) -> Result<Option<String>, GatewayError>;
}
