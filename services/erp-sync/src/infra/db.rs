use anyhow::{Context as _, anyhow};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel as _, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr,
    TransactionTrait,
    sea_query::{LockBehavior, LockType},
};
use uuid::Uuid;

use erp_sync_domain::pagination::PageRequest;
use erp_sync_schema::erp_outbox;

use crate::domain::repository::OutboxStore;
use crate::domain::types::{Admission, NewOutboxEntry, OutboxRecord, OutboxStatus, Transition};
use crate::error::ErpSyncError;

// ── Outbox store ──────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOutboxStore {
    pub db: DatabaseConnection,
}

impl DbOutboxStore {
    async fn find_by_key(
        &self,
        tenant_id: Uuid,
        idempotency_key: &str,
    ) -> Result<Option<OutboxRecord>, ErpSyncError> {
        let model = erp_outbox::Entity::find()
            .filter(erp_outbox::Column::TenantId.eq(tenant_id))
            .filter(erp_outbox::Column::IdempotencyKey.eq(idempotency_key))
            .one(&self.db)
            .await
            .context("find outbox entry by idempotency key")?;
        model.map(record_from_model).transpose()
    }
}

impl OutboxStore for DbOutboxStore {
    async fn admit(&self, entry: &NewOutboxEntry) -> Result<Admission, ErpSyncError> {
        if let Some(existing) = self
            .find_by_key(entry.tenant_id, &entry.idempotency_key)
            .await?
        {
            return Ok(Admission::Existing(existing));
        }

        let inserted = erp_outbox::ActiveModel {
            id: Set(entry.id),
            saga_id: Set(entry.saga_id),
            tenant_id: Set(entry.tenant_id),
            idempotency_key: Set(entry.idempotency_key.clone()),
            event_type: Set(entry.event_type.clone()),
            payload: Set(entry.payload.clone()),
            status: Set(OutboxStatus::Pending.as_str().to_owned()),
            attempts: Set(0),
            next_run_at: Set(entry.created_at),
            last_error: Set(None),
            result_payload: Set(None),
            processing_started_at: Set(None),
            processed_at: Set(None),
            created_at: Set(entry.created_at),
            updated_at: Set(entry.created_at),
        }
        .insert(&self.db)
        .await;

        match inserted {
            Ok(model) => Ok(Admission::Created(record_from_model(model)?)),
            // A concurrent admission of the same key won the insert.
            Err(err) if is_unique_violation(&err) => {
                let existing = self
                    .find_by_key(entry.tenant_id, &entry.idempotency_key)
                    .await?
                    .ok_or_else(|| anyhow!("outbox entry missing after idempotency conflict"))?;
                Ok(Admission::Existing(existing))
            }
            Err(err) => Err(anyhow::Error::new(err)
                .context("insert outbox entry")
                .into()),
        }
    }

    async fn find_by_saga_id(&self, saga_id: Uuid) -> Result<Option<OutboxRecord>, ErpSyncError> {
        let model = erp_outbox::Entity::find()
            .filter(erp_outbox::Column::SagaId.eq(saga_id))
            .one(&self.db)
            .await
            .context("find outbox entry by saga id")?;
        model.map(record_from_model).transpose()
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<OutboxRecord>, ErpSyncError> {
        let claimed = self
            .db
            .transaction::<_, Vec<erp_outbox::Model>, DbErr>(move |txn| {
                Box::pin(async move {
                    let due = erp_outbox::Entity::find()
                        .filter(erp_outbox::Column::Status.eq(OutboxStatus::Pending.as_str()))
                        .filter(erp_outbox::Column::NextRunAt.lte(now))
                        .order_by_asc(erp_outbox::Column::CreatedAt)
                        .limit(limit)
                        .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked)
                        .all(txn)
                        .await?;

                    let mut claimed = Vec::with_capacity(due.len());
                    for model in due {
                        let attempts = model.attempts + 1;
                        let mut active = model.into_active_model();
                        active.status = Set(OutboxStatus::InProgress.as_str().to_owned());
                        active.attempts = Set(attempts);
                        active.processing_started_at = Set(Some(now));
                        active.updated_at = Set(now);
                        claimed.push(active.update(txn).await?);
                    }
                    Ok(claimed)
                })
            })
            .await
            .context("claim due outbox entries")?;
        records_from_models(claimed)
    }

    async fn complete_attempt(
        &self,
        saga_id: Uuid,
        transition: &Transition,
    ) -> Result<Option<OutboxRecord>, ErpSyncError> {
        let result_payload = transition
            .result
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .context("serialize recipe sync result")?;
        let transition = transition.clone();

        let updated = self
            .db
            .transaction::<_, Option<erp_outbox::Model>, DbErr>(move |txn| {
                Box::pin(async move {
                    let Some(model) = erp_outbox::Entity::find()
                        .filter(erp_outbox::Column::SagaId.eq(saga_id))
                        .filter(erp_outbox::Column::Status.eq(OutboxStatus::InProgress.as_str()))
                        .lock_exclusive()
                        .one(txn)
                        .await?
                    else {
                        return Ok(None);
                    };

                    let mut active = model.into_active_model();
                    active.status = Set(transition.status.as_str().to_owned());
                    active.next_run_at = Set(transition.next_run_at);
                    active.last_error = Set(transition.last_error);
                    active.result_payload = Set(result_payload);
                    active.processed_at = Set(Some(transition.processed_at));
                    active.updated_at = Set(transition.processed_at);
                    active.update(txn).await.map(Some)
                })
            })
            .await
            .context("record outbox attempt outcome")?;
        updated.map(record_from_model).transpose()
    }

    async fn list_by_status(
        &self,
        status: OutboxStatus,
        limit: u64,
    ) -> Result<Vec<OutboxRecord>, ErpSyncError> {
        let models = erp_outbox::Entity::find()
            .filter(erp_outbox::Column::Status.eq(status.as_str()))
            .order_by_desc(erp_outbox::Column::UpdatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .context("list outbox entries by status")?;
        records_from_models(models)
    }

    async fn count_by_status(&self, status: OutboxStatus) -> Result<u64, ErpSyncError> {
        let count = erp_outbox::Entity::find()
            .filter(erp_outbox::Column::Status.eq(status.as_str()))
            .count(&self.db)
            .await
            .context("count outbox entries by status")?;
        Ok(count)
    }

    async fn pending_window(
        &self,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, ErpSyncError> {
        let window = erp_outbox::Entity::find()
            .select_only()
            .column_as(erp_outbox::Column::CreatedAt.min(), "oldest")
            .column_as(erp_outbox::Column::CreatedAt.max(), "newest")
            .filter(erp_outbox::Column::Status.eq(OutboxStatus::Pending.as_str()))
            .into_tuple::<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)>()
            .one(&self.db)
            .await
            .context("read pending window")?;
        Ok(match window {
            Some((Some(oldest), Some(newest))) => Some((oldest, newest)),
            _ => None,
        })
    }

    async fn list_created_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<OutboxRecord>, ErpSyncError> {
        let models = erp_outbox::Entity::find()
            .filter(erp_outbox::Column::CreatedAt.gte(since))
            .order_by_asc(erp_outbox::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list outbox entries created since")?;
        records_from_models(models)
    }

    async fn list_attempted(
        &self,
        statuses: &[OutboxStatus],
        page: PageRequest,
    ) -> Result<(Vec<OutboxRecord>, u64), ErpSyncError> {
        let page = page.clamped();
        let query = erp_outbox::Entity::find()
            .filter(erp_outbox::Column::Status.is_in(statuses.iter().map(|s| s.as_str())))
            .filter(erp_outbox::Column::Attempts.gt(0));

        let total = query
            .clone()
            .count(&self.db)
            .await
            .context("count attempted outbox entries")?;
        let models = query
            .order_by_desc(erp_outbox::Column::UpdatedAt)
            .offset(page.offset())
            .limit(u64::from(page.page_size))
            .all(&self.db)
            .await
            .context("list attempted outbox entries")?;
        Ok((records_from_models(models)?, total))
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn record_from_model(model: erp_outbox::Model) -> Result<OutboxRecord, ErpSyncError> {
    let status = model
        .status
        .parse::<OutboxStatus>()
        .with_context(|| format!("decode status of saga {}", model.saga_id))?;
    Ok(OutboxRecord {
        id: model.id,
        saga_id: model.saga_id,
        tenant_id: model.tenant_id,
        idempotency_key: model.idempotency_key,
        event_type: model.event_type,
        payload: model.payload,
        status,
        attempts: model.attempts.max(0) as u32,
        next_run_at: model.next_run_at,
        last_error: model.last_error,
        result_payload: model.result_payload,
        processing_started_at: model.processing_started_at,
        processed_at: model.processed_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

fn records_from_models(models: Vec<erp_outbox::Model>) -> Result<Vec<OutboxRecord>, ErpSyncError> {
    models.into_iter().map(record_from_model).collect()
}
