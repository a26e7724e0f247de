use sea_orm::entity::prelude::*;

/// One synchronisation saga pushed to the inventory ERP.
///
/// `(tenant_id, idempotency_key)` is unique (index `uq_erp_outbox_idempotency`).
/// `status` holds the lowercase state tag: pending, in_progress, completed, dead.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "erp_outbox")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub saga_id: Uuid,
    pub tenant_id: Uuid,
    pub idempotency_key: String,
    pub event_type: String,
    pub payload: Json,
    pub status: String,
    pub attempts: i32,
    pub next_run_at: chrono::DateTime<chrono::Utc>,
    pub last_error: Option<String>,
    pub result_payload: Option<Json>,
    pub processing_started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub processed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
