use sea_orm_migration::prelude::*;

use crate::m20261001_000001_create_erp_outbox::ErpOutbox;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Worker claim query: status = 'pending' AND next_run_at <= now.
        manager
            .create_index(
                Index::create()
                    .table(ErpOutbox::Table)
                    .col(ErpOutbox::Status)
                    .col(ErpOutbox::NextRunAt)
                    .name("idx_erp_outbox_status_next_run_at")
                    .to_owned(),
            )
            .await?;
        // Monitoring lists (dead letters, failed syncs) sort by updated_at.
        manager
            .create_index(
                Index::create()
                    .table(ErpOutbox::Table)
                    .col(ErpOutbox::Status)
                    .col(ErpOutbox::UpdatedAt)
                    .name("idx_erp_outbox_status_updated_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_erp_outbox_status_updated_at")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_erp_outbox_status_next_run_at")
                    .to_owned(),
            )
            .await
    }
}
