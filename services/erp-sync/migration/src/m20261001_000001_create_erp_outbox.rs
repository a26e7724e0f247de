use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ErpOutbox::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ErpOutbox::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(ErpOutbox::SagaId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ErpOutbox::TenantId).uuid().not_null())
                    .col(
                        ColumnDef::new(ErpOutbox::IdempotencyKey)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ErpOutbox::EventType).string_len(64).not_null())
                    .col(ColumnDef::new(ErpOutbox::Payload).json_binary().not_null())
                    .col(
                        ColumnDef::new(ErpOutbox::Status)
                            .string_len(32)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(ErpOutbox::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ErpOutbox::NextRunAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ErpOutbox::LastError).text())
                    .col(ColumnDef::new(ErpOutbox::ResultPayload).json_binary())
                    .col(ColumnDef::new(ErpOutbox::ProcessingStartedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(ErpOutbox::ProcessedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(ErpOutbox::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ErpOutbox::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Idempotency scope: one saga per (tenant, key).
        manager
            .create_index(
                Index::create()
                    .table(ErpOutbox::Table)
                    .col(ErpOutbox::TenantId)
                    .col(ErpOutbox::IdempotencyKey)
                    .name("uq_erp_outbox_idempotency")
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ErpOutbox::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub(crate) enum ErpOutbox {
    Table,
    Id,
    SagaId,
    TenantId,
    IdempotencyKey,
    EventType,
    Payload,
    Status,
    Attempts,
    NextRunAt,
    LastError,
    ResultPayload,
    ProcessingStartedAt,
    ProcessedAt,
    CreatedAt,
    UpdatedAt,
}
