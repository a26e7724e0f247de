use sea_orm_migration::prelude::*;

mod m20261001_000001_create_erp_outbox;
mod m20261001_000002_add_erp_outbox_claim_index;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_erp_outbox::Migration),
            Box::new(m20261001_000002_add_erp_outbox_claim_index::Migration),
        ]
    }
}
