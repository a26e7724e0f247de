use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    cli::run_cli(erp_sync_migration::Migrator).await;
}
