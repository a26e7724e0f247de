use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use sea_orm::{Database, DatabaseConnection};
use tokio::sync::watch;
use tracing::info;

use erp_sync::config::ErpSyncConfig;
use erp_sync::domain::policy::RetryPolicy;
use erp_sync::infra::db::DbOutboxStore;
use erp_sync::infra::gateway::HttpInventoryGateway;
use erp_sync::router::build_router;
use erp_sync::state::AppState;
use erp_sync::usecase::enqueue::EnqueueRecipeSyncUseCase;
use erp_sync::usecase::process::ProcessPendingUseCase;
use erp_sync::worker::OutboxWorker;
use erp_sync_core::config::Config as _;
use erp_sync_core::tracing::init_tracing;
use erp_sync_domain::RecipeSyncCommand;

#[derive(Parser)]
#[command(name = "erp-sync", about = "Outbox-backed recipe sync towards the inventory ERP", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the monitoring API and poll the outbox until Ctrl-C
    Serve,
    /// Run a single processing round and print its summary
    Process {
        /// Sagas to claim (default: ERP_SYNC_BATCH_SIZE)
        #[arg(long)]
        limit: Option<u64>,
    },
    /// Enqueue a recipe sync command read from a JSON file
    Enqueue {
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ErpSyncConfig::from_env().context("load configuration")?;
    init_tracing("info,sqlx=warn", config.log_format);

    let policy = config.retry_policy().context("invalid retry policy")?;
    let db = Database::connect(&config.database_url)
        .await
        .context("connect to database")?;

    match cli.command {
        Commands::Serve => serve(config, policy, db).await,
        Commands::Process { limit } => {
            let process = ProcessPendingUseCase {
                store: DbOutboxStore { db },
                gateway: gateway(&config)?,
                policy,
            };
            let summary = process
                .execute(limit.unwrap_or(config.erp_sync_batch_size))
                .await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Commands::Enqueue { file } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("read {}", file.display()))?;
            let command: RecipeSyncCommand = serde_json::from_str(&raw)
                .with_context(|| format!("parse recipe sync command from {}", file.display()))?;
            let uc = EnqueueRecipeSyncUseCase {
                store: DbOutboxStore { db },
            };
            let entry = uc.execute(&command).await?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
            Ok(())
        }
    }
}

async fn serve(
    config: ErpSyncConfig,
    policy: RetryPolicy,
    db: DatabaseConnection,
) -> anyhow::Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker = OutboxWorker {
        process: ProcessPendingUseCase {
            store: DbOutboxStore { db: db.clone() },
            gateway: gateway(&config)?,
            policy: policy.clone(),
        },
        batch_size: config.erp_sync_batch_size,
        poll_interval: config.poll_interval(),
    };
    let worker = tokio::spawn(worker.run(shutdown_rx.clone()));

    let router = build_router(AppState { db, policy });
    let addr = format!("0.0.0.0:{}", config.erp_sync_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    info!("erp-sync listening on {addr}");
    let mut server_shutdown = shutdown_rx;
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        let _ = server_shutdown.wait_for(|stopped| *stopped).await;
    });

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
        }
        let _ = shutdown_tx.send(true);
    });

    server.await.context("http server")?;
    worker.await.context("join outbox worker")?;
    Ok(())
}

fn gateway(config: &ErpSyncConfig) -> anyhow::Result<HttpInventoryGateway> {
    HttpInventoryGateway::new(
        &config.erp_base_url,
        config.erp_api_token.clone(),
        config.erp_timeout(),
    )
}
