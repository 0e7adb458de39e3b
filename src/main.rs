use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sqlx::migrate::Migrator;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use debit_order_core::cli::{self, Cli, Commands, DbCommands};
use debit_order_core::config::Config;
use debit_order_core::services::{
    MandateService, TransactionProcessor, TransactionService,
};
use debit_order_core::{create_app, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Cli::parse();
    let config = Config::from_env()?;

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Generate { date } => cli::handle_generate(&config, date).await,
        Commands::Process => cli::handle_process(&config).await,
        Commands::Db(DbCommands::Migrate) => cli::handle_db_migrate(&config).await,
        Commands::Config => cli::handle_config_validate(&config),
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let pool = db::create_pool(&config).await?;

    let migrator = Migrator::new(Path::new("./migrations")).await?;
    migrator.run(&pool).await?;
    tracing::info!("Database migrations completed");

    let collaborators = cli::build_collaborators(pool, &config);
    let processor = TransactionProcessor::new(
        collaborators.transactions.clone(),
        collaborators.mandates.clone(),
        collaborators.rail,
        cli::processor_settings(&config),
    );

    let poll_interval = Duration::from_secs(config.processor.poll_interval_secs);
    tokio::spawn(async move { processor.run(poll_interval).await });

    let state = AppState {
        mandates: Arc::new(MandateService::new(collaborators.mandates.clone())),
        transactions: Arc::new(TransactionService::new(
            collaborators.transactions,
            collaborators.mandates,
        )),
    };
    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
