//! Stylecast server entry point.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stylecast::api::{self, AppState};
use stylecast::application::{MatchTaskExecutor, MatchWorkerPool};
use stylecast::domain::models::Config;
use stylecast::infrastructure::ai::AiClientRouter;
use stylecast::infrastructure::database::{
    create_pool, Migrator, SqliteClothingRepository, SqliteMatchRecordRepository,
    SqliteMemberRepository, SqliteTaskRepository,
};
use stylecast::infrastructure::ConfigLoader;
use stylecast::services::events::{BroadcasterConfig, TaskEventBroadcaster};
use stylecast::services::strategy::{
    AiRecommendationStrategy, RecommendationService, RecommendationStrategy,
    RuleRecommendationStrategy,
};
use stylecast::services::{
    AdmissionGatekeeper, MatchTaskService, OutfitPreviewService, RateLimiter,
};

#[derive(Parser)]
#[command(name = "stylecast", about = "AI outfit pairing recommendation service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a configuration file (defaults to stylecast.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Override the configured listen address
        #[arg(long)]
        listen: Option<String>,
    },
    /// Create the database schema and exit
    InitDb,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };

    match cli.command {
        Commands::Serve { listen } => serve(config, listen).await,
        Commands::InitDb => init_db(config).await,
    }
}

async fn init_db(config: Config) -> Result<()> {
    let pool = create_pool(&config.database).await?;
    let applied = Migrator::new(pool).run().await?;
    info!(applied, path = %config.database.path, "database initialized");
    Ok(())
}

async fn serve(config: Config, listen_override: Option<String>) -> Result<()> {
    let pool = create_pool(&config.database).await?;
    Migrator::new(pool.clone()).run().await?;

    let task_repo = Arc::new(SqliteTaskRepository::new(pool.clone()));
    let member_repo = Arc::new(SqliteMemberRepository::new(pool.clone()));
    let clothing_repo = Arc::new(SqliteClothingRepository::new(pool.clone()));
    let record_repo = Arc::new(SqliteMatchRecordRepository::new(pool));

    let ai_client = Arc::new(AiClientRouter::from_config(&config.ai));
    let strategies: Vec<Arc<dyn RecommendationStrategy>> = vec![
        Arc::new(AiRecommendationStrategy::new(ai_client.clone())),
        Arc::new(RuleRecommendationStrategy),
    ];
    let recommendation = Arc::new(RecommendationService::new(strategies));

    let events = Arc::new(TaskEventBroadcaster::new(BroadcasterConfig::default()));
    let executor = Arc::new(MatchTaskExecutor::new(
        task_repo.clone(),
        member_repo.clone(),
        clothing_repo.clone(),
        record_repo.clone(),
        recommendation,
        events.clone(),
        config.match_pool.progress_pacing_ms,
    ));
    let pool_handle = Arc::new(MatchWorkerPool::start(&config.match_pool, executor));

    let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit.max_requests_per_second));
    let gatekeeper = Arc::new(AdmissionGatekeeper::new(
        rate_limiter,
        clothing_repo.clone(),
        record_repo.clone(),
    ));
    let preview_service = Arc::new(OutfitPreviewService::new(ai_client));

    let task_service = Arc::new(MatchTaskService::new(
        task_repo,
        member_repo,
        clothing_repo,
        record_repo,
        gatekeeper,
        preview_service,
        pool_handle,
    ));

    let state = AppState { task_service, events };
    let app = api::router(state);

    let listen = listen_override.unwrap_or(config.server.listen);
    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .with_context(|| format!("failed to bind {listen}"))?;
    info!(%listen, provider = %config.ai.provider, "stylecast listening");

    axum::serve(listener, app).await?;
    Ok(())
}
