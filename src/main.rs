use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

use taxi_etl::api;
use taxi_etl::cli::{self, Command};
use taxi_etl::config::Config;
use taxi_etl::services::insights::MySqlInsights;
use taxi_etl::services::pipeline::{EtlPipeline, HttpDownloader};
use taxi_etl::services::sink::MySqlLoader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::parse();

    // Load configuration
    let mut config = Config::from_env().context("Failed to load configuration")?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    match args.command {
        Command::Run { year } => {
            if let Some(year) = year {
                config.dataset.year = year;
                config.validate().context("Invalid --year")?;
            }
            run_pipeline(&config).await
        }
        Command::Serve => serve(&config).await,
    }
}

async fn run_pipeline(config: &Config) -> anyhow::Result<()> {
    let loader = Arc::new(MySqlLoader::new(&config.database)?);
    let pipeline = EtlPipeline::new(config, Arc::new(HttpDownloader::new()), loader);

    let summary = pipeline.run().await.map_err(|e| {
        error!("ETL run failed: {}", e);
        e
    })?;

    for delta in &summary.step_deltas {
        info!(
            "{}: {} -> {} rows ({} dropped)",
            delta.step,
            delta.rows_before,
            delta.rows_after,
            delta.dropped()
        );
    }
    info!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

async fn serve(config: &Config) -> anyhow::Result<()> {
    let insights = Arc::new(MySqlInsights::new(&config.database)?);
    let state = api::handlers::AppState {
        insights,
        year: config.dataset.year,
    };

    // Create router with state
    let app = api::routes::create_router(state);

    // Start server
    let addr: SocketAddr = tokio::net::lookup_host(config.server_address())
        .await?
        .next()
        .with_context(|| format!("Cannot resolve {}", config.server_address()))?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
