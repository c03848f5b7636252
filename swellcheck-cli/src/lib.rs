//! Command-line interface for the swellcheck worker.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod config;
mod cycle;
mod error;

use config::{WorkerArgs, WorkerConfig};
pub use cycle::{CycleReport, CycleSettings, run_cycle};
pub use error::CliError;

const ARG_DATABASE: &str = "database";
const ARG_API_KEYS: &str = "api-keys";
const ARG_WEATHER_URL: &str = "weather-url";
const ARG_SEA_LEVEL_URL: &str = "sea-level-url";
const ARG_FORECAST_DAYS: &str = "forecast-days";
const ARG_RETENTION_DAYS: &str = "retention-days";
const ARG_REQUEST_TIMEOUT_SECS: &str = "request-timeout-secs";
const ENV_DATABASE: &str = "SWELLCHECK_CMDS_RUN_DATABASE";

/// Run the swellcheck CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Run(args) => run_worker(args.into_config()?),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "swellcheck",
    about = "Surf forecast refresh and recommendation worker",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Refresh forecasts, recompute recommendations, and clean up.
    Run(WorkerArgs),
}

#[cfg(feature = "store-sqlite")]
fn run_worker(config: WorkerConfig) -> Result<(), CliError> {
    use std::sync::Arc;

    use swellcheck_core::SqliteStore;
    use swellcheck_data::HttpMarineSource;
    use swellcheck_scorer::ConditionScorer;

    let store = SqliteStore::open(&config.database).map_err(|source| CliError::OpenStore {
        path: config.database.clone(),
        source,
    })?;
    let source = HttpMarineSource::with_config(config.source_config()).map_err(|source| {
        CliError::BuildSource {
            weather_url: config.weather_url.clone(),
            source,
        }
    })?;
    let settings = config.cycle_settings();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    tracing::info!(database = %config.database, "starting worker cycle");
    let report = runtime.block_on(run_cycle(
        Arc::new(store),
        &source,
        Arc::new(ConditionScorer::default()),
        &settings,
        chrono::Utc::now(),
    ));
    if report.is_clean() {
        tracing::info!("worker cycle finished");
    } else {
        tracing::warn!("worker cycle finished with failures; see log for details");
    }
    Ok(())
}

#[cfg(not(feature = "store-sqlite"))]
fn run_worker(_config: WorkerConfig) -> Result<(), CliError> {
    Err(CliError::MissingFeature {
        feature: "store-sqlite",
        action: "running the worker",
    })
}

#[cfg(test)]
mod tests;
