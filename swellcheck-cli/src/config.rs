//! Layered configuration for the `run` subcommand.

use std::time::Duration;

use camino::Utf8PathBuf;
use chrono::TimeDelta;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use swellcheck_data::{
    DEFAULT_FORECAST_DAYS, DEFAULT_SEA_LEVEL_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_WEATHER_URL,
    HttpMarineSourceConfig, RefreshSettings,
};
use swellcheck_scorer::AggregationSettings;

use crate::cycle::CycleSettings;
use crate::{
    ARG_API_KEYS, ARG_DATABASE, ARG_FORECAST_DAYS, ARG_REQUEST_TIMEOUT_SECS, ARG_RETENTION_DAYS,
    ARG_SEA_LEVEL_URL, ARG_WEATHER_URL, CliError, ENV_DATABASE,
};

/// Days of forecasts kept by the cleanup step.
pub(crate) const DEFAULT_RETENTION_DAYS: u32 = 7;

/// Longest forecast horizon the worker requests.
pub(crate) const MAX_FORECAST_DAYS: u32 = 30;

/// CLI arguments for the `run` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Run one worker cycle: refresh forecasts for every spot, \
                 recompute cached recommendations for every user with an \
                 active preset, then delete forecasts past the retention \
                 window. Options can come from CLI flags, configuration \
                 files, or environment variables.",
    about = "Run one forecast and recommendation cycle"
)]
#[ortho_config(prefix = "SWELLCHECK")]
pub(crate) struct WorkerArgs {
    /// Path to the SQLite database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Provider API keys, rotated across spots.
    #[arg(long = ARG_API_KEYS, value_name = "key", value_delimiter = ',')]
    #[serde(default)]
    pub(crate) api_keys: Option<Vec<String>>,
    /// Point-weather endpoint.
    #[arg(long = ARG_WEATHER_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) weather_url: Option<String>,
    /// Sea-level endpoint.
    #[arg(long = ARG_SEA_LEVEL_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) sea_level_url: Option<String>,
    /// Days of forecasts requested from the provider.
    #[arg(long = ARG_FORECAST_DAYS, value_name = "days")]
    #[serde(default)]
    pub(crate) forecast_days: Option<u32>,
    /// Days of past forecasts kept after each cycle.
    #[arg(long = ARG_RETENTION_DAYS, value_name = "days")]
    #[serde(default)]
    pub(crate) retention_days: Option<u32>,
    /// Per-request timeout for provider calls.
    #[arg(long = ARG_REQUEST_TIMEOUT_SECS, value_name = "seconds")]
    #[serde(default)]
    pub(crate) request_timeout_secs: Option<u64>,
}

impl WorkerArgs {
    pub(crate) fn into_config(self) -> Result<WorkerConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        WorkerConfig::try_from(merged)
    }
}

/// Fully resolved worker configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WorkerConfig {
    pub(crate) database: Utf8PathBuf,
    pub(crate) api_keys: Vec<String>,
    pub(crate) weather_url: String,
    pub(crate) sea_level_url: String,
    pub(crate) forecast_days: u32,
    pub(crate) retention_days: u32,
    pub(crate) request_timeout: Duration,
}

impl WorkerConfig {
    pub(crate) fn source_config(&self) -> HttpMarineSourceConfig {
        HttpMarineSourceConfig::new(self.weather_url.clone(), self.sea_level_url.clone())
            .with_timeout(self.request_timeout)
    }

    pub(crate) fn cycle_settings(&self) -> CycleSettings {
        CycleSettings {
            refresh: RefreshSettings::new(self.api_keys.iter().cloned())
                .with_forecast_days(self.forecast_days),
            aggregation: AggregationSettings::default(),
            retention: TimeDelta::days(i64::from(self.retention_days)),
        }
    }
}

impl TryFrom<WorkerArgs> for WorkerConfig {
    type Error = CliError;

    fn try_from(args: WorkerArgs) -> Result<Self, Self::Error> {
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_DATABASE,
        })?;
        let forecast_days = args.forecast_days.unwrap_or(DEFAULT_FORECAST_DAYS);
        if forecast_days == 0 {
            return Err(CliError::InvalidArgument {
                field: ARG_FORECAST_DAYS,
                reason: "at least one day must be requested",
            });
        }
        if forecast_days > MAX_FORECAST_DAYS {
            return Err(CliError::InvalidArgument {
                field: ARG_FORECAST_DAYS,
                reason: "at most 30 days can be requested",
            });
        }
        let timeout_secs = args.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(CliError::InvalidArgument {
                field: ARG_REQUEST_TIMEOUT_SECS,
                reason: "the timeout must be positive",
            });
        }
        Ok(Self {
            database,
            api_keys: args.api_keys.unwrap_or_default(),
            weather_url: args
                .weather_url
                .unwrap_or_else(|| DEFAULT_WEATHER_URL.to_owned()),
            sea_level_url: args
                .sea_level_url
                .unwrap_or_else(|| DEFAULT_SEA_LEVEL_URL.to_owned()),
            forecast_days,
            retention_days: args.retention_days.unwrap_or(DEFAULT_RETENTION_DAYS),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<WorkerConfig, CliError> {
    let merged = WorkerArgs::merge_from_layers(layers).map_err(CliError::from)?;
    WorkerConfig::try_from(merged)
}
