//! Refresh stored forecasts for every spot.
//!
//! Each spot is fetched, merged and persisted independently. A failure for
//! one spot is logged and reported without affecting the others.

use std::sync::Arc;

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use futures_util::future::join_all;
use log::{debug, error, info, warn};
use swellcheck_core::{ForecastRecord, ForecastStore, Spot, SpotId, StoreError};
use thiserror::Error;

use crate::merge::{MergeError, merge_forecast_payloads};
use crate::source::{FetchRequest, MarineDataSource, SourceError};

/// Number of forecast days requested by default.
pub const DEFAULT_FORECAST_DAYS: u32 = 7;

/// Settings for a refresh run.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshSettings {
    api_keys: Vec<String>,
    forecast_days: u32,
}

impl RefreshSettings {
    /// Settings rotating through `api_keys`.
    ///
    /// Blank keys are discarded.
    #[must_use]
    pub fn new<I, K>(api_keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            api_keys: api_keys
                .into_iter()
                .map(Into::into)
                .filter(|key: &String| !key.trim().is_empty())
                .collect(),
            forecast_days: DEFAULT_FORECAST_DAYS,
        }
    }

    /// Set how many days ahead to request.
    #[must_use]
    pub fn with_forecast_days(mut self, forecast_days: u32) -> Self {
        self.forecast_days = forecast_days;
        self
    }

    /// Number of usable API keys.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.api_keys.len()
    }

    /// Days requested per fetch.
    #[must_use]
    pub fn forecast_days(&self) -> u32 {
        self.forecast_days
    }

    /// Key assigned to the spot at `index`, rotating through the list.
    #[must_use]
    pub fn key_for(&self, index: usize) -> Option<&str> {
        let count = self.api_keys.len();
        if count == 0 {
            return None;
        }
        self.api_keys.get(index % count).map(String::as_str)
    }
}

impl std::fmt::Debug for RefreshSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshSettings")
            .field("api_keys", &format_args!("<{} redacted>", self.api_keys.len()))
            .field("forecast_days", &self.forecast_days)
            .finish()
    }
}

/// Fetch window `[today 00:00 UTC, +forecast_days)` for `now`.
///
/// Returns `None` when the end falls outside the representable calendar.
#[must_use]
pub fn fetch_window(
    now: DateTime<Utc>,
    forecast_days: u32,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let end = start.checked_add_signed(TimeDelta::try_days(i64::from(forecast_days))?)?;
    Some((start, end))
}

/// Failure refreshing one spot, or listing the spots to refresh.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The forecast horizon cannot be expressed as a fetch window.
    #[error("a {forecast_days}-day forecast window is out of range")]
    InvalidWindow {
        /// Requested horizon.
        forecast_days: u32,
    },
    /// The spot list could not be read.
    #[error("failed to list spots")]
    ListSpots {
        /// Store error.
        #[source]
        source: StoreError,
    },
    /// A provider fetch failed.
    #[error("spot {spot_id}: provider unavailable")]
    Source {
        /// Affected spot.
        spot_id: SpotId,
        /// Provider error.
        #[source]
        source: SourceError,
    },
    /// The payloads could not be merged.
    #[error("spot {spot_id}: could not merge provider payloads")]
    Merge {
        /// Affected spot.
        spot_id: SpotId,
        /// Merge error.
        #[source]
        source: MergeError,
    },
    /// Persisting the merged records failed.
    #[error("spot {spot_id}: failed to store forecasts")]
    Store {
        /// Affected spot.
        spot_id: SpotId,
        /// Store error.
        #[source]
        source: StoreError,
    },
    /// The blocking persistence task did not complete.
    #[error("spot {spot_id}: persistence task failed: {message}")]
    Task {
        /// Affected spot.
        spot_id: SpotId,
        /// Join error description.
        message: String,
    },
}

impl RefreshError {
    /// Spot the failure belongs to, if any.
    #[must_use]
    pub fn spot_id(&self) -> Option<SpotId> {
        match self {
            Self::InvalidWindow { .. } | Self::ListSpots { .. } => None,
            Self::Source { spot_id, .. }
            | Self::Merge { spot_id, .. }
            | Self::Store { spot_id, .. }
            | Self::Task { spot_id, .. } => Some(*spot_id),
        }
    }
}

/// Outcome of a refresh run.
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Spots refreshed with the number of records written.
    pub refreshed: Vec<(SpotId, usize)>,
    /// Per-spot failures.
    pub failures: Vec<RefreshError>,
}

impl RefreshReport {
    /// Identifiers of the spots that failed.
    #[must_use]
    pub fn failed_spots(&self) -> Vec<SpotId> {
        self.failures
            .iter()
            .filter_map(RefreshError::spot_id)
            .collect()
    }
}

/// Fetch, merge and persist forecasts for every stored spot.
///
/// Spots are processed concurrently. API keys are assigned round-robin in
/// spot order. Without keys nothing is fetched and an empty report is
/// returned.
///
/// # Errors
/// Returns [`RefreshError::InvalidWindow`] when the forecast horizon runs
/// past the representable calendar, and [`RefreshError::ListSpots`] when the
/// spot list cannot be read. Per-spot failures are collected in the report instead.
pub async fn refresh_all_forecasts<S, M>(
    store: Arc<S>,
    source: &M,
    settings: &RefreshSettings,
    now: DateTime<Utc>,
) -> Result<RefreshReport, RefreshError>
where
    S: ForecastStore + 'static,
    M: MarineDataSource + ?Sized,
{
    if settings.key_count() == 0 {
        error!("no provider API keys configured; skipping forecast refresh");
        return Ok(RefreshReport::default());
    }

    let forecast_days = settings.forecast_days();
    let (start, end) =
        fetch_window(now, forecast_days).ok_or(RefreshError::InvalidWindow { forecast_days })?;

    let listing = Arc::clone(&store);
    let spots = tokio::task::spawn_blocking(move || listing.list_spots())
        .await
        .map_err(|err| RefreshError::ListSpots {
            source: StoreError::backend("list spots", err),
        })?
        .map_err(|source| RefreshError::ListSpots { source })?;
    info!("refreshing forecasts for {} spots", spots.len());

    let tasks = spots.into_iter().enumerate().filter_map(|(index, spot)| {
        let key = settings.key_for(index)?;
        let request = FetchRequest::new(spot.latitude, spot.longitude, start, end, key);
        Some(refresh_spot(Arc::clone(&store), source, spot, request, now))
    });

    let mut report = RefreshReport::default();
    for outcome in join_all(tasks).await {
        match outcome {
            Ok(written) => report.refreshed.push(written),
            Err(err) => {
                warn!("{err}");
                report.failures.push(err);
            }
        }
    }
    info!(
        "forecast refresh finished: {} spots stored, {} failed",
        report.refreshed.len(),
        report.failures.len()
    );
    Ok(report)
}

async fn refresh_spot<S, M>(
    store: Arc<S>,
    source: &M,
    spot: Spot,
    request: FetchRequest,
    now: DateTime<Utc>,
) -> Result<(SpotId, usize), RefreshError>
where
    S: ForecastStore + 'static,
    M: MarineDataSource + ?Sized,
{
    let spot_id = spot.id;
    debug!("fetching forecasts for spot {spot_id} ({})", spot.name);
    let (weather, sea_level) = tokio::join!(
        source.fetch_weather(&request),
        source.fetch_sea_level(&request)
    );
    let weather = weather.map_err(|source| RefreshError::Source { spot_id, source })?;
    let sea_level = sea_level.map_err(|source| RefreshError::Source { spot_id, source })?;

    let records = merge_forecast_payloads(&weather, &sea_level)
        .map_err(|source| RefreshError::Merge { spot_id, source })?;
    let written = persist(store, spot_id, records, now).await?;
    info!("stored {written} forecast hours for spot {spot_id}");
    Ok((spot_id, written))
}

async fn persist<S>(
    store: Arc<S>,
    spot_id: SpotId,
    records: Vec<ForecastRecord>,
    now: DateTime<Utc>,
) -> Result<usize, RefreshError>
where
    S: ForecastStore + 'static,
{
    tokio::task::spawn_blocking(move || store.upsert_forecasts(spot_id, &records, now))
        .await
        .map_err(|err| RefreshError::Task {
            spot_id,
            message: err.to_string(),
        })?
        .map_err(|source| RefreshError::Store { spot_id, source })
}
