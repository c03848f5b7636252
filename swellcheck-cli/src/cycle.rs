//! One worker cycle: refresh forecasts, recompute recommendations, then
//! delete forecasts past the retention window.
//!
//! Each step's failure is logged and recorded in the [`CycleReport`]; none of
//! them prevents the steps after it. Cleanup always runs.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use swellcheck_core::{ForecastStore, Scorer, StoreError, SurfStore};
use swellcheck_data::{
    MarineDataSource, RefreshError, RefreshReport, RefreshSettings, refresh_all_forecasts,
};
use swellcheck_scorer::{
    AggregationSettings, RecommendationError, RecommendationReport, recompute_all_recommendations,
};
use tracing::{Instrument, error, info, info_span, warn};

/// Settings for every step of a cycle.
#[derive(Debug, Clone)]
pub struct CycleSettings {
    /// Provider keys and fetch horizon.
    pub refresh: RefreshSettings,
    /// Qualifying threshold for recommendations.
    pub aggregation: AggregationSettings,
    /// How far back forecasts are kept.
    pub retention: TimeDelta,
}

/// What each step of a cycle produced.
#[derive(Debug)]
pub struct CycleReport {
    /// Forecast refresh outcome.
    pub refresh: Result<RefreshReport, RefreshError>,
    /// Recommendation recompute outcome.
    pub recommendations: Result<RecommendationReport, RecommendationError>,
    /// Rows removed by the retention cleanup.
    pub cleanup: Result<usize, StoreError>,
}

impl CycleReport {
    /// True when every step ran and no unit of work failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        let refresh_ok = self
            .refresh
            .as_ref()
            .is_ok_and(|report| report.failures.is_empty());
        let recommendations_ok = self
            .recommendations
            .as_ref()
            .is_ok_and(|report| report.failures.is_empty());
        refresh_ok && recommendations_ok && self.cleanup.is_ok()
    }
}

/// Run one cycle against `store`.
///
/// Forecasts older than `now - settings.retention` are deleted at the end
/// regardless of how the earlier steps went.
pub async fn run_cycle<S, M, C>(
    store: Arc<S>,
    source: &M,
    scorer: Arc<C>,
    settings: &CycleSettings,
    now: DateTime<Utc>,
) -> CycleReport
where
    S: SurfStore + 'static,
    M: MarineDataSource + ?Sized,
    C: Scorer + ?Sized + 'static,
{
    let refresh = refresh_all_forecasts(Arc::clone(&store), source, &settings.refresh, now)
        .instrument(info_span!("refresh_forecasts"))
        .await;
    match &refresh {
        Ok(report) => info!(
            refreshed = report.refreshed.len(),
            failed = report.failures.len(),
            "forecast refresh complete"
        ),
        Err(err) => error!(error = %err, "forecast refresh aborted"),
    }

    let recommendations =
        recompute_all_recommendations(Arc::clone(&store), scorer, now, settings.aggregation)
            .instrument(info_span!("recompute_recommendations"))
            .await;
    match &recommendations {
        Ok(report) => info!(
            completed = report.completed.len(),
            skipped = report.skipped_users.len(),
            failed = report.failures.len(),
            "recommendation recompute complete"
        ),
        Err(err) => error!(error = %err, "recommendation recompute aborted"),
    }

    let threshold = now
        .checked_sub_signed(settings.retention)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let cleanup = delete_expired(store, threshold)
        .instrument(info_span!("retention_cleanup", %threshold))
        .await;
    match &cleanup {
        Ok(removed) => info!(removed, "deleted expired forecasts"),
        Err(err) => warn!(error = %err, "failed to delete expired forecasts"),
    }

    CycleReport {
        refresh,
        recommendations,
        cleanup,
    }
}

async fn delete_expired<S>(store: Arc<S>, threshold: DateTime<Utc>) -> Result<usize, StoreError>
where
    S: ForecastStore + 'static,
{
    tokio::task::spawn_blocking(move || store.delete_forecasts_older_than(threshold))
        .await
        .map_err(|err| StoreError::backend("delete expired forecasts", err))?
}
