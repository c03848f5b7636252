//! Facade crate for the swellcheck forecast engine.
//!
//! This crate re-exports the core domain types and exposes forecast
//! ingestion, recommendation jobs, and the SQLite store behind feature
//! flags.

#![forbid(unsafe_code)]

pub use swellcheck_core::{
    CacheStore, CardinalDirection, DailyRecommendation, DaySelection, ForecastConditions,
    ForecastRecord, ForecastStore, PreferenceSet, PresetError, RankedSpot, ScoreBreakdown, Scorer,
    ScoringError, Spot, SpotId, StoreError, SurfLevel, SurfStore, TideType, TimeWindow,
    UserPresetConfig, UserProfile, UserSpotPreference, UserStore, classify_tide_phases,
    resolve_preferences,
};

#[cfg(feature = "store-sqlite")]
pub use swellcheck_core::SqliteStore;

#[cfg(feature = "data")]
pub use swellcheck_data::{
    HttpMarineSource, HttpMarineSourceConfig, MarineDataSource, RefreshReport, RefreshSettings,
    merge_forecast_payloads, refresh_all_forecasts,
};

#[cfg(feature = "scorer")]
pub use swellcheck_scorer::{
    AggregationSettings, ConditionScorer, RecommendationReport, recompute_all_recommendations,
};
