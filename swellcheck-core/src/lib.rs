#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]
//! Core domain types for the swellcheck forecast engine.
//!
//! The crate holds the pure pieces of the pipeline: tide-phase
//! classification, preference layering, day selection, and the contracts
//! the batch jobs depend on for storage and scoring. A SQLite store lives
//! behind the `store-sqlite` feature.

pub mod cache;
mod direction;
mod forecast;
mod preferences;
mod recommendation;
mod scorer;
mod spot;
pub mod store;
mod tide;
mod user;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use direction::{CardinalDirection, ParseDirectionError, angular_distance};
pub use forecast::{ForecastConditions, ForecastRecord};
pub use preferences::{PreferenceSet, SurfLevel, UserSpotPreference, resolve_preferences};
pub use recommendation::{DailyRecommendation, RankedSpot};
pub use scorer::{ScoreBreakdown, Scorer, ScoringError};
pub use spot::{Spot, SpotId};
pub use store::{
    CacheStore, CachedPayload, ForecastStore, StoreError, SurfStore, UserStore,
};
#[cfg(feature = "store-sqlite")]
pub use store::SqliteStore;
pub use tide::{ParseTideTypeError, SeaLevelSample, TidePoint, TideType, classify_tide_phases};
pub use user::{DaySelection, PresetError, TimeWindow, UserPresetConfig, UserProfile, WEEK_DAYS};
