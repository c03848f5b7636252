#![forbid(unsafe_code)]
//! Provider access and forecast ingestion for swellcheck.
//!
//! Responsibilities:
//! - Fetch raw weather and sea-level payloads from the marine provider.
//! - Merge those payloads into hourly forecast records with tide phases.
//! - Refresh stored forecasts for every spot, isolating per-spot failures.
//!
//! Boundaries:
//! - Do not encode scoring or recommendation rules (live in
//!   `swellcheck-scorer`).
//! - Keep blocking store calls off async executors via `spawn_blocking`.
//!
//! Invariants:
//! - A spot whose payloads cannot be fetched or merged is never partially
//!   written.
//! - No global mutable state.

pub mod merge;
pub mod refresh;
pub mod source;

#[doc(hidden)]
pub mod test_support;

pub use merge::{MergeError, WEATHER_PARAMETERS, merge_forecast_payloads};
pub use refresh::{
    DEFAULT_FORECAST_DAYS, RefreshError, RefreshReport, RefreshSettings, fetch_window,
    refresh_all_forecasts,
};
pub use source::{
    DEFAULT_SEA_LEVEL_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, DEFAULT_WEATHER_URL,
    FetchRequest, HttpMarineSource, HttpMarineSourceConfig, MarineDataSource, SourceBuildError,
    SourceError,
};
