//! Personalised surf recommendations.
//!
//! The crate turns stored forecasts into ranked, cached recommendations:
//! - **Aggregation** scores every forecast hour inside a configuration's
//!   days and time window, keeps hours above the qualifying threshold, and
//!   reduces them to the best session per spot and date.
//! - **Jobs** fan the aggregation out across every user with an active
//!   preset, computing the `today`, `tomorrow` and preset configurations
//!   concurrently and caching each non-empty result.
//! - [`ConditionScorer`] is a reference [`Scorer`](swellcheck_core::Scorer)
//!   comparing conditions with the resolved preferences. Any other scorer can
//!   be plugged in through the trait.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use chrono::Utc;
//! use swellcheck_core::SqliteStore;
//! use swellcheck_scorer::{AggregationSettings, ConditionScorer, recompute_all_recommendations};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(SqliteStore::open_in_memory()?);
//! let scorer = Arc::new(ConditionScorer::default());
//! let report =
//!     recompute_all_recommendations(store, scorer, Utc::now(), AggregationSettings::default())
//!         .await?;
//! assert!(report.failures.is_empty());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod aggregate;
mod condition;
mod error;
mod jobs;

pub use aggregate::{
    AggregationSettings, Aggregator, CacheOutcome, QUALIFYING_SCORE_THRESHOLD,
    RecommendationConfig,
};
pub use condition::{ConditionScorer, ConditionScorerError, ConditionWeights};
pub use error::RecommendationError;
pub use jobs::{
    RecommendationOutcome, RecommendationReport, TODAY_KEY, TOMORROW_KEY, configurations_for,
    recompute_all_recommendations,
};
