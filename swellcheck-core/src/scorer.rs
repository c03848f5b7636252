//! Score forecast hours for a surfer.
//!
//! The [`Scorer`] trait is the seam between the recommendation pipeline and
//! whatever scoring formula is plugged in.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::{ForecastRecord, PreferenceSet, Spot, UserProfile};

/// Overall score plus its named components.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoreBreakdown {
    /// Aggregate score; higher is better.
    pub overall_score: f64,
    /// Component scores keyed by name.
    pub detailed_scores: BTreeMap<String, f64>,
}

impl ScoreBreakdown {
    /// Breakdown with no components.
    #[must_use]
    pub const fn overall(overall_score: f64) -> Self {
        Self {
            overall_score,
            detailed_scores: BTreeMap::new(),
        }
    }

    /// Add a component while returning `self` for chaining.
    #[must_use]
    pub fn with_component(mut self, name: impl Into<String>, score: f64) -> Self {
        self.detailed_scores.insert(name.into(), score);
        self
    }
}

/// Error raised when one forecast hour cannot be scored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    /// A value the formula depends on is missing.
    #[error("forecast is missing {field}")]
    MissingInput {
        /// Name of the missing forecast field.
        field: &'static str,
    },
    /// The scorer produced a non-finite score.
    #[error("scorer produced a non-finite score")]
    NonFinite,
    /// Any other scorer failure.
    #[error("scoring failed: {message}")]
    Failed {
        /// Description of the failure.
        message: String,
    },
}

/// Calculate a score for one forecast hour.
///
/// Implementations must be thread-safe (`Send` + `Sync`) so scoring can run
/// across blocking worker threads. A failure affects only the hour being
/// scored.
///
/// # Examples
///
/// ```rust
/// use swellcheck_core::{
///     ForecastRecord, PreferenceSet, ScoreBreakdown, Scorer, ScoringError, Spot, UserProfile,
/// };
///
/// struct FlatScorer;
///
/// impl Scorer for FlatScorer {
///     fn score(
///         &self,
///         _forecast: &ForecastRecord,
///         _preferences: &PreferenceSet,
///         _spot: &Spot,
///         _profile: &UserProfile,
///     ) -> Result<ScoreBreakdown, ScoringError> {
///         Ok(ScoreBreakdown::overall(50.0))
///     }
/// }
/// ```
pub trait Scorer: Send + Sync {
    /// Score `forecast` for `profile` at `spot` under `preferences`.
    ///
    /// # Errors
    /// Returns [`ScoringError`] when the hour cannot be scored.
    fn score(
        &self,
        forecast: &ForecastRecord,
        preferences: &PreferenceSet,
        spot: &Spot,
        profile: &UserProfile,
    ) -> Result<ScoreBreakdown, ScoringError>;
}
