//! Reference scorer comparing forecast conditions with preferences.
//!
//! Each component measures how close one forecast quantity is to the
//! preferred value and yields a value in `0.0..=1.0`. Components whose
//! inputs are missing are left out, and the overall score is the weighted
//! mean of the remaining components scaled to `0.0..=100.0`.

use serde::{Deserialize, Serialize};
use swellcheck_core::{
    CardinalDirection, ForecastRecord, PreferenceSet, ScoreBreakdown, Scorer, ScoringError, Spot,
    TideType, UserProfile, angular_distance,
};
use thiserror::Error;

/// Swell height difference, relative to the ideal, that scores zero.
const SWELL_TOLERANCE_RATIO: f64 = 1.0;
/// Smallest ideal swell height used as a divisor.
const MIN_IDEAL_SWELL: f64 = 0.3;
/// Temperature difference in degrees Celsius that scores zero.
const TEMPERATURE_TOLERANCE: f64 = 10.0;
/// Sea level difference in metres that scores zero.
const SEA_LEVEL_TOLERANCE: f64 = 2.0;
/// Half a turn in degrees; the largest possible angular distance.
const HALF_TURN: f64 = 180.0;
const MAX_SCORE: f64 = 100.0;

/// Errors raised when configuring the condition scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConditionScorerError {
    /// Provided weights were unusable.
    #[error("weights must be finite, non-negative and sum to a positive value")]
    InvalidWeights,
}

/// Relative importance of each scoring component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConditionWeights {
    /// Closeness of swell height to the ideal.
    pub swell_height: f64,
    /// Wind speed against the acceptable maximum.
    pub wind_speed: f64,
    /// Swell direction against the spot's best direction.
    pub swell_direction: f64,
    /// Wind direction against the spot's best direction.
    pub wind_direction: f64,
    /// Tide phase against the preferred flow.
    pub tide: f64,
    /// Sea level against the preferred level.
    pub sea_level: f64,
    /// Water and air temperature against the ideals.
    pub temperature: f64,
}

impl ConditionWeights {
    const fn values(self) -> [f64; 7] {
        [
            self.swell_height,
            self.wind_speed,
            self.swell_direction,
            self.wind_direction,
            self.tide,
            self.sea_level,
            self.temperature,
        ]
    }

    /// Validate the weights and return a copy.
    ///
    /// # Errors
    /// Returns [`ConditionScorerError::InvalidWeights`] when any weight is
    /// negative or not finite, or when the weights sum to zero.
    pub fn validate(self) -> Result<Self, ConditionScorerError> {
        let values = self.values();
        let usable = values
            .iter()
            .all(|weight| weight.is_finite() && *weight >= 0.0);
        let total: f64 = values.iter().sum();
        if usable && total > 0.0 {
            Ok(self)
        } else {
            Err(ConditionScorerError::InvalidWeights)
        }
    }
}

impl Default for ConditionWeights {
    fn default() -> Self {
        Self {
            swell_height: 0.3,
            wind_speed: 0.25,
            swell_direction: 0.1,
            wind_direction: 0.1,
            tide: 0.1,
            sea_level: 0.05,
            temperature: 0.1,
        }
    }
}

/// Weighted closeness scorer over swell, wind, tide and temperature.
///
/// Direction preferences missing from the resolved set fall back to the
/// spot's recorded ideal conditions. Swell height is required; every other
/// component is optional.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use swellcheck_core::{
///     ForecastConditions, ForecastRecord, PreferenceSet, Scorer, Spot, SurfLevel, UserProfile,
/// };
/// use swellcheck_scorer::ConditionScorer;
///
/// let hour = Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).single().expect("valid instant");
/// let record = ForecastRecord::new(
///     hour,
///     ForecastConditions { swell_height: Some(1.2), wind_speed: Some(2.0), ..Default::default() },
/// );
/// let preferences = SurfLevel::Intermediate.defaults();
/// let spot = Spot::new(1, "Point", 0.0, 0.0);
/// let profile = UserProfile::new("u-1", SurfLevel::Intermediate);
///
/// let breakdown = ConditionScorer::default()
///     .score(&record, &preferences, &spot, &profile)
///     .expect("swell height present");
/// assert!(breakdown.overall_score > 80.0);
/// assert!(breakdown.detailed_scores.contains_key("swell_height"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConditionScorer {
    weights: ConditionWeights,
}

impl ConditionScorer {
    /// Scorer using validated `weights`.
    ///
    /// # Errors
    /// Returns [`ConditionScorerError::InvalidWeights`] when the weights are
    /// unusable.
    pub fn new(weights: ConditionWeights) -> Result<Self, ConditionScorerError> {
        Ok(Self {
            weights: weights.validate()?,
        })
    }

    /// Active weights.
    #[must_use]
    pub const fn weights(&self) -> ConditionWeights {
        self.weights
    }

    fn components(
        &self,
        forecast: &ForecastRecord,
        preferences: &PreferenceSet,
    ) -> Result<Vec<(&'static str, f64, f64)>, ScoringError> {
        let conditions = &forecast.conditions;
        let weights = self.weights;
        let swell = swell_height_score(
            conditions.swell_height,
            preferences.ideal_swell_height,
            preferences.max_swell_height,
        )
        .ok_or(ScoringError::MissingInput {
            field: "swell_height",
        })?;

        let optional = [
            (
                "wind_speed",
                weights.wind_speed,
                wind_speed_score(conditions.wind_speed, preferences.max_wind_speed),
            ),
            (
                "swell_direction",
                weights.swell_direction,
                direction_score(conditions.swell_direction, preferences.ideal_swell_direction),
            ),
            (
                "wind_direction",
                weights.wind_direction,
                direction_score(conditions.wind_direction, preferences.ideal_wind_direction),
            ),
            (
                "tide",
                weights.tide,
                tide_score(conditions.tide_type, preferences.ideal_tide_flow),
            ),
            (
                "sea_level",
                weights.sea_level,
                closeness(
                    conditions.sea_level,
                    preferences.ideal_sea_level,
                    SEA_LEVEL_TOLERANCE,
                ),
            ),
            (
                "temperature",
                weights.temperature,
                temperature_score(
                    (conditions.water_temperature, preferences.ideal_water_temperature),
                    (conditions.air_temperature, preferences.ideal_air_temperature),
                ),
            ),
        ];

        let mut components = vec![("swell_height", weights.swell_height, swell)];
        components.extend(
            optional
                .into_iter()
                .filter_map(|(name, weight, score)| score.map(|value| (name, weight, value))),
        );
        Ok(components)
    }
}

impl Scorer for ConditionScorer {
    #[expect(
        clippy::float_arithmetic,
        reason = "the overall score is a weighted mean of components"
    )]
    fn score(
        &self,
        forecast: &ForecastRecord,
        preferences: &PreferenceSet,
        spot: &Spot,
        _profile: &UserProfile,
    ) -> Result<ScoreBreakdown, ScoringError> {
        let effective = spot.ideal_conditions.overlay(preferences);
        let components = self.components(forecast, &effective)?;

        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        let mut breakdown = ScoreBreakdown::default();
        for (name, weight, value) in components {
            weighted += weight * value;
            total_weight += weight;
            breakdown = breakdown.with_component(name, value * MAX_SCORE);
        }
        if total_weight <= 0.0 {
            return Err(ScoringError::Failed {
                message: "no weighted component could be scored".to_owned(),
            });
        }
        let overall = weighted / total_weight * MAX_SCORE;
        if !overall.is_finite() {
            return Err(ScoringError::NonFinite);
        }
        breakdown.overall_score = overall.clamp(0.0, MAX_SCORE);
        Ok(breakdown)
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "closeness is one minus the scaled difference"
)]
fn closeness(actual: Option<f64>, ideal: Option<f64>, tolerance: f64) -> Option<f64> {
    let difference = (actual? - ideal?).abs();
    Some((1.0 - difference / tolerance).clamp(0.0, 1.0))
}

#[expect(
    clippy::float_arithmetic,
    reason = "tolerance scales with the ideal swell height"
)]
fn swell_height_score(height: Option<f64>, ideal: Option<f64>, max: Option<f64>) -> Option<f64> {
    let metres = height?;
    if max.is_some_and(|limit| metres > limit) {
        return Some(0.0);
    }
    let target = ideal?;
    closeness(
        Some(metres),
        Some(target),
        target.max(MIN_IDEAL_SWELL) * SWELL_TOLERANCE_RATIO,
    )
}

#[expect(
    clippy::float_arithmetic,
    reason = "calm wind scores one and falls linearly to half at the limit"
)]
fn wind_speed_score(speed: Option<f64>, max: Option<f64>) -> Option<f64> {
    let (current, limit) = (speed?, max?);
    if current > limit || limit <= 0.0 {
        return Some(0.0);
    }
    Some(1.0 - 0.5 * (current / limit))
}

#[expect(
    clippy::float_arithmetic,
    reason = "direction closeness scales the angular distance"
)]
fn direction_score(degrees: Option<f64>, ideal: Option<CardinalDirection>) -> Option<f64> {
    let distance = angular_distance(degrees?, ideal?.degrees());
    Some((1.0 - distance / HALF_TURN).clamp(0.0, 1.0))
}

fn tide_score(tide: Option<TideType>, ideal: Option<TideType>) -> Option<f64> {
    let (phase, preferred) = (tide?, ideal?);
    Some(if phase == preferred {
        1.0
    } else if phase == TideType::Unknown {
        0.5
    } else {
        0.0
    })
}

#[expect(
    clippy::float_arithmetic,
    reason = "water and air closeness are averaged"
)]
fn temperature_score(
    water: (Option<f64>, Option<f64>),
    air: (Option<f64>, Option<f64>),
) -> Option<f64> {
    let water_score = closeness(water.0, water.1, TEMPERATURE_TOLERANCE);
    let air_score = closeness(air.0, air.1, TEMPERATURE_TOLERANCE);
    match (water_score, air_score) {
        (Some(water_value), Some(air_value)) => Some((water_value + air_value) / 2.0),
        (single, None) | (None, single) => single,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::{fixture, rstest};
    use swellcheck_core::{ForecastConditions, SurfLevel};

    #[fixture]
    fn spot() -> Spot {
        Spot::new(1, "Point", 0.0, 0.0)
    }

    #[fixture]
    fn profile() -> UserProfile {
        UserProfile::new("surfer", SurfLevel::Intermediate)
    }

    fn record(conditions: ForecastConditions) -> ForecastRecord {
        let hour = Utc
            .with_ymd_and_hms(2024, 5, 1, 7, 0, 0)
            .single()
            .expect("valid instant");
        ForecastRecord::new(hour, conditions)
    }

    fn preferences() -> PreferenceSet {
        PreferenceSet {
            ideal_swell_height: Some(1.5),
            max_swell_height: Some(3.0),
            max_wind_speed: Some(10.0),
            ..PreferenceSet::default()
        }
    }

    #[rstest]
    fn ideal_conditions_score_highly(spot: Spot, profile: UserProfile) {
        let conditions = ForecastConditions {
            swell_height: Some(1.5),
            wind_speed: Some(0.0),
            ..ForecastConditions::default()
        };
        let breakdown = ConditionScorer::default()
            .score(&record(conditions), &preferences(), &spot, &profile)
            .expect("scorable");
        assert_eq!(breakdown.overall_score, 100.0);
        let names: Vec<&str> = breakdown.detailed_scores.keys().map(String::as_str).collect();
        assert_eq!(names, ["swell_height", "wind_speed"]);
    }

    #[rstest]
    fn oversized_swell_scores_zero(spot: Spot, profile: UserProfile) {
        let conditions = ForecastConditions {
            swell_height: Some(4.0),
            ..ForecastConditions::default()
        };
        let breakdown = ConditionScorer::default()
            .score(&record(conditions), &preferences(), &spot, &profile)
            .expect("scorable");
        assert_eq!(breakdown.overall_score, 0.0);
    }

    #[rstest]
    fn missing_swell_height_is_an_error(spot: Spot, profile: UserProfile) {
        let result = ConditionScorer::default().score(
            &record(ForecastConditions::default()),
            &preferences(),
            &spot,
            &profile,
        );
        assert_eq!(
            result,
            Err(ScoringError::MissingInput {
                field: "swell_height"
            })
        );
    }

    #[rstest]
    fn spot_directions_fill_missing_preferences(spot: Spot, profile: UserProfile) {
        let west_facing = spot.with_ideal_conditions(PreferenceSet {
            ideal_swell_direction: Some(CardinalDirection::W),
            ..PreferenceSet::default()
        });
        let onshore = ForecastConditions {
            swell_height: Some(1.5),
            swell_direction: Some(90.0),
            ..ForecastConditions::default()
        };
        let aligned = ForecastConditions {
            swell_direction: Some(270.0),
            ..onshore
        };
        let scorer = ConditionScorer::default();
        let worse = scorer
            .score(&record(onshore), &preferences(), &west_facing, &profile)
            .expect("scorable");
        let better = scorer
            .score(&record(aligned), &preferences(), &west_facing, &profile)
            .expect("scorable");
        assert_eq!(worse.detailed_scores.get("swell_direction"), Some(&0.0));
        assert!(better.overall_score > worse.overall_score);
    }

    #[rstest]
    #[case(TideType::Rising, Some(1.0))]
    #[case(TideType::Unknown, Some(0.5))]
    #[case(TideType::Low, Some(0.0))]
    fn tide_matches_preferred_flow(#[case] tide: TideType, #[case] expected: Option<f64>) {
        assert_eq!(tide_score(Some(tide), Some(TideType::Rising)), expected);
        assert_eq!(tide_score(Some(tide), None), None);
    }

    #[rstest]
    fn temperature_uses_whichever_readings_exist() {
        let water_only = temperature_score((Some(20.0), Some(20.0)), (None, Some(25.0)));
        assert_eq!(water_only, Some(1.0));
        let both = temperature_score((Some(20.0), Some(20.0)), (Some(15.0), Some(25.0)));
        assert_eq!(both, Some(0.5));
        assert_eq!(temperature_score((None, None), (None, None)), None);
    }

    #[rstest]
    #[case(ConditionWeights { swell_height: -1.0, ..ConditionWeights::default() })]
    #[case(ConditionWeights { wind_speed: f64::NAN, ..ConditionWeights::default() })]
    #[case(ConditionWeights {
        swell_height: 0.0,
        wind_speed: 0.0,
        swell_direction: 0.0,
        wind_direction: 0.0,
        tide: 0.0,
        sea_level: 0.0,
        temperature: 0.0,
    })]
    fn unusable_weights_are_rejected(#[case] weights: ConditionWeights) {
        assert_eq!(
            ConditionScorer::new(weights),
            Err(ConditionScorerError::InvalidWeights)
        );
    }
}
