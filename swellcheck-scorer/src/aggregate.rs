//! Rank the best surf session per spot and date for one configuration.
//!
//! Forecast hours inside the configured days and time-of-day window are
//! scored, hours at or below the qualifying threshold are discarded, and the
//! best remaining hour per spot and date becomes that spot's session. Dates
//! are returned in ascending order with spots ranked best first.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use log::{debug, info, warn};
use swellcheck_core::cache::save_recommendations;
use swellcheck_core::{
    DailyRecommendation, ForecastRecord, ForecastStore, PresetError, RankedSpot, Scorer, Spot,
    SpotId, SurfStore, TimeWindow, UserProfile, UserSpotPreference, UserStore,
    resolve_preferences,
};

use crate::RecommendationError;

/// Scores at or below this value are not worth surfing.
pub const QUALIFYING_SCORE_THRESHOLD: f64 = 30.0;

/// Tunables for ranking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregationSettings {
    threshold: f64,
}

impl AggregationSettings {
    /// Settings using [`QUALIFYING_SCORE_THRESHOLD`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            threshold: QUALIFYING_SCORE_THRESHOLD,
        }
    }

    /// Replace the qualifying threshold.
    #[must_use]
    pub const fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Scores must be strictly greater than this to qualify.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// True when `score` is strictly above the threshold. `NaN` never
    /// qualifies.
    #[must_use]
    pub const fn qualifies(&self, score: f64) -> bool {
        score > self.threshold
    }
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// One named set of spots, days and hours to rank for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationConfig {
    /// Key the result is cached under.
    pub cache_key: String,
    /// Spots to consider.
    pub spot_ids: Vec<SpotId>,
    /// Day offsets from today, `0` being today.
    pub day_offsets: Vec<u32>,
    /// Hours of the day to consider.
    pub window: TimeWindow,
}

impl RecommendationConfig {
    /// Construct a configuration.
    ///
    /// Repeated spot ids are dropped, keeping the first occurrence.
    pub fn new(
        cache_key: impl Into<String>,
        spot_ids: Vec<SpotId>,
        day_offsets: Vec<u32>,
        window: TimeWindow,
    ) -> Self {
        let mut seen = BTreeSet::new();
        Self {
            cache_key: cache_key.into(),
            spot_ids: spot_ids
                .into_iter()
                .filter(|spot_id| seen.insert(*spot_id))
                .collect(),
            day_offsets,
            window,
        }
    }

    /// Check the configuration can drive a run.
    ///
    /// # Errors
    /// Returns [`PresetError::NoSpots`] or [`PresetError::NoDays`] when the
    /// corresponding list is empty.
    pub const fn validate(&self) -> Result<(), PresetError> {
        if self.spot_ids.is_empty() {
            return Err(PresetError::NoSpots);
        }
        if self.day_offsets.is_empty() {
            return Err(PresetError::NoDays);
        }
        Ok(())
    }

    fn last_offset(&self) -> u32 {
        self.day_offsets.iter().copied().max().unwrap_or_default()
    }
}

/// What happened to the cache entry for a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// A new payload replaced the entry.
    Saved {
        /// Dates in the stored payload.
        dates: usize,
    },
    /// Nothing qualified; any existing entry was left untouched.
    Empty,
}

/// Computes ranked recommendations from stored forecasts.
///
/// The aggregator borrows its store and scorer, so one instance can serve
/// many configurations within a cycle.
#[derive(Debug)]
pub struct Aggregator<'a, S: ?Sized, C: ?Sized> {
    store: &'a S,
    scorer: &'a C,
    now: DateTime<Utc>,
    settings: AggregationSettings,
}

impl<'a, S, C> Aggregator<'a, S, C>
where
    S: ForecastStore + UserStore + ?Sized,
    C: Scorer + ?Sized,
{
    /// Aggregator anchored at `now`; day offsets count from its UTC date.
    #[must_use]
    pub const fn new(store: &'a S, scorer: &'a C, now: DateTime<Utc>) -> Self {
        Self {
            store,
            scorer,
            now,
            settings: AggregationSettings::new(),
        }
    }

    /// Replace the ranking settings.
    #[must_use]
    pub const fn with_settings(mut self, settings: AggregationSettings) -> Self {
        self.settings = settings;
        self
    }

    fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    /// Rank sessions for `profile` under `config`.
    ///
    /// Spots whose details or forecasts are missing or unreadable are
    /// skipped, as are hours the scorer rejects. Only dates with at least one
    /// qualifying spot appear in the result.
    ///
    /// # Errors
    /// Returns [`RecommendationError::InvalidConfig`] when `config` selects
    /// no spots or no days, or a day past the representable calendar.
    pub fn compute(
        &self,
        profile: &UserProfile,
        preferences: &[UserSpotPreference],
        config: &RecommendationConfig,
    ) -> Result<Vec<DailyRecommendation>, RecommendationError> {
        let invalid = |source| RecommendationError::InvalidConfig {
            user_id: profile.user_id.clone(),
            cache_key: config.cache_key.clone(),
            source,
        };
        config.validate().map_err(invalid)?;

        let start = self.today().and_time(NaiveTime::MIN).and_utc();
        let last_offset = config.last_offset();
        let end = TimeDelta::try_days(i64::from(last_offset) + 1)
            .and_then(|span| start.checked_add_signed(span))
            .ok_or_else(|| {
                invalid(PresetError::OffsetOutOfRange {
                    offset: last_offset,
                })
            })?;

        let mut by_date: BTreeMap<NaiveDate, Vec<RankedSpot>> = BTreeMap::new();
        for spot_id in &config.spot_ids {
            let Some((spot, forecasts)) = self.load_spot(*spot_id, start, end) else {
                continue;
            };
            let sessions = self.best_sessions(profile, preferences, config, &spot, &forecasts);
            for (date, session) in sessions {
                by_date.entry(date).or_default().push(session);
            }
        }

        Ok(by_date
            .into_iter()
            .map(|(date, mut ranked_spots)| {
                ranked_spots
                    .sort_by(|a, b| b.best_overall_score.total_cmp(&a.best_overall_score));
                DailyRecommendation { date, ranked_spots }
            })
            .collect())
    }

    fn load_spot(
        &self,
        spot_id: SpotId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Option<(Spot, Vec<ForecastRecord>)> {
        let spot = match self.store.read_spot(spot_id) {
            Ok(Some(spot)) => spot,
            Ok(None) => {
                debug!("spot {spot_id} not found; skipping");
                return None;
            }
            Err(err) => {
                warn!("spot {spot_id}: failed to read details: {err}");
                return None;
            }
        };
        let forecasts = match self.store.read_forecasts(spot_id, start, end) {
            Ok(forecasts) => forecasts,
            Err(err) => {
                warn!("spot {spot_id}: failed to read forecasts: {err}");
                return None;
            }
        };
        if forecasts.is_empty() {
            debug!("spot {spot_id} has no forecasts in range; skipping");
            return None;
        }
        Some((spot, forecasts))
    }

    fn best_sessions(
        &self,
        profile: &UserProfile,
        preferences: &[UserSpotPreference],
        config: &RecommendationConfig,
        spot: &Spot,
        forecasts: &[ForecastRecord],
    ) -> BTreeMap<NaiveDate, RankedSpot> {
        let spot_level = self
            .store
            .read_spot_level_preferences(spot.id, profile.surf_level)
            .unwrap_or_else(|err| {
                warn!("spot {}: failed to read level preferences: {err}", spot.id);
                None
            });
        let effective = resolve_preferences(profile, spot.id, spot_level.as_ref(), preferences);

        let mut best: BTreeMap<NaiveDate, RankedSpot> = BTreeMap::new();
        for record in forecasts {
            let date = record.timestamp_utc.date_naive();
            if !self.selects(config, date, record.timestamp_utc.time()) {
                continue;
            }
            let breakdown = match self.scorer.score(record, &effective, spot, profile) {
                Ok(breakdown) => breakdown,
                Err(err) => {
                    warn!(
                        "spot {}: skipping hour {}: {err}",
                        spot.id, record.timestamp_utc
                    );
                    continue;
                }
            };
            if !self.settings.qualifies(breakdown.overall_score) {
                continue;
            }
            let improves = best
                .get(&date)
                .is_none_or(|current| breakdown.overall_score > current.best_overall_score);
            if improves {
                best.insert(
                    date,
                    RankedSpot {
                        spot_id: spot.id,
                        spot_name: spot.name.clone(),
                        best_hour_utc: record.timestamp_utc,
                        best_overall_score: breakdown.overall_score,
                        detailed_scores: breakdown.detailed_scores,
                        forecast_conditions: *record,
                    },
                );
            }
        }
        best
    }

    fn selects(&self, config: &RecommendationConfig, date: NaiveDate, time: NaiveTime) -> bool {
        let offset = (date - self.today()).num_days();
        u32::try_from(offset).is_ok_and(|offset| config.day_offsets.contains(&offset))
            && config.window.contains(time)
    }
}

impl<S, C> Aggregator<'_, S, C>
where
    S: SurfStore + ?Sized,
    C: Scorer + ?Sized,
{
    /// Rank sessions and replace the cached entry when anything qualifies.
    ///
    /// An empty ranking leaves the existing entry untouched.
    ///
    /// # Errors
    /// Returns [`RecommendationError::InvalidConfig`] for an unusable
    /// configuration and [`RecommendationError::Store`] when the cache write
    /// fails.
    pub fn compute_and_cache(
        &self,
        profile: &UserProfile,
        preferences: &[UserSpotPreference],
        config: &RecommendationConfig,
    ) -> Result<CacheOutcome, RecommendationError> {
        let recommendations = self.compute(profile, preferences, config)?;
        if recommendations.is_empty() {
            info!(
                "no qualifying sessions for user {} ({}); keeping cached entry",
                profile.user_id, config.cache_key
            );
            return Ok(CacheOutcome::Empty);
        }
        save_recommendations(
            self.store,
            &profile.user_id,
            &config.cache_key,
            &recommendations,
            self.now,
        )
        .map_err(|source| RecommendationError::Store {
            operation: "save recommendations",
            user_id: profile.user_id.clone(),
            source,
        })?;
        info!(
            "cached {} days of recommendations for user {} ({})",
            recommendations.len(),
            profile.user_id,
            config.cache_key
        );
        Ok(CacheOutcome::Saved {
            dates: recommendations.len(),
        })
    }
}
