//! Test-only, in-memory store and scorer doubles used by unit and behaviour
//! tests across the workspace.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::store::{CacheStore, CachedPayload, ForecastStore, StoreError, UserStore};
use crate::{
    ForecastRecord, PreferenceSet, ScoreBreakdown, Scorer, ScoringError, Spot, SpotId, SurfLevel,
    UserPresetConfig, UserProfile, UserSpotPreference,
};

#[derive(Debug, Default)]
struct MemoryState {
    spots: BTreeMap<SpotId, Spot>,
    forecasts: BTreeMap<SpotId, BTreeMap<DateTime<Utc>, ForecastRecord>>,
    spot_levels: BTreeMap<(SpotId, SurfLevel), PreferenceSet>,
    profiles: BTreeMap<String, UserProfile>,
    user_preferences: BTreeMap<String, Vec<UserSpotPreference>>,
    presets: Vec<(UserPresetConfig, bool, bool)>,
    cache: BTreeMap<(String, String), CachedPayload>,
    cache_writes: usize,
    failing_forecast_reads: BTreeSet<SpotId>,
    failing_forecast_writes: BTreeSet<SpotId>,
    failing_profile_reads: BTreeSet<String>,
    fail_cache_writes: bool,
    fail_spot_listing: bool,
    fail_preset_listing: bool,
}

/// In-memory implementation of every store contract.
///
/// Failures can be injected per spot or per user to exercise the
/// partial-failure paths of the batch jobs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

fn injected(operation: &'static str) -> StoreError {
    StoreError::backend(operation, "injected failure")
}

impl MemoryStore {
    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&mut self) -> &mut MemoryState {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a spot.
    #[must_use]
    pub fn with_spot(mut self, spot: Spot) -> Self {
        self.state_mut().spots.insert(spot.id, spot);
        self
    }

    /// Add forecasts for `spot_id`.
    #[must_use]
    pub fn with_forecasts<I>(mut self, spot_id: SpotId, records: I) -> Self
    where
        I: IntoIterator<Item = ForecastRecord>,
    {
        let entry = self.state_mut().forecasts.entry(spot_id).or_default();
        for record in records {
            entry.insert(record.timestamp_utc, record);
        }
        self
    }

    /// Add spot-and-level overrides.
    #[must_use]
    pub fn with_spot_level_preferences(
        mut self,
        spot_id: SpotId,
        level: SurfLevel,
        preferences: PreferenceSet,
    ) -> Self {
        self.state_mut()
            .spot_levels
            .insert((spot_id, level), preferences);
        self
    }

    /// Add a user profile.
    #[must_use]
    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.state_mut()
            .profiles
            .insert(profile.user_id.clone(), profile);
        self
    }

    /// Append a user preference record.
    #[must_use]
    pub fn with_user_preference(mut self, user_id: &str, preference: UserSpotPreference) -> Self {
        self.state_mut()
            .user_preferences
            .entry(user_id.to_owned())
            .or_default()
            .push(preference);
        self
    }

    /// Add an active preset.
    #[must_use]
    pub fn with_preset(self, preset: UserPresetConfig) -> Self {
        self.with_preset_flags(preset, false, true)
    }

    /// Add a preset with explicit default and active flags.
    #[must_use]
    pub fn with_preset_flags(
        mut self,
        preset: UserPresetConfig,
        is_default: bool,
        is_active: bool,
    ) -> Self {
        self.state_mut()
            .presets
            .push((preset, is_default, is_active));
        self
    }

    /// Make forecast reads for `spot_id` fail.
    #[must_use]
    pub fn failing_forecast_reads_for(mut self, spot_id: SpotId) -> Self {
        self.state_mut().failing_forecast_reads.insert(spot_id);
        self
    }

    /// Make forecast writes for `spot_id` fail.
    #[must_use]
    pub fn failing_forecast_writes_for(mut self, spot_id: SpotId) -> Self {
        self.state_mut().failing_forecast_writes.insert(spot_id);
        self
    }

    /// Make profile reads for `user_id` fail.
    #[must_use]
    pub fn failing_profile_reads_for(mut self, user_id: &str) -> Self {
        self.state_mut()
            .failing_profile_reads
            .insert(user_id.to_owned());
        self
    }

    /// Make every cache write fail.
    #[must_use]
    pub fn failing_cache_writes(mut self) -> Self {
        self.state_mut().fail_cache_writes = true;
        self
    }

    /// Make listing spots fail.
    #[must_use]
    pub fn failing_spot_listing(mut self) -> Self {
        self.state_mut().fail_spot_listing = true;
        self
    }

    /// Make listing active presets fail.
    #[must_use]
    pub fn failing_preset_listing(mut self) -> Self {
        self.state_mut().fail_preset_listing = true;
        self
    }

    /// Seed a cache entry directly.
    pub fn seed_cache(&self, user_id: &str, cache_key: &str, payload: &str) {
        self.state().cache.insert(
            (user_id.to_owned(), cache_key.to_owned()),
            CachedPayload {
                payload: payload.to_owned(),
                updated_at: DateTime::<Utc>::UNIX_EPOCH,
            },
        );
    }

    /// Stored forecasts for `spot_id` in timestamp order.
    pub fn forecasts_for(&self, spot_id: SpotId) -> Vec<ForecastRecord> {
        self.state()
            .forecasts
            .get(&spot_id)
            .map(|records| records.values().copied().collect())
            .unwrap_or_default()
    }

    /// Cache entry for the key pair, if any.
    pub fn cache_entry(&self, user_id: &str, cache_key: &str) -> Option<CachedPayload> {
        self.state()
            .cache
            .get(&(user_id.to_owned(), cache_key.to_owned()))
            .cloned()
    }

    /// Cache keys stored for `user_id`.
    pub fn cache_keys_for(&self, user_id: &str) -> Vec<String> {
        self.state()
            .cache
            .keys()
            .filter(|(user, _)| user == user_id)
            .map(|(_, key)| key.clone())
            .collect()
    }

    /// Number of stored cache entries.
    pub fn cache_len(&self) -> usize {
        self.state().cache.len()
    }

    /// Number of successful cache writes.
    pub fn cache_writes(&self) -> usize {
        self.state().cache_writes
    }
}

impl ForecastStore for MemoryStore {
    fn upsert_forecasts(
        &self,
        spot_id: SpotId,
        records: &[ForecastRecord],
        _updated_at: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let mut state = self.state();
        if state.failing_forecast_writes.contains(&spot_id) {
            return Err(injected("upsert forecasts"));
        }
        let entry = state.forecasts.entry(spot_id).or_default();
        for record in records {
            entry.insert(record.timestamp_utc, *record);
        }
        Ok(records.len())
    }

    fn read_forecasts(
        &self,
        spot_id: SpotId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ForecastRecord>, StoreError> {
        let state = self.state();
        if state.failing_forecast_reads.contains(&spot_id) {
            return Err(injected("read forecasts"));
        }
        Ok(state
            .forecasts
            .get(&spot_id)
            .map(|records| records.range(from..to).map(|(_, record)| *record).collect())
            .unwrap_or_default())
    }

    fn read_spot(&self, spot_id: SpotId) -> Result<Option<Spot>, StoreError> {
        Ok(self.state().spots.get(&spot_id).cloned())
    }

    fn list_spots(&self) -> Result<Vec<Spot>, StoreError> {
        let state = self.state();
        if state.fail_spot_listing {
            return Err(injected("list spots"));
        }
        Ok(state.spots.values().cloned().collect())
    }

    fn delete_forecasts_older_than(&self, threshold: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut state = self.state();
        let mut removed = 0;
        for records in state.forecasts.values_mut() {
            let before = records.len();
            records.retain(|timestamp, _| *timestamp >= threshold);
            removed += before - records.len();
        }
        Ok(removed)
    }
}

impl UserStore for MemoryStore {
    fn list_active_user_presets(&self) -> Result<Vec<UserPresetConfig>, StoreError> {
        let state = self.state();
        if state.fail_preset_listing {
            return Err(injected("list active presets"));
        }
        let mut chosen: BTreeMap<&str, (bool, i64, &UserPresetConfig)> = BTreeMap::new();
        for (preset, is_default, is_active) in &state.presets {
            if !*is_active {
                continue;
            }
            let rank = (!*is_default, preset.preset_id);
            let better = chosen
                .get(preset.user_id.as_str())
                .is_none_or(|(default, id, _)| rank < (*default, *id));
            if better {
                chosen.insert(preset.user_id.as_str(), (rank.0, rank.1, preset));
            }
        }
        Ok(chosen
            .into_values()
            .map(|(_, _, preset)| preset.clone())
            .collect())
    }

    fn read_user_profile_and_preferences(
        &self,
        user_id: &str,
    ) -> Result<(Option<UserProfile>, Vec<UserSpotPreference>), StoreError> {
        let state = self.state();
        if state.failing_profile_reads.contains(user_id) {
            return Err(injected("read user profile"));
        }
        Ok((
            state.profiles.get(user_id).cloned(),
            state
                .user_preferences
                .get(user_id)
                .cloned()
                .unwrap_or_default(),
        ))
    }

    fn read_spot_level_preferences(
        &self,
        spot_id: SpotId,
        level: SurfLevel,
    ) -> Result<Option<PreferenceSet>, StoreError> {
        Ok(self.state().spot_levels.get(&(spot_id, level)).copied())
    }
}

impl CacheStore for MemoryStore {
    fn upsert_cache(
        &self,
        user_id: &str,
        cache_key: &str,
        payload: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        if state.fail_cache_writes {
            return Err(injected("upsert recommendation cache"));
        }
        state.cache.insert(
            (user_id.to_owned(), cache_key.to_owned()),
            CachedPayload {
                payload: payload.to_owned(),
                updated_at,
            },
        );
        state.cache_writes += 1;
        Ok(())
    }

    fn read_cache(
        &self,
        user_id: &str,
        cache_key: &str,
    ) -> Result<Option<CachedPayload>, StoreError> {
        Ok(self.cache_entry(user_id, cache_key))
    }
}

/// Scorer returning fixed scores per forecast hour.
///
/// Hours without an explicit score receive the default. Hours marked as
/// failing return [`ScoringError::Failed`].
#[derive(Debug, Clone, Default)]
pub struct FixedScorer {
    default: f64,
    by_hour: BTreeMap<DateTime<Utc>, f64>,
    failing: BTreeSet<DateTime<Utc>>,
}

impl FixedScorer {
    /// Scorer returning `default` for every hour.
    #[must_use]
    pub fn new(default: f64) -> Self {
        Self {
            default,
            ..Self::default()
        }
    }

    /// Score `hour` as `score`.
    #[must_use]
    pub fn with_score(mut self, hour: DateTime<Utc>, score: f64) -> Self {
        self.by_hour.insert(hour, score);
        self
    }

    /// Fail when scoring `hour`.
    #[must_use]
    pub fn failing_at(mut self, hour: DateTime<Utc>) -> Self {
        self.failing.insert(hour);
        self
    }
}

impl Scorer for FixedScorer {
    fn score(
        &self,
        forecast: &ForecastRecord,
        _preferences: &PreferenceSet,
        _spot: &Spot,
        _profile: &UserProfile,
    ) -> Result<ScoreBreakdown, ScoringError> {
        let hour = forecast.timestamp_utc;
        if self.failing.contains(&hour) {
            return Err(ScoringError::Failed {
                message: format!("no score for {hour}"),
            });
        }
        let score = self.by_hour.get(&hour).copied().unwrap_or(self.default);
        Ok(ScoreBreakdown::overall(score).with_component("fixed", score))
    }
}

/// Scorer delegating to a closure over the forecast and preferences.
pub struct FnScorer<F>(pub F);

impl<F> Scorer for FnScorer<F>
where
    F: Fn(&ForecastRecord, &PreferenceSet) -> Result<ScoreBreakdown, ScoringError> + Send + Sync,
{
    fn score(
        &self,
        forecast: &ForecastRecord,
        preferences: &PreferenceSet,
        _spot: &Spot,
        _profile: &UserProfile,
    ) -> Result<ScoreBreakdown, ScoringError> {
        (self.0)(forecast, preferences)
    }
}
