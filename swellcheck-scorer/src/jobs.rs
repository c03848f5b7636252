//! Recompute cached recommendations for every user with an active preset.
//!
//! Each user gets three configurations: `today`, `tomorrow`, and the preset
//! itself under its own name. Users run concurrently, as do the
//! configurations of one user. Store access happens on blocking worker
//! threads so slow reads never stall the runtime.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use futures_util::future::join_all;
use log::{info, warn};
use swellcheck_core::{PresetError, Scorer, SurfStore, UserPresetConfig, UserSpotPreference};

use crate::RecommendationError;
use crate::aggregate::{AggregationSettings, Aggregator, CacheOutcome, RecommendationConfig};

/// Cache key for today's recommendations.
pub const TODAY_KEY: &str = "today";
/// Cache key for tomorrow's recommendations.
pub const TOMORROW_KEY: &str = "tomorrow";

/// Configurations computed for the owner of `preset`.
///
/// `today` covers offset `0` and `tomorrow` offset `1`; the preset's own
/// entry uses its derived day offsets. All three share the preset's spots
/// and time window. A preset named like a built-in key replaces that entry.
///
/// # Errors
/// Returns [`PresetError::InvertedWindow`] when the preset's window starts
/// after it ends.
///
/// # Examples
/// ```
/// use chrono::{NaiveDate, NaiveTime};
/// use swellcheck_core::{DaySelection, UserPresetConfig};
/// use swellcheck_scorer::configurations_for;
///
/// let preset = UserPresetConfig {
///     preset_id: 1,
///     user_id: "u-1".to_owned(),
///     name: "weekend".to_owned(),
///     spot_ids: vec![3],
///     start_time: NaiveTime::from_hms_opt(6, 0, 0).expect("valid time"),
///     end_time: NaiveTime::from_hms_opt(18, 0, 0).expect("valid time"),
///     day_selection: DaySelection::Weekdays(vec![0, 6]),
/// };
/// // 2024-05-01 is a Wednesday.
/// let today = NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date");
/// let configs = configurations_for(&preset, today).expect("valid preset");
/// let keys: Vec<_> = configs.iter().map(|config| config.cache_key.as_str()).collect();
/// assert_eq!(keys, ["today", "tomorrow", "weekend"]);
/// assert_eq!(configs.last().map(|config| config.day_offsets.clone()), Some(vec![3, 4]));
/// ```
pub fn configurations_for(
    preset: &UserPresetConfig,
    today: NaiveDate,
) -> Result<Vec<RecommendationConfig>, PresetError> {
    let window = preset.time_window()?;
    let entry = |key: &str, day_offsets: Vec<u32>| {
        RecommendationConfig::new(key, preset.spot_ids.clone(), day_offsets, window)
    };

    let mut configs = vec![entry(TODAY_KEY, vec![0]), entry(TOMORROW_KEY, vec![1])];
    configs.retain(|config| config.cache_key != preset.name);
    configs.push(entry(&preset.name, preset.day_selection.day_offsets(today)));
    Ok(configs)
}

/// A configuration that completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationOutcome {
    /// Owner of the configuration.
    pub user_id: String,
    /// Cache key of the configuration.
    pub cache_key: String,
    /// What happened to the cache entry.
    pub outcome: CacheOutcome,
}

/// Outcome of a recommendation run.
#[derive(Debug, Default)]
pub struct RecommendationReport {
    /// Configurations that completed.
    pub completed: Vec<RecommendationOutcome>,
    /// Users skipped because they have no profile.
    pub skipped_users: Vec<String>,
    /// Per-user or per-configuration failures.
    pub failures: Vec<RecommendationError>,
}

impl RecommendationReport {
    /// Cache keys written for `user_id`, sorted.
    #[must_use]
    pub fn saved_keys(&self, user_id: &str) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .completed
            .iter()
            .filter(|done| done.user_id == user_id)
            .filter(|done| matches!(done.outcome, CacheOutcome::Saved { .. }))
            .map(|done| done.cache_key.as_str())
            .collect();
        keys.sort_unstable();
        keys
    }
}

enum UserRun {
    Skipped(String),
    Ran(Vec<Result<RecommendationOutcome, RecommendationError>>),
}

/// Recompute and cache recommendations for every user with an active
/// preset.
///
/// Failures are contained to the user or configuration they affect and are
/// collected in the report.
///
/// # Errors
/// Returns [`RecommendationError::ListPresets`] when the presets cannot be
/// read.
pub async fn recompute_all_recommendations<S, C>(
    store: Arc<S>,
    scorer: Arc<C>,
    now: DateTime<Utc>,
    settings: AggregationSettings,
) -> Result<RecommendationReport, RecommendationError>
where
    S: SurfStore + 'static,
    C: Scorer + ?Sized + 'static,
{
    let listing = Arc::clone(&store);
    let presets = tokio::task::spawn_blocking(move || listing.list_active_user_presets())
        .await
        .map_err(|err| RecommendationError::ListPresets {
            source: swellcheck_core::StoreError::backend("list active presets", err),
        })?
        .map_err(|source| RecommendationError::ListPresets { source })?;
    if presets.is_empty() {
        info!("no users with active presets");
        return Ok(RecommendationReport::default());
    }
    info!("computing recommendations for {} users", presets.len());

    let runs = presets.into_iter().map(|preset| {
        process_user(
            Arc::clone(&store),
            Arc::clone(&scorer),
            preset,
            now,
            settings,
        )
    });

    let mut report = RecommendationReport::default();
    for run in join_all(runs).await {
        match run {
            Ok(UserRun::Skipped(user_id)) => report.skipped_users.push(user_id),
            Ok(UserRun::Ran(results)) => {
                for result in results {
                    match result {
                        Ok(done) => report.completed.push(done),
                        Err(err) => {
                            warn!("{err}");
                            report.failures.push(err);
                        }
                    }
                }
            }
            Err(err) => {
                warn!("{err}");
                report.failures.push(err);
            }
        }
    }
    info!(
        "recommendation run finished: {} configurations, {} users skipped, {} failures",
        report.completed.len(),
        report.skipped_users.len(),
        report.failures.len()
    );
    Ok(report)
}

async fn process_user<S, C>(
    store: Arc<S>,
    scorer: Arc<C>,
    preset: UserPresetConfig,
    now: DateTime<Utc>,
    settings: AggregationSettings,
) -> Result<UserRun, RecommendationError>
where
    S: SurfStore + 'static,
    C: Scorer + ?Sized + 'static,
{
    let user_id = preset.user_id.clone();
    let reader = Arc::clone(&store);
    let lookup = user_id.clone();
    let (profile, preferences) = run_blocking(&user_id, move || {
        reader.read_user_profile_and_preferences(&lookup)
    })
    .await?
    .map_err(|source| RecommendationError::Store {
        operation: "read user profile",
        user_id: user_id.clone(),
        source,
    })?;
    let Some(found) = profile else {
        info!("user {user_id} has no profile; skipping");
        return Ok(UserRun::Skipped(user_id));
    };

    let configs = configurations_for(&preset, now.date_naive()).map_err(|source| {
        RecommendationError::InvalidConfig {
            user_id: user_id.clone(),
            cache_key: preset.name.clone(),
            source,
        }
    })?;

    let shared_profile = Arc::new(found);
    let shared_preferences: Arc<[UserSpotPreference]> = preferences.into();
    let tasks = configs.into_iter().map(|config| {
        let task_store = Arc::clone(&store);
        let task_scorer = Arc::clone(&scorer);
        let task_profile = Arc::clone(&shared_profile);
        let task_preferences = Arc::clone(&shared_preferences);
        let owner = user_id.clone();
        async move {
            let cache_key = config.cache_key.clone();
            let outcome = run_blocking(&owner, move || {
                Aggregator::new(&*task_store, &*task_scorer, now)
                    .with_settings(settings)
                    .compute_and_cache(&task_profile, &task_preferences, &config)
            })
            .await??;
            Ok::<_, RecommendationError>(RecommendationOutcome {
                user_id: owner,
                cache_key,
                outcome,
            })
        }
    });
    Ok(UserRun::Ran(join_all(tasks).await))
}

async fn run_blocking<T, F>(user_id: &str, work: F) -> Result<T, RecommendationError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| RecommendationError::Task {
            user_id: user_id.to_owned(),
            message: err.to_string(),
        })
}
