//! Fixtures shared by the cycle unit and behaviour tests.

use super::*;
use chrono::{DateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use swellcheck_core::test_support::MemoryStore;
use swellcheck_core::{
    DaySelection, ForecastConditions, ForecastRecord, Spot, SpotId, SurfLevel, UserPresetConfig,
    UserProfile,
};
use swellcheck_data::RefreshSettings;
use swellcheck_data::test_support::{StubMarineSource, sea_level_payload, weather_payload};
use swellcheck_scorer::AggregationSettings;

pub(super) const SPOT_ID: SpotId = 1;
pub(super) const USER_ID: &str = "surfer";
pub(super) const PRESET_NAME: &str = "dawn patrol";

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 4, 0, 0)
        .single()
        .expect("valid instant")
}

/// Provider hours returned by the stub source.
pub(super) fn provider_hours() -> Vec<DateTime<Utc>> {
    let midnight = now() - TimeDelta::hours(4);
    [6, 7]
        .into_iter()
        .map(|hour| midnight + TimeDelta::hours(hour))
        .collect()
}

/// A forecast hour well past the default retention window.
pub(super) fn stale_hour() -> DateTime<Utc> {
    now() - TimeDelta::days(10)
}

/// Store with one spot, one stale forecast, and one user whose preset
/// covers today.
pub(super) fn seeded_store() -> MemoryStore {
    MemoryStore::default()
        .with_spot(Spot::new(SPOT_ID, "Point Break", -8.4, 115.1))
        .with_forecasts(
            SPOT_ID,
            [ForecastRecord::new(
                stale_hour(),
                ForecastConditions::default(),
            )],
        )
        .with_profile(UserProfile::new(USER_ID, SurfLevel::Intermediate))
        .with_preset(UserPresetConfig {
            preset_id: 1,
            user_id: USER_ID.to_owned(),
            name: PRESET_NAME.to_owned(),
            spot_ids: vec![SPOT_ID],
            start_time: NaiveTime::MIN,
            end_time: NaiveTime::from_hms_opt(23, 0, 0).expect("valid time"),
            day_selection: DaySelection::Offsets(vec![0]),
        })
}

pub(super) fn stub_source() -> StubMarineSource {
    let hours = provider_hours();
    let levels: Vec<(DateTime<Utc>, f64)> = hours.iter().map(|hour| (*hour, 0.5)).collect();
    StubMarineSource::with_payloads(weather_payload(&hours, 1.5), sea_level_payload(&levels))
}

pub(super) fn settings(api_keys: &[&str]) -> CycleSettings {
    CycleSettings {
        refresh: RefreshSettings::new(api_keys.iter().copied()),
        aggregation: AggregationSettings::default(),
        retention: TimeDelta::days(7),
    }
}

pub(super) fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("build runtime")
        .block_on(future)
}
