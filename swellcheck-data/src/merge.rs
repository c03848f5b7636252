//! Join provider weather and sea-level payloads into hourly forecast records.
//!
//! The weather payload carries an `hours` list whose entries map each
//! quantity to per-source values (`{"waveHeight": {"sg": 1.2}, ...}`). The
//! sea-level payload carries a `data` list of `{time, sg}` entries. Entries
//! are joined on their exact `time` text.

use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::{DateTime, FixedOffset, Utc};
use serde_json::Value;
use swellcheck_core::{
    ForecastConditions, ForecastRecord, SeaLevelSample, TidePoint, classify_tide_phases,
};
use thiserror::Error;

/// Source whose values are read from each quantity.
pub const VALUE_SOURCE: &str = "sg";

/// Weather quantities requested from the provider, in request order.
pub const WEATHER_PARAMETERS: [&str; 15] = [
    "waveHeight",
    "waveDirection",
    "wavePeriod",
    "swellHeight",
    "swellDirection",
    "swellPeriod",
    "secondarySwellHeight",
    "secondarySwellDirection",
    "secondarySwellPeriod",
    "windSpeed",
    "windDirection",
    "waterTemperature",
    "airTemperature",
    "currentSpeed",
    "currentDirection",
];

/// Errors raised when a payload does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// A required top-level list is absent.
    #[error("{payload} payload is missing the `{field}` list")]
    MissingField {
        /// Which payload was inspected.
        payload: &'static str,
        /// Name of the missing field.
        field: &'static str,
    },
    /// A required top-level field is not a list.
    #[error("`{field}` in the {payload} payload is not a list")]
    NotAList {
        /// Which payload was inspected.
        payload: &'static str,
        /// Name of the malformed field.
        field: &'static str,
    },
    /// An entry carried a `time` that is not RFC 3339.
    #[error("invalid timestamp {value:?}")]
    InvalidTimestamp {
        /// Offending text.
        value: String,
    },
}

fn entries<'a>(
    payload: &'a Value,
    name: &'static str,
    field: &'static str,
) -> Result<&'a [Value], MergeError> {
    let list = payload.get(field).ok_or(MergeError::MissingField {
        payload: name,
        field,
    })?;
    list.as_array()
        .map(Vec::as_slice)
        .ok_or(MergeError::NotAList {
            payload: name,
            field,
        })
}

fn parse_time(text: &str) -> Result<DateTime<FixedOffset>, MergeError> {
    DateTime::parse_from_rfc3339(text).map_err(|_| MergeError::InvalidTimestamp {
        value: text.to_owned(),
    })
}

fn source_value(entry: &Value, parameter: &str) -> Option<f64> {
    entry.get(parameter)?.get(VALUE_SOURCE)?.as_f64()
}

type SampleKey = (DateTime<FixedOffset>, i32, Option<u64>);

/// Exact identity of a sample: instant, reported offset and level.
fn sample_key(time: DateTime<FixedOffset>, level: Option<f64>) -> SampleKey {
    (time, time.offset().local_minus_utc(), level.map(f64::to_bits))
}

/// Label sea-level entries with tide phases, keyed by their `time` text.
///
/// Each entry receives the point classified from its own sample, even when
/// several entries name the same instant.
fn tide_by_time(sea_level: &[Value]) -> Result<HashMap<&str, TidePoint>, MergeError> {
    let mut keyed = Vec::with_capacity(sea_level.len());
    let mut samples = Vec::with_capacity(sea_level.len());
    for entry in sea_level {
        let Some(text) = entry.get("time").and_then(Value::as_str) else {
            continue;
        };
        let time = parse_time(text)?;
        let level = entry.get(VALUE_SOURCE).and_then(Value::as_f64);
        keyed.push((text, sample_key(time, level)));
        samples.push(SeaLevelSample::new(time, level));
    }

    let mut by_sample: BTreeMap<SampleKey, VecDeque<TidePoint>> = BTreeMap::new();
    for point in classify_tide_phases(&samples) {
        by_sample
            .entry(sample_key(point.time, point.level))
            .or_default()
            .push_back(point);
    }
    Ok(keyed
        .into_iter()
        .filter_map(|(text, key)| {
            let point = by_sample.get_mut(&key)?.pop_front()?;
            Some((text, point))
        })
        .collect())
}

/// Merge a weather payload and a sea-level payload into forecast records.
///
/// One record is produced per distinct weather `time`, sorted by that text.
/// Quantities absent from an entry become `None`. Hours without a matching
/// sea-level entry keep the weather data with `sea_level` and `tide_type`
/// unset.
///
/// # Errors
/// Returns [`MergeError`] when either payload lacks its list or carries an
/// unparseable timestamp; no partial result is produced.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use swellcheck_data::merge_forecast_payloads;
///
/// let weather = json!({"hours": [
///     {"time": "2024-05-01T06:00:00+00:00", "swellHeight": {"sg": 1.4}},
/// ]});
/// let sea_level = json!({"data": []});
/// let records = merge_forecast_payloads(&weather, &sea_level).expect("valid payloads");
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].conditions.swell_height, Some(1.4));
/// assert_eq!(records[0].conditions.tide_type, None);
/// ```
pub fn merge_forecast_payloads(
    weather: &Value,
    sea_level: &Value,
) -> Result<Vec<ForecastRecord>, MergeError> {
    let hours = entries(weather, "weather", "hours")?;
    let levels = entries(sea_level, "sea level", "data")?;
    let tides = tide_by_time(levels)?;

    let weather_by_time: BTreeMap<&str, &Value> = hours
        .iter()
        .filter_map(|entry| Some((entry.get("time")?.as_str()?, entry)))
        .collect();

    weather_by_time
        .into_iter()
        .map(|(text, entry)| {
            let timestamp = parse_time(text)?.with_timezone(&Utc);
            let tide = tides.get(text);
            Ok(ForecastRecord::new(
                timestamp,
                conditions_from(entry, tide),
            ))
        })
        .collect()
}

fn conditions_from(entry: &Value, tide: Option<&TidePoint>) -> ForecastConditions {
    let value = |parameter| source_value(entry, parameter);
    ForecastConditions {
        wave_height: value("waveHeight"),
        wave_direction: value("waveDirection"),
        wave_period: value("wavePeriod"),
        swell_height: value("swellHeight"),
        swell_direction: value("swellDirection"),
        swell_period: value("swellPeriod"),
        secondary_swell_height: value("secondarySwellHeight"),
        secondary_swell_direction: value("secondarySwellDirection"),
        secondary_swell_period: value("secondarySwellPeriod"),
        wind_speed: value("windSpeed"),
        wind_direction: value("windDirection"),
        water_temperature: value("waterTemperature"),
        air_temperature: value("airTemperature"),
        current_speed: value("currentSpeed"),
        current_direction: value("currentDirection"),
        sea_level: tide.and_then(|point| point.level),
        tide_type: tide.map(|point| point.tide_type),
    }
}
