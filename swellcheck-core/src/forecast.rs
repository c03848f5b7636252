//! Hourly forecast records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::TideType;

/// Physical conditions for one forecast hour.
///
/// Each quantity is optional; providers routinely omit individual values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastConditions {
    /// Significant wave height in metres.
    pub wave_height: Option<f64>,
    /// Wave direction in degrees.
    pub wave_direction: Option<f64>,
    /// Wave period in seconds.
    pub wave_period: Option<f64>,
    /// Primary swell height in metres.
    pub swell_height: Option<f64>,
    /// Primary swell direction in degrees.
    pub swell_direction: Option<f64>,
    /// Primary swell period in seconds.
    pub swell_period: Option<f64>,
    /// Secondary swell height in metres.
    pub secondary_swell_height: Option<f64>,
    /// Secondary swell direction in degrees.
    pub secondary_swell_direction: Option<f64>,
    /// Secondary swell period in seconds.
    pub secondary_swell_period: Option<f64>,
    /// Wind speed in metres per second.
    pub wind_speed: Option<f64>,
    /// Wind direction in degrees.
    pub wind_direction: Option<f64>,
    /// Water temperature in degrees Celsius.
    pub water_temperature: Option<f64>,
    /// Air temperature in degrees Celsius.
    pub air_temperature: Option<f64>,
    /// Current speed in metres per second.
    pub current_speed: Option<f64>,
    /// Current direction in degrees.
    pub current_direction: Option<f64>,
    /// Sea level in metres.
    pub sea_level: Option<f64>,
    /// Tide phase at this hour.
    pub tide_type: Option<TideType>,
}

/// One hour of merged forecast data for a spot.
///
/// The owning spot is part of the storage key rather than the record, so
/// records are keyed by `(spot_id, timestamp_utc)` at the store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    /// Forecast hour.
    pub timestamp_utc: DateTime<Utc>,
    /// Conditions for the hour.
    #[serde(flatten)]
    pub conditions: ForecastConditions,
}

impl ForecastRecord {
    /// Construct a record.
    #[must_use]
    pub const fn new(timestamp_utc: DateTime<Utc>, conditions: ForecastConditions) -> Self {
        Self {
            timestamp_utc,
            conditions,
        }
    }
}
