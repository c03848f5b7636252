//! Surf spot reference data.

use serde::{Deserialize, Serialize};

use crate::PreferenceSet;

/// Store identifier of a spot.
pub type SpotId = i64;

/// A named surf location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spot {
    /// Unique identifier.
    pub id: SpotId,
    /// Display name.
    pub name: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// IANA timezone name, informational.
    pub timezone: String,
    /// Ideal conditions recorded for the spot itself, if any.
    #[serde(default)]
    pub ideal_conditions: PreferenceSet,
}

impl Spot {
    /// Construct a spot without recorded ideal conditions.
    pub fn new(id: SpotId, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id,
            name: name.into(),
            latitude,
            longitude,
            timezone: String::from("UTC"),
            ideal_conditions: PreferenceSet::default(),
        }
    }

    /// Set the timezone while returning `self` for chaining.
    #[must_use]
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    /// Set the ideal conditions while returning `self` for chaining.
    #[must_use]
    pub const fn with_ideal_conditions(mut self, ideal: PreferenceSet) -> Self {
        self.ideal_conditions = ideal;
        self
    }
}
