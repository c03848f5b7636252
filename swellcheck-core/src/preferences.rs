//! Layered surf preferences.
//!
//! An effective [`PreferenceSet`] is built from three layers, lowest
//! precedence first: the generic table for the surfer's level, overrides
//! recorded for the spot at that level, and the user's own active
//! preference for the spot. A field missing from a higher layer never
//! erases the value supplied by a lower one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{CardinalDirection, SpotId, TideType, UserProfile};

/// Self-reported ability of a surfer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SurfLevel {
    /// New to the sport; small, clean, forgiving waves.
    Beginner,
    /// Comfortable in overhead surf. Unrecognised labels fall back here.
    #[default]
    Intermediate,
    /// Seeks size and power.
    Advanced,
}

impl SurfLevel {
    /// Interpret a stored level label.
    ///
    /// Unrecognised labels map to [`SurfLevel::Intermediate`].
    ///
    /// # Examples
    /// ```
    /// use swellcheck_core::SurfLevel;
    ///
    /// assert_eq!(SurfLevel::from_label("Advanced"), SurfLevel::Advanced);
    /// assert_eq!(SurfLevel::from_label("longboard"), SurfLevel::Intermediate);
    /// ```
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "beginner" => Self::Beginner,
            "advanced" => Self::Advanced,
            _ => Self::Intermediate,
        }
    }

    /// Lowercase label used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// Generic preference table for this level.
    ///
    /// These values are fixed business constants; spot and user layers
    /// override them field by field.
    #[must_use]
    pub const fn defaults(self) -> PreferenceSet {
        match self {
            Self::Beginner => PreferenceSet {
                ideal_swell_height: Some(0.8),
                max_swell_height: Some(1.5),
                max_wind_speed: Some(6.0),
                ideal_water_temperature: Some(22.0),
                ideal_air_temperature: Some(25.0),
                ideal_swell_direction: None,
                ideal_wind_direction: None,
                ideal_sea_level: None,
                ideal_tide_flow: Some(TideType::Rising),
            },
            Self::Intermediate => PreferenceSet {
                ideal_swell_height: Some(1.2),
                max_swell_height: Some(2.2),
                max_wind_speed: Some(9.0),
                ideal_water_temperature: Some(20.0),
                ideal_air_temperature: Some(23.0),
                ideal_swell_direction: None,
                ideal_wind_direction: None,
                ideal_sea_level: None,
                ideal_tide_flow: Some(TideType::Rising),
            },
            Self::Advanced => PreferenceSet {
                ideal_swell_height: Some(1.8),
                max_swell_height: Some(3.5),
                max_wind_speed: Some(12.0),
                ideal_water_temperature: Some(18.0),
                ideal_air_temperature: Some(20.0),
                ideal_swell_direction: None,
                ideal_wind_direction: None,
                ideal_sea_level: None,
                ideal_tide_flow: None,
            },
        }
    }
}

impl fmt::Display for SurfLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named thresholds that steer scoring.
///
/// Every field is optional so that partial records can be layered.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PreferenceSet {
    /// Preferred swell height in metres.
    pub ideal_swell_height: Option<f64>,
    /// Largest acceptable swell height in metres.
    pub max_swell_height: Option<f64>,
    /// Largest acceptable wind speed in metres per second.
    pub max_wind_speed: Option<f64>,
    /// Preferred water temperature in degrees Celsius.
    pub ideal_water_temperature: Option<f64>,
    /// Preferred air temperature in degrees Celsius.
    pub ideal_air_temperature: Option<f64>,
    /// Swell direction the spot works best with.
    pub ideal_swell_direction: Option<CardinalDirection>,
    /// Wind direction the spot works best with, usually offshore.
    pub ideal_wind_direction: Option<CardinalDirection>,
    /// Preferred sea level in metres.
    pub ideal_sea_level: Option<f64>,
    /// Preferred tide phase.
    pub ideal_tide_flow: Option<TideType>,
}

impl PreferenceSet {
    /// Return `self` with every field that `higher` sets replaced.
    ///
    /// # Examples
    /// ```
    /// use swellcheck_core::PreferenceSet;
    ///
    /// let base = PreferenceSet { max_wind_speed: Some(8.0), ..PreferenceSet::default() };
    /// let higher = PreferenceSet { ideal_swell_height: Some(1.0), ..PreferenceSet::default() };
    /// let merged = base.overlay(&higher);
    /// assert_eq!(merged.max_wind_speed, Some(8.0));
    /// assert_eq!(merged.ideal_swell_height, Some(1.0));
    /// ```
    #[must_use]
    pub fn overlay(&self, higher: &Self) -> Self {
        Self {
            ideal_swell_height: higher.ideal_swell_height.or(self.ideal_swell_height),
            max_swell_height: higher.max_swell_height.or(self.max_swell_height),
            max_wind_speed: higher.max_wind_speed.or(self.max_wind_speed),
            ideal_water_temperature: higher
                .ideal_water_temperature
                .or(self.ideal_water_temperature),
            ideal_air_temperature: higher.ideal_air_temperature.or(self.ideal_air_temperature),
            ideal_swell_direction: higher.ideal_swell_direction.or(self.ideal_swell_direction),
            ideal_wind_direction: higher.ideal_wind_direction.or(self.ideal_wind_direction),
            ideal_sea_level: higher.ideal_sea_level.or(self.ideal_sea_level),
            ideal_tide_flow: higher.ideal_tide_flow.or(self.ideal_tide_flow),
        }
    }

    /// True when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A user's own preference record for one spot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserSpotPreference {
    /// Spot the record applies to.
    pub spot_id: SpotId,
    /// Inactive records are ignored during resolution.
    pub is_active: bool,
    /// Fields the user has chosen to override.
    pub overrides: PreferenceSet,
}

/// Compose the effective preferences for a user at a spot.
///
/// `spot_level` holds the overrides recorded for the spot at the user's
/// surf level, when any exist. Among `user_preferences`, the first active
/// entry for `spot_id` in slice order wins; later duplicates are ignored.
///
/// # Examples
/// ```
/// use swellcheck_core::{
///     PreferenceSet, SurfLevel, UserProfile, UserSpotPreference, resolve_preferences,
/// };
///
/// let profile = UserProfile::new("u-1", SurfLevel::Beginner);
/// let mine = UserSpotPreference {
///     spot_id: 7,
///     is_active: true,
///     overrides: PreferenceSet { max_wind_speed: Some(4.0), ..PreferenceSet::default() },
/// };
/// let prefs = resolve_preferences(&profile, 7, None, &[mine]);
/// assert_eq!(prefs.max_wind_speed, Some(4.0));
/// assert_eq!(prefs.ideal_swell_height, SurfLevel::Beginner.defaults().ideal_swell_height);
/// ```
#[must_use]
pub fn resolve_preferences(
    profile: &UserProfile,
    spot_id: SpotId,
    spot_level: Option<&PreferenceSet>,
    user_preferences: &[UserSpotPreference],
) -> PreferenceSet {
    let generic = profile.surf_level.defaults();
    let with_spot = spot_level.map_or(generic, |spot| generic.overlay(spot));
    user_preferences
        .iter()
        .find(|pref| pref.spot_id == spot_id && pref.is_active)
        .map_or(with_spot, |pref| with_spot.overlay(&pref.overrides))
}
