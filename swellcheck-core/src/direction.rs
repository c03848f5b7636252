//! Sixteen-point compass directions.
//!
//! Preference rows name directions by compass label while provider data
//! reports degrees; this module converts between the two.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Width of one compass sector in degrees.
const SECTOR_DEGREES: f64 = 22.5;

/// A point on the sixteen-wind compass rose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CardinalDirection {
    /// North.
    N,
    /// North-north-east.
    Nne,
    /// North-east.
    Ne,
    /// East-north-east.
    Ene,
    /// East.
    E,
    /// East-south-east.
    Ese,
    /// South-east.
    Se,
    /// South-south-east.
    Sse,
    /// South.
    S,
    /// South-south-west.
    Ssw,
    /// South-west.
    Sw,
    /// West-south-west.
    Wsw,
    /// West.
    W,
    /// West-north-west.
    Wnw,
    /// North-west.
    Nw,
    /// North-north-west.
    Nnw,
}

const ROSE: [CardinalDirection; 16] = [
    CardinalDirection::N,
    CardinalDirection::Nne,
    CardinalDirection::Ne,
    CardinalDirection::Ene,
    CardinalDirection::E,
    CardinalDirection::Ese,
    CardinalDirection::Se,
    CardinalDirection::Sse,
    CardinalDirection::S,
    CardinalDirection::Ssw,
    CardinalDirection::Sw,
    CardinalDirection::Wsw,
    CardinalDirection::W,
    CardinalDirection::Wnw,
    CardinalDirection::Nw,
    CardinalDirection::Nnw,
];

impl CardinalDirection {
    /// Nearest compass point for a bearing in degrees.
    ///
    /// Bearings outside `0..360` wrap; non-finite input yields `None`.
    ///
    /// # Examples
    /// ```
    /// use swellcheck_core::CardinalDirection;
    ///
    /// assert_eq!(CardinalDirection::from_degrees(350.0), Some(CardinalDirection::N));
    /// assert_eq!(CardinalDirection::from_degrees(225.0), Some(CardinalDirection::Sw));
    /// ```
    #[must_use]
    pub fn from_degrees(degrees: f64) -> Option<Self> {
        if !degrees.is_finite() {
            return None;
        }
        let sector = (degrees.rem_euclid(360.0) / SECTOR_DEGREES).round();
        // `sector` is finite and within 0.0..=16.0.
        let index = (sector as usize) % ROSE.len();
        ROSE.get(index).copied()
    }

    /// Bearing of the centre of this compass sector.
    #[must_use]
    pub fn degrees(self) -> f64 {
        let index = ROSE.iter().position(|point| *point == self).unwrap_or_default();
        f64::from(u8::try_from(index).unwrap_or_default()) * SECTOR_DEGREES
    }

    /// Uppercase compass label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::N => "N",
            Self::Nne => "NNE",
            Self::Ne => "NE",
            Self::Ene => "ENE",
            Self::E => "E",
            Self::Ese => "ESE",
            Self::Se => "SE",
            Self::Sse => "SSE",
            Self::S => "S",
            Self::Ssw => "SSW",
            Self::Sw => "SW",
            Self::Wsw => "WSW",
            Self::W => "W",
            Self::Wnw => "WNW",
            Self::Nw => "NW",
            Self::Nnw => "NNW",
        }
    }
}

impl fmt::Display for CardinalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a compass label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown compass direction: {0}")]
pub struct ParseDirectionError(pub String);

impl FromStr for CardinalDirection {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_ascii_uppercase();
        ROSE.iter()
            .copied()
            .find(|point| point.as_str() == label)
            .ok_or_else(|| ParseDirectionError(s.to_owned()))
    }
}

/// Smallest angle between two bearings, in degrees.
#[must_use]
pub fn angular_distance(a: f64, b: f64) -> f64 {
    let delta = (a - b).rem_euclid(360.0);
    delta.min(360.0 - delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, CardinalDirection::N)]
    #[case(11.0, CardinalDirection::N)]
    #[case(12.0, CardinalDirection::Nne)]
    #[case(90.0, CardinalDirection::E)]
    #[case(359.0, CardinalDirection::N)]
    #[case(-90.0, CardinalDirection::W)]
    #[case(720.0 + 180.0, CardinalDirection::S)]
    fn maps_degrees_to_nearest_point(#[case] degrees: f64, #[case] expected: CardinalDirection) {
        assert_eq!(CardinalDirection::from_degrees(degrees), Some(expected));
    }

    #[rstest]
    fn rejects_non_finite_bearing() {
        assert_eq!(CardinalDirection::from_degrees(f64::NAN), None);
    }

    #[rstest]
    fn labels_round_trip_through_degrees() {
        for point in ROSE {
            assert_eq!(CardinalDirection::from_degrees(point.degrees()), Some(point));
            assert_eq!(point.as_str().parse::<CardinalDirection>(), Ok(point));
        }
    }

    #[rstest]
    #[case(350.0, 10.0, 20.0)]
    #[case(90.0, 270.0, 180.0)]
    #[case(45.0, 45.0, 0.0)]
    fn measures_shortest_arc(#[case] a: f64, #[case] b: f64, #[case] expected: f64) {
        assert!((angular_distance(a, b) - expected).abs() < 1e-9);
    }
}
