//! Tide phase classification for sea-level series.
//!
//! Samples are grouped by the calendar date of their own zone-bearing
//! timestamp and each day is classified on its own. Gaps between daily
//! collection windows would otherwise produce false extrema at midnight.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Phase of the tide at a sampled instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TideType {
    /// Local maximum, including every sample on a flat peak.
    High,
    /// Local minimum, including every sample on a flat trough.
    Low,
    /// Level increasing towards the next turn.
    Rising,
    /// Level decreasing towards the next turn.
    Falling,
    /// No level, or no distinguishable neighbour on the same day.
    Unknown,
}

impl TideType {
    /// Lowercase label used in storage and payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Low => "low",
            Self::Rising => "rising",
            Self::Falling => "falling",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TideType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognised tide label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tide type: {0}")]
pub struct ParseTideTypeError(pub String);

impl FromStr for TideType {
    type Err = ParseTideTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "low" => Ok(Self::Low),
            "rising" => Ok(Self::Rising),
            "falling" => Ok(Self::Falling),
            "unknown" => Ok(Self::Unknown),
            _ => Err(ParseTideTypeError(s.to_owned())),
        }
    }
}

/// Raw sea-level reading as delivered by the provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeaLevelSample {
    /// Instant of the reading, carrying the offset it was reported in.
    pub time: DateTime<FixedOffset>,
    /// Sea level in metres, absent when the provider had no value.
    pub level: Option<f64>,
}

impl SeaLevelSample {
    /// Construct a sample.
    #[must_use]
    pub const fn new(time: DateTime<FixedOffset>, level: Option<f64>) -> Self {
        Self { time, level }
    }
}

/// A sea-level sample annotated with its tide phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TidePoint {
    /// Instant of the reading.
    pub time: DateTime<FixedOffset>,
    /// Sea level in metres.
    pub level: Option<f64>,
    /// Classified phase.
    pub tide_type: TideType,
}

/// Label every sample with its tide phase.
///
/// The output has one point per input sample and is sorted ascending by
/// time. Classification never looks across a calendar-day boundary.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use swellcheck_core::{SeaLevelSample, TideType, classify_tide_phases};
///
/// let samples: Vec<_> = [1.0, 2.0, 3.0, 2.0, 1.0]
///     .into_iter()
///     .enumerate()
///     .map(|(hour, level)| {
///         let time = DateTime::parse_from_rfc3339(&format!("2024-05-01T{hour:02}:00:00+00:00"))
///             .expect("valid timestamp");
///         SeaLevelSample::new(time, Some(level))
///     })
///     .collect();
///
/// let phases: Vec<_> = classify_tide_phases(&samples)
///     .into_iter()
///     .map(|point| point.tide_type)
///     .collect();
/// assert_eq!(
///     phases,
///     [TideType::Rising, TideType::Rising, TideType::High, TideType::Falling, TideType::Falling]
/// );
/// ```
#[must_use]
pub fn classify_tide_phases(samples: &[SeaLevelSample]) -> Vec<TidePoint> {
    let mut ordered: Vec<&SeaLevelSample> = samples.iter().collect();
    ordered.sort_by_key(|sample| sample.time);

    let mut days: BTreeMap<NaiveDate, Vec<&SeaLevelSample>> = BTreeMap::new();
    for sample in ordered {
        days.entry(sample.time.date_naive())
            .or_default()
            .push(sample);
    }

    let mut points: Vec<TidePoint> = days.values().flat_map(|day| classify_day(day)).collect();
    points.sort_by_key(|point| point.time);
    points
}

fn classify_day(day: &[&SeaLevelSample]) -> Vec<TidePoint> {
    day.iter()
        .enumerate()
        .map(|(index, sample)| TidePoint {
            time: sample.time,
            level: sample.level,
            tide_type: sample
                .level
                .map_or(TideType::Unknown, |level| classify_at(day, index, level)),
        })
        .collect()
}

fn classify_at(day: &[&SeaLevelSample], index: usize, level: f64) -> TideType {
    let differs = |sample: &&SeaLevelSample| sample.level.filter(|other| *other != level);
    let prev = day.iter().take(index).rev().find_map(differs);
    let next = day.iter().skip(index + 1).find_map(differs);
    classify_level(level, prev, next)
}

fn classify_level(level: f64, prev: Option<f64>, next: Option<f64>) -> TideType {
    match (prev, next) {
        (Some(prev), Some(next)) => {
            if level > prev && level > next {
                TideType::High
            } else if level < prev && level < next {
                TideType::Low
            } else if level >= prev {
                TideType::Rising
            } else {
                TideType::Falling
            }
        }
        // First distinguishable point of the day.
        (None, Some(next)) => {
            if level > next {
                TideType::Falling
            } else {
                TideType::Rising
            }
        }
        // Last distinguishable point of the day.
        (Some(prev), None) => {
            if level > prev {
                TideType::Rising
            } else {
                TideType::Falling
            }
        }
        (None, None) => TideType::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn at(stamp: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(stamp).expect("valid timestamp")
    }

    fn hourly(date: &str, levels: &[Option<f64>]) -> Vec<SeaLevelSample> {
        levels
            .iter()
            .enumerate()
            .map(|(hour, level)| SeaLevelSample::new(at(&format!("{date}T{hour:02}:00:00+00:00")), *level))
            .collect()
    }

    fn phases(points: &[TidePoint]) -> Vec<TideType> {
        points.iter().map(|point| point.tide_type).collect()
    }

    #[rstest]
    #[case(
        &[Some(1.0), Some(2.0), Some(3.0), Some(2.0), Some(1.0)],
        &[TideType::Rising, TideType::Rising, TideType::High, TideType::Falling, TideType::Falling]
    )]
    #[case(
        &[Some(1.0), Some(3.0), Some(3.0), Some(3.0), Some(1.0)],
        &[TideType::Rising, TideType::High, TideType::High, TideType::High, TideType::Falling]
    )]
    #[case(
        &[Some(3.0), Some(1.0), Some(1.0), Some(3.0)],
        &[TideType::Falling, TideType::Low, TideType::Low, TideType::Rising]
    )]
    #[case(&[Some(1.2)], &[TideType::Unknown])]
    #[case(&[Some(1.2), Some(1.2), Some(1.2)], &[TideType::Unknown, TideType::Unknown, TideType::Unknown])]
    #[case(
        &[Some(1.0), None, Some(2.0)],
        &[TideType::Rising, TideType::Unknown, TideType::Rising]
    )]
    fn classifies_single_day(#[case] levels: &[Option<f64>], #[case] expected: &[TideType]) {
        let points = classify_tide_phases(&hourly("2024-05-01", levels));
        assert_eq!(phases(&points), expected);
    }

    #[rstest]
    fn output_is_sorted_regardless_of_input_order() {
        let mut samples = hourly("2024-05-01", &[Some(1.0), Some(2.0), Some(3.0)]);
        samples.reverse();
        let points = classify_tide_phases(&samples);
        assert!(points.windows(2).all(|pair| pair[0].time <= pair[1].time));
        assert_eq!(phases(&points), [TideType::Rising, TideType::Rising, TideType::Rising]);
    }

    #[rstest]
    fn days_are_classified_independently() {
        let mut samples = hourly("2024-05-01", &[Some(1.0), Some(2.0)]);
        samples.push(SeaLevelSample::new(at("2024-05-01T23:00:00+00:00"), Some(2.5)));
        samples.push(SeaLevelSample::new(at("2024-05-02T00:00:00+00:00"), Some(2.5)));
        samples.push(SeaLevelSample::new(at("2024-05-02T01:00:00+00:00"), Some(0.5)));

        let points = classify_tide_phases(&samples);

        // 23:00 only sees its own day, 00:00 only sees the next.
        assert_eq!(
            phases(&points),
            [
                TideType::Rising,
                TideType::Rising,
                TideType::Rising,
                TideType::Falling,
                TideType::Falling,
            ]
        );
    }

    #[rstest]
    fn day_grouping_uses_each_sample_offset() {
        // The first two readings fall on 1 May in UTC but 2 May locally.
        let samples = [
            SeaLevelSample::new(at("2024-05-02T01:00:00+03:00"), Some(1.0)),
            SeaLevelSample::new(at("2024-05-02T02:00:00+03:00"), Some(2.0)),
            SeaLevelSample::new(at("2024-05-02T04:00:00+03:00"), Some(3.0)),
        ];
        let points = classify_tide_phases(&samples);
        assert_eq!(
            phases(&points),
            [TideType::Rising, TideType::Rising, TideType::Rising]
        );
    }

    #[rstest]
    fn empty_input_yields_empty_output() {
        assert!(classify_tide_phases(&[]).is_empty());
    }

    #[rstest]
    #[case("high", TideType::High)]
    #[case(" Falling ", TideType::Falling)]
    fn parses_labels(#[case] label: &str, #[case] expected: TideType) {
        assert_eq!(label.parse::<TideType>().expect("known label"), expected);
    }

    #[rstest]
    fn rejects_unknown_label() {
        assert!("slack".parse::<TideType>().is_err());
    }
}
