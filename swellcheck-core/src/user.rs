//! User profiles and recommendation presets.

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{SpotId, SurfLevel};

/// Number of days covered by the rolling forecast window.
pub const WEEK_DAYS: u32 = 7;

/// Profile attributes that influence preference resolution and scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Opaque user identifier.
    pub user_id: String,
    /// Self-reported surf level.
    pub surf_level: SurfLevel,
}

impl UserProfile {
    /// Construct a profile.
    pub fn new(user_id: impl Into<String>, surf_level: SurfLevel) -> Self {
        Self {
            user_id: user_id.into(),
            surf_level,
        }
    }
}

/// Errors raised when a preset cannot drive a recommendation run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresetError {
    /// The window starts after it ends.
    #[error("time window start {start} is after end {end}")]
    InvertedWindow {
        /// Requested start of day.
        start: NaiveTime,
        /// Requested end of day.
        end: NaiveTime,
    },
    /// No spots were selected.
    #[error("preset selects no spots")]
    NoSpots,
    /// No day offsets were selected.
    #[error("preset selects no days")]
    NoDays,
    /// A day offset reaches past the representable calendar.
    #[error("day offset {offset} is out of range")]
    OffsetOutOfRange {
        /// Largest requested offset.
        offset: u32,
    },
}

/// Inclusive time-of-day window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeWindow {
    /// Validate and construct a window.
    ///
    /// # Errors
    /// Returns [`PresetError::InvertedWindow`] when `start > end`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, PresetError> {
        if start > end {
            return Err(PresetError::InvertedWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window covering the whole day.
    #[must_use]
    pub fn all_day() -> Self {
        Self {
            start: NaiveTime::MIN,
            end: NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN),
        }
    }

    /// Start of the window.
    #[must_use]
    pub const fn start(&self) -> NaiveTime {
        self.start
    }

    /// End of the window.
    #[must_use]
    pub const fn end(&self) -> NaiveTime {
        self.end
    }

    /// True when `time` lies within the window, bounds included.
    #[must_use]
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time <= self.end
    }
}

/// How a preset picks the days it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "lowercase")]
pub enum DaySelection {
    /// Offsets from today, `0` being today.
    Offsets(Vec<u32>),
    /// Weekdays, `0` being Sunday and `6` Saturday.
    Weekdays(Vec<u32>),
}

impl DaySelection {
    /// Storage label for the selection kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Offsets(_) => "offsets",
            Self::Weekdays(_) => "weekdays",
        }
    }

    /// Raw selection values.
    #[must_use]
    pub fn values(&self) -> &[u32] {
        match self {
            Self::Offsets(values) | Self::Weekdays(values) => values,
        }
    }

    /// Resolve the selection to day offsets relative to `today`.
    ///
    /// Weekday selections are matched against the next seven calendar days.
    /// When nothing matches, the selection falls back to today only.
    /// Offsets are returned sorted and without duplicates.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use swellcheck_core::DaySelection;
    ///
    /// // 2024-05-01 is a Wednesday.
    /// let today = NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date");
    /// let weekend = DaySelection::Weekdays(vec![0, 6]);
    /// assert_eq!(weekend.day_offsets(today), vec![3, 4]);
    /// assert_eq!(DaySelection::Weekdays(vec![]).day_offsets(today), vec![0]);
    /// ```
    #[must_use]
    pub fn day_offsets(&self, today: NaiveDate) -> Vec<u32> {
        match self {
            Self::Offsets(values) => {
                let mut offsets = values.clone();
                offsets.sort_unstable();
                offsets.dedup();
                offsets
            }
            Self::Weekdays(values) => {
                let first = today.weekday().num_days_from_sunday();
                let offsets: Vec<u32> = (0..WEEK_DAYS)
                    .filter(|offset| values.contains(&((first + offset) % WEEK_DAYS)))
                    .collect();
                if offsets.is_empty() {
                    vec![0]
                } else {
                    offsets
                }
            }
        }
    }
}

/// A user's saved recommendation preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPresetConfig {
    /// Store identifier of the preset.
    pub preset_id: i64,
    /// Owner of the preset.
    pub user_id: String,
    /// Display name, also used as the cache key.
    pub name: String,
    /// Spots the preset covers, in user order.
    pub spot_ids: Vec<SpotId>,
    /// Earliest UTC time of day considered.
    pub start_time: NaiveTime,
    /// Latest UTC time of day considered.
    pub end_time: NaiveTime,
    /// Day selection rule.
    pub day_selection: DaySelection,
}

impl UserPresetConfig {
    /// Validated time window for the preset.
    ///
    /// # Errors
    /// Returns [`PresetError::InvertedWindow`] when the start is after the end.
    pub fn time_window(&self) -> Result<TimeWindow, PresetError> {
        TimeWindow::new(self.start_time, self.end_time)
    }
}
