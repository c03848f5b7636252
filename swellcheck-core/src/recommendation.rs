//! Ranked recommendation payloads.
//!
//! These are the structures stored in the recommendation cache. Dates are
//! serialised as `YYYY-MM-DD` and instants as RFC 3339 text.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{ForecastRecord, SpotId};

/// Best session for one spot on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSpot {
    /// Spot identifier.
    pub spot_id: SpotId,
    /// Spot display name.
    pub spot_name: String,
    /// Hour with the highest score.
    pub best_hour_utc: DateTime<Utc>,
    /// Score of that hour.
    pub best_overall_score: f64,
    /// Named component scores for that hour.
    pub detailed_scores: BTreeMap<String, f64>,
    /// Forecast conditions for that hour.
    pub forecast_conditions: ForecastRecord,
}

/// Spots ranked for a single date, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecommendation {
    /// Calendar date in UTC.
    pub date: NaiveDate,
    /// Spots sorted descending by `best_overall_score`.
    pub ranked_spots: Vec<RankedSpot>,
}
