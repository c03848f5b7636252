//! Persist ranked recommendations under `(user_id, cache_key)`.
//!
//! Payloads are JSON documents. Each save replaces the previous payload for
//! the key pair wholesale.

use chrono::{DateTime, Utc};

use crate::DailyRecommendation;
use crate::store::{CacheStore, StoreError};

/// Serialise `recommendations` and overwrite the cache entry for the key pair.
///
/// # Errors
/// Returns [`StoreError::Serialise`] when encoding fails, or the store's
/// error when the write fails.
///
/// # Examples
/// ```
/// # #[cfg(feature = "store-sqlite")]
/// # fn main() -> Result<(), swellcheck_core::store::StoreError> {
/// use chrono::Utc;
/// use swellcheck_core::cache::{load_recommendations, save_recommendations};
/// use swellcheck_core::store::SqliteStore;
///
/// let store = SqliteStore::open_in_memory()?;
/// save_recommendations(&store, "alice", "today", &[], Utc::now())?;
/// assert_eq!(load_recommendations(&store, "alice", "today")?, Some(Vec::new()));
/// # Ok(())
/// # }
/// # #[cfg(not(feature = "store-sqlite"))]
/// # fn main() {}
/// ```
pub fn save_recommendations<S>(
    store: &S,
    user_id: &str,
    cache_key: &str,
    recommendations: &[DailyRecommendation],
    updated_at: DateTime<Utc>,
) -> Result<(), StoreError>
where
    S: CacheStore + ?Sized,
{
    let payload = serde_json::to_string(recommendations).map_err(|source| {
        StoreError::Serialise {
            operation: "encode recommendation payload",
            source,
        }
    })?;
    store.upsert_cache(user_id, cache_key, &payload, updated_at)
}

/// Read and decode the cached recommendations for the key pair.
///
/// # Errors
/// Returns [`StoreError::Serialise`] when the stored payload is not a valid
/// recommendation document, or the store's error when the read fails.
pub fn load_recommendations<S>(
    store: &S,
    user_id: &str,
    cache_key: &str,
) -> Result<Option<Vec<DailyRecommendation>>, StoreError>
where
    S: CacheStore + ?Sized,
{
    let Some(cached) = store.read_cache(user_id, cache_key)? else {
        return Ok(None);
    };
    serde_json::from_str(&cached.payload)
        .map(Some)
        .map_err(|source| StoreError::Serialise {
            operation: "decode recommendation payload",
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use chrono::{NaiveDate, TimeZone};
    use rstest::rstest;
    use serde_json::Value;

    use crate::test_support::MemoryStore;
    use crate::{ForecastConditions, ForecastRecord, RankedSpot};

    fn ranked(score: f64) -> DailyRecommendation {
        let hour = Utc
            .with_ymd_and_hms(2024, 5, 1, 7, 0, 0)
            .single()
            .expect("valid instant");
        DailyRecommendation {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date"),
            ranked_spots: vec![RankedSpot {
                spot_id: 1,
                spot_name: "Beach".to_owned(),
                best_hour_utc: hour,
                best_overall_score: score,
                detailed_scores: BTreeMap::from([("swell".to_owned(), score)]),
                forecast_conditions: ForecastRecord::new(hour, ForecastConditions::default()),
            }],
        }
    }

    #[rstest]
    fn saving_twice_keeps_latest_payload() {
        let store = MemoryStore::default();
        save_recommendations(&store, "alice", "today", &[ranked(40.0)], Utc::now())
            .expect("first save");
        save_recommendations(&store, "alice", "today", &[ranked(55.0)], Utc::now())
            .expect("second save");

        let loaded = load_recommendations(&store, "alice", "today")
            .expect("load")
            .expect("entry present");
        assert_eq!(loaded, vec![ranked(55.0)]);
        assert_eq!(store.cache_len(), 1);
    }

    #[rstest]
    fn payload_uses_text_dates_and_instants() {
        let store = MemoryStore::default();
        save_recommendations(&store, "alice", "today", &[ranked(40.0)], Utc::now())
            .expect("save");
        let cached = store.cache_entry("alice", "today").expect("entry present");
        let document: Value = serde_json::from_str(&cached.payload).expect("valid json");

        assert_eq!(document[0]["date"], "2024-05-01");
        assert_eq!(
            document[0]["ranked_spots"][0]["best_hour_utc"],
            "2024-05-01T07:00:00Z"
        );
    }

    #[rstest]
    fn missing_entry_loads_as_none() {
        let store = MemoryStore::default();
        assert_eq!(
            load_recommendations(&store, "alice", "tomorrow").expect("load"),
            None
        );
    }
}
