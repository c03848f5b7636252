//! Storage contracts for forecasts, users and cached recommendations.
//!
//! The traits are synchronous, mirroring the blocking database drivers
//! behind them. Async jobs call into them from blocking worker threads and
//! share a store through `Arc`, hence the `Send + Sync` bounds.

use std::error::Error as StdError;

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use crate::{
    ForecastRecord, PreferenceSet, Spot, SpotId, SurfLevel, UserPresetConfig, UserProfile,
    UserSpotPreference,
};

#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use sqlite::SqliteStore;

/// Boxed error raised by a storage backend.
pub type BackendError = Box<dyn StdError + Send + Sync>;

/// Errors raised by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Opening the backing database failed.
    #[error("failed to open store at {path}")]
    Open {
        /// Location of the database.
        path: String,
        /// Source error from the backend.
        #[source]
        source: BackendError,
    },
    /// A query or statement failed.
    #[error("failed to {operation}")]
    Backend {
        /// Description of the failed operation.
        operation: &'static str,
        /// Source error from the backend.
        #[source]
        source: BackendError,
    },
    /// Encoding or decoding a JSON column failed.
    #[error("failed to {operation}")]
    Serialise {
        /// Description of the failed operation.
        operation: &'static str,
        /// JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// A stored value could not be interpreted.
    #[error("invalid {column} value {value:?}")]
    InvalidValue {
        /// Column holding the value.
        column: &'static str,
        /// Offending raw value.
        value: String,
    },
    /// A previous panic poisoned the store's lock.
    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// Wrap a backend failure for `operation`.
    pub fn backend(operation: &'static str, source: impl Into<BackendError>) -> Self {
        Self::Backend {
            operation,
            source: source.into(),
        }
    }
}

/// Render an instant in the fixed text form used at storage boundaries.
///
/// The form is RFC 3339 with whole seconds and a `Z` suffix, so stored
/// values compare correctly as text.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use swellcheck_core::store::format_timestamp;
///
/// let instant = Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).single().expect("valid instant");
/// assert_eq!(format_timestamp(instant), "2024-05-01T06:00:00Z");
/// ```
#[must_use]
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an instant written by [`format_timestamp`] or any RFC 3339 text.
///
/// # Errors
/// Returns [`StoreError::InvalidValue`] when `text` is not RFC 3339.
pub fn parse_timestamp(column: &'static str, text: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(text)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|_| StoreError::InvalidValue {
            column,
            value: text.to_owned(),
        })
}

/// Persisted hourly forecasts and the spots they belong to.
pub trait ForecastStore: Send + Sync {
    /// Insert or replace forecasts for `spot_id`, keyed by timestamp.
    ///
    /// Returns the number of records written.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the write fails; no partial batch is kept.
    fn upsert_forecasts(
        &self,
        spot_id: SpotId,
        records: &[ForecastRecord],
        updated_at: DateTime<Utc>,
    ) -> Result<usize, StoreError>;

    /// Forecasts for `spot_id` within `[from, to)`, ordered by timestamp.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the read fails.
    fn read_forecasts(
        &self,
        spot_id: SpotId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ForecastRecord>, StoreError>;

    /// Metadata for one spot, if it exists.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the read fails.
    fn read_spot(&self, spot_id: SpotId) -> Result<Option<Spot>, StoreError>;

    /// All spots, ordered by id.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the read fails.
    fn list_spots(&self) -> Result<Vec<Spot>, StoreError>;

    /// Remove forecasts timestamped before `threshold`; returns rows removed.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the delete fails.
    fn delete_forecasts_older_than(&self, threshold: DateTime<Utc>) -> Result<usize, StoreError>;
}

/// Users, their presets and their preference records.
pub trait UserStore: Send + Sync {
    /// One effective preset per user with an active preset.
    ///
    /// The default preset wins; otherwise the lowest preset id.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the read fails.
    fn list_active_user_presets(&self) -> Result<Vec<UserPresetConfig>, StoreError>;

    /// Profile and spot preferences for `user_id`.
    ///
    /// Preferences are returned in insertion order, which decides which
    /// active entry wins when several exist for one spot.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the read fails.
    fn read_user_profile_and_preferences(
        &self,
        user_id: &str,
    ) -> Result<(Option<UserProfile>, Vec<UserSpotPreference>), StoreError>;

    /// Overrides recorded for `spot_id` at `level`, if any.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the read fails.
    fn read_spot_level_preferences(
        &self,
        spot_id: SpotId,
        level: SurfLevel,
    ) -> Result<Option<PreferenceSet>, StoreError>;
}

/// A cached payload with its last refresh time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPayload {
    /// Serialised recommendation payload.
    pub payload: String,
    /// When the payload was last written.
    pub updated_at: DateTime<Utc>,
}

/// Recommendation cache keyed by `(user_id, cache_key)`.
pub trait CacheStore: Send + Sync {
    /// Insert or wholesale replace the payload for the key pair.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the write fails.
    fn upsert_cache(
        &self,
        user_id: &str,
        cache_key: &str,
        payload: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Read the payload for the key pair, if present.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the read fails.
    fn read_cache(&self, user_id: &str, cache_key: &str)
    -> Result<Option<CachedPayload>, StoreError>;
}

/// Convenience bound for stores that implement every contract.
pub trait SurfStore: ForecastStore + UserStore + CacheStore {}

impl<T> SurfStore for T where T: ForecastStore + UserStore + CacheStore + ?Sized {}
