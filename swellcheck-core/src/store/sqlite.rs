//! SQLite-backed implementation of every store contract.

use std::{
    fmt, io,
    sync::{Mutex, MutexGuard},
};

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8};
use chrono::{DateTime, NaiveTime, Utc};
use log::warn;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    DaySelection, ForecastConditions, ForecastRecord, PreferenceSet, Spot, SpotId, SurfLevel,
    UserPresetConfig, UserProfile, UserSpotPreference,
};

use super::{
    CacheStore, CachedPayload, ForecastStore, StoreError, UserStore, format_timestamp,
    parse_timestamp,
};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS spots (
        spot_id INTEGER PRIMARY KEY,
        spot_name TEXT NOT NULL,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        timezone TEXT NOT NULL DEFAULT 'UTC',
        ideal_conditions TEXT
    );
    CREATE TABLE IF NOT EXISTS forecasts (
        spot_id INTEGER NOT NULL,
        timestamp_utc TEXT NOT NULL,
        conditions TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        PRIMARY KEY (spot_id, timestamp_utc)
    );
    CREATE INDEX IF NOT EXISTS forecasts_by_time ON forecasts (timestamp_utc);
    CREATE TABLE IF NOT EXISTS surf_level_preferences (
        spot_id INTEGER NOT NULL,
        surf_level TEXT NOT NULL,
        preferences TEXT NOT NULL,
        PRIMARY KEY (spot_id, surf_level)
    );
    CREATE TABLE IF NOT EXISTS user_profiles (
        user_id TEXT PRIMARY KEY,
        surf_level TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS user_spot_preferences (
        preference_id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        spot_id INTEGER NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1,
        preferences TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS user_presets (
        preset_id INTEGER PRIMARY KEY,
        user_id TEXT NOT NULL,
        name TEXT NOT NULL,
        spot_ids TEXT NOT NULL,
        start_time TEXT NOT NULL,
        end_time TEXT NOT NULL,
        day_selection_type TEXT NOT NULL,
        day_selection_values TEXT NOT NULL,
        is_default INTEGER NOT NULL DEFAULT 0,
        is_active INTEGER NOT NULL DEFAULT 1
    );
    CREATE TABLE IF NOT EXISTS recommendation_cache (
        user_id TEXT NOT NULL,
        cache_key TEXT NOT NULL,
        payload TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        PRIMARY KEY (user_id, cache_key)
    );
";

const TIME_OF_DAY_FORMAT: &str = "%H:%M:%S";

/// Store backed by a single SQLite connection.
///
/// The connection sits behind a mutex so one store can be shared across
/// worker threads; every statement runs under the lock.
pub struct SqliteStore {
    connection: Mutex<Connection>,
}

impl fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open or create a database at `path`, creating parent directories.
    ///
    /// # Errors
    /// Returns [`StoreError::Open`] when the directory or database cannot be
    /// created, or a backend error when the schema cannot be applied.
    pub fn open(path: &Utf8Path) -> Result<Self, StoreError> {
        ensure_parent_dir(path).map_err(|source| StoreError::Open {
            path: path.to_string(),
            source: source.into(),
        })?;
        let connection =
            Connection::open(path.as_std_path()).map_err(|source| StoreError::Open {
                path: path.to_string(),
                source: source.into(),
            })?;
        Self::with_connection(connection)
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns a backend error when SQLite cannot allocate the database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let connection = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: String::from(":memory:"),
            source: source.into(),
        })?;
        Self::with_connection(connection)
    }

    fn with_connection(connection: Connection) -> Result<Self, StoreError> {
        connection
            .execute_batch(SCHEMA)
            .map_err(sql("initialise schema"))?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.connection.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Insert or replace a spot.
    ///
    /// # Errors
    /// Returns [`StoreError`] when encoding or the write fails.
    pub fn upsert_spot(&self, spot: &Spot) -> Result<(), StoreError> {
        let ideal = if spot.ideal_conditions.is_empty() {
            None
        } else {
            Some(encode(&spot.ideal_conditions, "encode spot ideal conditions")?)
        };
        self.lock()?
            .execute(
                "INSERT INTO spots (spot_id, spot_name, latitude, longitude, timezone, ideal_conditions)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (spot_id) DO UPDATE SET
                     spot_name = excluded.spot_name,
                     latitude = excluded.latitude,
                     longitude = excluded.longitude,
                     timezone = excluded.timezone,
                     ideal_conditions = excluded.ideal_conditions",
                params![
                    spot.id,
                    spot.name,
                    spot.latitude,
                    spot.longitude,
                    spot.timezone,
                    ideal
                ],
            )
            .map_err(sql("upsert spot"))?;
        Ok(())
    }

    /// Insert or replace a user profile.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the write fails.
    pub fn upsert_user_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        self.lock()?
            .execute(
                "INSERT OR REPLACE INTO user_profiles (user_id, surf_level) VALUES (?1, ?2)",
                params![profile.user_id, profile.surf_level.as_str()],
            )
            .map_err(sql("upsert user profile"))?;
        Ok(())
    }

    /// Append a user preference record for a spot.
    ///
    /// # Errors
    /// Returns [`StoreError`] when encoding or the write fails.
    pub fn insert_user_spot_preference(
        &self,
        user_id: &str,
        preference: &UserSpotPreference,
    ) -> Result<(), StoreError> {
        let overrides = encode(&preference.overrides, "encode user preference")?;
        self.lock()?
            .execute(
                "INSERT INTO user_spot_preferences (user_id, spot_id, is_active, preferences)
                 VALUES (?1, ?2, ?3, ?4)",
                params![user_id, preference.spot_id, preference.is_active, overrides],
            )
            .map_err(sql("insert user preference"))?;
        Ok(())
    }

    /// Insert or replace the overrides for a spot at a surf level.
    ///
    /// # Errors
    /// Returns [`StoreError`] when encoding or the write fails.
    pub fn upsert_spot_level_preferences(
        &self,
        spot_id: SpotId,
        level: SurfLevel,
        preferences: &PreferenceSet,
    ) -> Result<(), StoreError> {
        let encoded = encode(preferences, "encode spot level preferences")?;
        self.lock()?
            .execute(
                "INSERT OR REPLACE INTO surf_level_preferences (spot_id, surf_level, preferences)
                 VALUES (?1, ?2, ?3)",
                params![spot_id, level.as_str(), encoded],
            )
            .map_err(sql("upsert spot level preferences"))?;
        Ok(())
    }

    /// Insert or replace a preset.
    ///
    /// # Errors
    /// Returns [`StoreError`] when encoding or the write fails.
    pub fn upsert_preset(
        &self,
        preset: &UserPresetConfig,
        is_default: bool,
        is_active: bool,
    ) -> Result<(), StoreError> {
        let spot_ids = encode(&preset.spot_ids, "encode preset spots")?;
        let values = encode(preset.day_selection.values(), "encode preset days")?;
        self.lock()?
            .execute(
                "INSERT OR REPLACE INTO user_presets (
                     preset_id, user_id, name, spot_ids, start_time, end_time,
                     day_selection_type, day_selection_values, is_default, is_active
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    preset.preset_id,
                    preset.user_id,
                    preset.name,
                    spot_ids,
                    preset.start_time.format(TIME_OF_DAY_FORMAT).to_string(),
                    preset.end_time.format(TIME_OF_DAY_FORMAT).to_string(),
                    preset.day_selection.kind(),
                    values,
                    is_default,
                    is_active
                ],
            )
            .map_err(sql("upsert preset"))?;
        Ok(())
    }
}

impl ForecastStore for SqliteStore {
    fn upsert_forecasts(
        &self,
        spot_id: SpotId,
        records: &[ForecastRecord],
        updated_at: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }
        let updated = format_timestamp(updated_at);
        let mut connection = self.lock()?;
        let transaction = connection
            .transaction()
            .map_err(sql("begin forecast transaction"))?;
        {
            let mut statement = transaction
                .prepare_cached(
                    "INSERT INTO forecasts (spot_id, timestamp_utc, conditions, updated_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT (spot_id, timestamp_utc) DO UPDATE SET
                         conditions = excluded.conditions,
                         updated_at = excluded.updated_at",
                )
                .map_err(sql("prepare forecast upsert"))?;
            for record in records {
                let conditions = encode(&record.conditions, "encode forecast conditions")?;
                statement
                    .execute(params![
                        spot_id,
                        format_timestamp(record.timestamp_utc),
                        conditions,
                        updated
                    ])
                    .map_err(sql("upsert forecast"))?;
            }
        }
        transaction
            .commit()
            .map_err(sql("commit forecast transaction"))?;
        Ok(records.len())
    }

    fn read_forecasts(
        &self,
        spot_id: SpotId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ForecastRecord>, StoreError> {
        let connection = self.lock()?;
        let mut statement = connection
            .prepare_cached(
                "SELECT timestamp_utc, conditions FROM forecasts
                 WHERE spot_id = ?1 AND timestamp_utc >= ?2 AND timestamp_utc < ?3
                 ORDER BY timestamp_utc",
            )
            .map_err(sql("prepare forecast query"))?;
        let rows = statement
            .query_map(
                params![spot_id, format_timestamp(from), format_timestamp(to)],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .map_err(sql("query forecasts"))?;

        let mut records = Vec::new();
        for row in rows {
            let (timestamp, conditions) = row.map_err(sql("read forecast row"))?;
            records.push(ForecastRecord {
                timestamp_utc: parse_timestamp("forecasts.timestamp_utc", &timestamp)?,
                conditions: decode::<ForecastConditions>(&conditions, "decode forecast conditions")?,
            });
        }
        Ok(records)
    }

    fn read_spot(&self, spot_id: SpotId) -> Result<Option<Spot>, StoreError> {
        let connection = self.lock()?;
        let row = connection
            .query_row(
                "SELECT spot_id, spot_name, latitude, longitude, timezone, ideal_conditions
                 FROM spots WHERE spot_id = ?1",
                [spot_id],
                SpotRow::from_row,
            )
            .optional()
            .map_err(sql("query spot"))?;
        row.map(SpotRow::into_spot).transpose()
    }

    fn list_spots(&self) -> Result<Vec<Spot>, StoreError> {
        let connection = self.lock()?;
        let mut statement = connection
            .prepare_cached(
                "SELECT spot_id, spot_name, latitude, longitude, timezone, ideal_conditions
                 FROM spots ORDER BY spot_id",
            )
            .map_err(sql("prepare spot listing"))?;
        let rows = statement
            .query_map([], SpotRow::from_row)
            .map_err(sql("list spots"))?;
        let mut spots = Vec::new();
        for row in rows {
            spots.push(row.map_err(sql("read spot row"))?.into_spot()?);
        }
        Ok(spots)
    }

    fn delete_forecasts_older_than(&self, threshold: DateTime<Utc>) -> Result<usize, StoreError> {
        self.lock()?
            .execute(
                "DELETE FROM forecasts WHERE timestamp_utc < ?1",
                [format_timestamp(threshold)],
            )
            .map_err(sql("delete old forecasts"))
    }
}

impl UserStore for SqliteStore {
    fn list_active_user_presets(&self) -> Result<Vec<UserPresetConfig>, StoreError> {
        let connection = self.lock()?;
        let mut statement = connection
            .prepare_cached(
                "SELECT preset_id, user_id, name, spot_ids, start_time, end_time,
                        day_selection_type, day_selection_values
                 FROM (
                     SELECT *, ROW_NUMBER() OVER (
                         PARTITION BY user_id
                         ORDER BY is_default DESC, preset_id ASC
                     ) AS preset_rank
                     FROM user_presets
                     WHERE is_active = 1
                 )
                 WHERE preset_rank = 1
                 ORDER BY user_id",
            )
            .map_err(sql("prepare preset query"))?;
        let rows = statement
            .query_map([], PresetRow::from_row)
            .map_err(sql("query presets"))?;

        let mut presets = Vec::new();
        for row in rows {
            let raw = row.map_err(sql("read preset row"))?;
            let preset_id = raw.preset_id;
            match raw.into_preset() {
                Ok(preset) => presets.push(preset),
                Err(err) => warn!("skipping malformed preset {preset_id}: {err}"),
            }
        }
        Ok(presets)
    }

    fn read_user_profile_and_preferences(
        &self,
        user_id: &str,
    ) -> Result<(Option<UserProfile>, Vec<UserSpotPreference>), StoreError> {
        let connection = self.lock()?;
        let profile = connection
            .query_row(
                "SELECT user_id, surf_level FROM user_profiles WHERE user_id = ?1",
                [user_id],
                |row| {
                    let id: String = row.get(0)?;
                    let level: String = row.get(1)?;
                    Ok(UserProfile::new(id, SurfLevel::from_label(&level)))
                },
            )
            .optional()
            .map_err(sql("query user profile"))?;

        let mut statement = connection
            .prepare_cached(
                "SELECT spot_id, is_active, preferences FROM user_spot_preferences
                 WHERE user_id = ?1 ORDER BY preference_id",
            )
            .map_err(sql("prepare user preference query"))?;
        let rows = statement
            .query_map([user_id], |row| {
                Ok((
                    row.get::<_, SpotId>(0)?,
                    row.get::<_, bool>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(sql("query user preferences"))?;
        let mut preferences = Vec::new();
        for row in rows {
            let (spot_id, is_active, encoded) = row.map_err(sql("read user preference row"))?;
            preferences.push(UserSpotPreference {
                spot_id,
                is_active,
                overrides: decode(&encoded, "decode user preference")?,
            });
        }
        Ok((profile, preferences))
    }

    fn read_spot_level_preferences(
        &self,
        spot_id: SpotId,
        level: SurfLevel,
    ) -> Result<Option<PreferenceSet>, StoreError> {
        let connection = self.lock()?;
        let encoded: Option<String> = connection
            .query_row(
                "SELECT preferences FROM surf_level_preferences
                 WHERE spot_id = ?1 AND surf_level = ?2",
                params![spot_id, level.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(sql("query spot level preferences"))?;
        encoded
            .map(|text| decode(&text, "decode spot level preferences"))
            .transpose()
    }
}

impl CacheStore for SqliteStore {
    fn upsert_cache(
        &self,
        user_id: &str,
        cache_key: &str,
        payload: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.lock()?
            .execute(
                "INSERT INTO recommendation_cache (user_id, cache_key, payload, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (user_id, cache_key) DO UPDATE SET
                     payload = excluded.payload,
                     updated_at = excluded.updated_at",
                params![user_id, cache_key, payload, format_timestamp(updated_at)],
            )
            .map_err(sql("upsert recommendation cache"))?;
        Ok(())
    }

    fn read_cache(
        &self,
        user_id: &str,
        cache_key: &str,
    ) -> Result<Option<CachedPayload>, StoreError> {
        let connection = self.lock()?;
        let row: Option<(String, String)> = connection
            .query_row(
                "SELECT payload, updated_at FROM recommendation_cache
                 WHERE user_id = ?1 AND cache_key = ?2",
                [user_id, cache_key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(sql("query recommendation cache"))?;
        row.map(|(payload, updated_at)| {
            Ok(CachedPayload {
                payload,
                updated_at: parse_timestamp("recommendation_cache.updated_at", &updated_at)?,
            })
        })
        .transpose()
    }
}

struct SpotRow {
    id: SpotId,
    name: String,
    latitude: f64,
    longitude: f64,
    timezone: String,
    ideal_conditions: Option<String>,
}

impl SpotRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            latitude: row.get(2)?,
            longitude: row.get(3)?,
            timezone: row.get(4)?,
            ideal_conditions: row.get(5)?,
        })
    }

    fn into_spot(self) -> Result<Spot, StoreError> {
        let ideal_conditions = self
            .ideal_conditions
            .map(|text| decode(&text, "decode spot ideal conditions"))
            .transpose()?
            .unwrap_or_default();
        Ok(Spot {
            id: self.id,
            name: self.name,
            latitude: self.latitude,
            longitude: self.longitude,
            timezone: self.timezone,
            ideal_conditions,
        })
    }
}

struct PresetRow {
    preset_id: i64,
    user_id: String,
    name: String,
    spot_ids: String,
    start_time: String,
    end_time: String,
    selection_kind: String,
    selection_values: String,
}

impl PresetRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            preset_id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            spot_ids: row.get(3)?,
            start_time: row.get(4)?,
            end_time: row.get(5)?,
            selection_kind: row.get(6)?,
            selection_values: row.get(7)?,
        })
    }

    fn into_preset(self) -> Result<UserPresetConfig, StoreError> {
        let values: Vec<u32> = decode(&self.selection_values, "decode preset days")?;
        let day_selection = match self.selection_kind.as_str() {
            "offsets" => DaySelection::Offsets(values),
            "weekdays" => DaySelection::Weekdays(values),
            _ => {
                return Err(StoreError::InvalidValue {
                    column: "user_presets.day_selection_type",
                    value: self.selection_kind,
                });
            }
        };
        Ok(UserPresetConfig {
            preset_id: self.preset_id,
            user_id: self.user_id,
            name: self.name,
            spot_ids: decode(&self.spot_ids, "decode preset spots")?,
            start_time: parse_time_of_day("user_presets.start_time", &self.start_time)?,
            end_time: parse_time_of_day("user_presets.end_time", &self.end_time)?,
            day_selection,
        })
    }
}

fn parse_time_of_day(column: &'static str, text: &str) -> Result<NaiveTime, StoreError> {
    NaiveTime::parse_from_str(text, TIME_OF_DAY_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .map_err(|_| StoreError::InvalidValue {
            column,
            value: text.to_owned(),
        })
}

fn sql(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> StoreError {
    move |source| StoreError::backend(operation, source)
}

fn encode<T: Serialize + ?Sized>(value: &T, operation: &'static str) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|source| StoreError::Serialise { operation, source })
}

fn decode<T: DeserializeOwned>(text: &str, operation: &'static str) -> Result<T, StoreError> {
    serde_json::from_str(text).map_err(|source| StoreError::Serialise { operation, source })
}

/// Create the parent directory of `path` through an ambient `cap-std` handle.
fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) else {
        return Ok(());
    };
    let (base, relative) = if parent.is_absolute() {
        let root = parent.ancestors().last().unwrap_or(parent);
        (root, parent.strip_prefix(root).map_err(io::Error::other)?)
    } else {
        (Utf8Path::new("."), parent)
    };
    if relative.as_str().is_empty() {
        return Ok(());
    }
    fs_utf8::Dir::open_ambient_dir(base, ambient_authority())?.create_dir_all(relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use crate::{CardinalDirection, TideType};

    fn instant(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0)
            .single()
            .expect("valid instant")
    }

    fn time(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).expect("valid time")
    }

    fn record(day: u32, hour: u32, swell: f64) -> ForecastRecord {
        ForecastRecord::new(
            instant(day, hour),
            ForecastConditions {
                swell_height: Some(swell),
                tide_type: Some(TideType::Rising),
                ..ForecastConditions::default()
            },
        )
    }

    fn preset(id: i64, user: &str, name: &str) -> UserPresetConfig {
        UserPresetConfig {
            preset_id: id,
            user_id: user.to_owned(),
            name: name.to_owned(),
            spot_ids: vec![1, 2],
            start_time: time(6),
            end_time: time(18),
            day_selection: DaySelection::Offsets(vec![0, 1]),
        }
    }

    #[fixture]
    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().expect("open in-memory store")
    }

    #[rstest]
    fn forecast_upsert_overwrites_existing_hour(store: SqliteStore) {
        store
            .upsert_forecasts(1, &[record(1, 6, 1.0), record(1, 7, 1.1)], instant(1, 0))
            .expect("first upsert");
        store
            .upsert_forecasts(1, &[record(1, 6, 2.0)], instant(1, 1))
            .expect("second upsert");

        let stored = store
            .read_forecasts(1, instant(1, 0), instant(2, 0))
            .expect("read forecasts");
        assert_eq!(stored, vec![record(1, 6, 2.0), record(1, 7, 1.1)]);
    }

    #[rstest]
    fn forecast_range_is_half_open_and_per_spot(store: SqliteStore) {
        store
            .upsert_forecasts(1, &[record(1, 0, 1.0), record(2, 0, 1.0)], instant(1, 0))
            .expect("upsert spot 1");
        store
            .upsert_forecasts(2, &[record(1, 3, 1.0)], instant(1, 0))
            .expect("upsert spot 2");

        let stored = store
            .read_forecasts(1, instant(1, 0), instant(2, 0))
            .expect("read forecasts");
        assert_eq!(stored, vec![record(1, 0, 1.0)]);
    }

    #[rstest]
    fn retention_removes_only_older_rows(store: SqliteStore) {
        store
            .upsert_forecasts(1, &[record(1, 0, 1.0), record(3, 0, 1.0)], instant(1, 0))
            .expect("upsert");
        let removed = store
            .delete_forecasts_older_than(instant(2, 0))
            .expect("delete");
        assert_eq!(removed, 1);
        let remaining = store
            .read_forecasts(1, instant(1, 0), instant(1, 0) + Duration::days(7))
            .expect("read");
        assert_eq!(remaining, vec![record(3, 0, 1.0)]);
    }

    #[rstest]
    fn spots_round_trip_with_ideal_conditions(store: SqliteStore) {
        let ideal = PreferenceSet {
            ideal_swell_direction: Some(CardinalDirection::Ssw),
            ..PreferenceSet::default()
        };
        let spot = Spot::new(3, "Point Break", -23.0, -43.2)
            .with_timezone("America/Sao_Paulo")
            .with_ideal_conditions(ideal);
        store.upsert_spot(&spot).expect("upsert spot");
        store
            .upsert_spot(&Spot::new(1, "Beach", 0.0, 0.0))
            .expect("upsert spot");

        assert_eq!(store.read_spot(3).expect("read spot"), Some(spot));
        assert_eq!(store.read_spot(99).expect("read spot"), None);
        let ids: Vec<_> = store
            .list_spots()
            .expect("list spots")
            .into_iter()
            .map(|spot| spot.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[rstest]
    fn presets_prefer_default_then_lowest_id(store: SqliteStore) {
        store
            .upsert_preset(&preset(5, "alice", "late"), false, true)
            .expect("insert");
        store
            .upsert_preset(&preset(9, "alice", "weekend"), true, true)
            .expect("insert");
        store
            .upsert_preset(&preset(4, "bob", "dawn"), false, true)
            .expect("insert");
        store
            .upsert_preset(&preset(2, "bob", "old"), false, false)
            .expect("insert");
        store
            .upsert_preset(&preset(7, "bob", "lunch"), false, true)
            .expect("insert");

        let names: Vec<_> = store
            .list_active_user_presets()
            .expect("list presets")
            .into_iter()
            .map(|preset| (preset.user_id, preset.name))
            .collect();
        assert_eq!(
            names,
            vec![
                ("alice".to_owned(), "weekend".to_owned()),
                ("bob".to_owned(), "dawn".to_owned()),
            ]
        );
    }

    #[rstest]
    fn malformed_preset_rows_are_skipped(store: SqliteStore) {
        store
            .upsert_preset(&preset(1, "alice", "dawn"), true, true)
            .expect("insert");
        store
            .lock()
            .expect("lock")
            .execute(
                "INSERT INTO user_presets (preset_id, user_id, name, spot_ids, start_time,
                     end_time, day_selection_type, day_selection_values)
                 VALUES (2, 'bob', 'broken', '[1]', 'soon', '10:00', 'offsets', '[0]')",
                [],
            )
            .expect("insert malformed row");

        let presets = store.list_active_user_presets().expect("list presets");
        assert_eq!(presets, vec![preset(1, "alice", "dawn")]);
    }

    #[rstest]
    fn profile_and_preferences_keep_insertion_order(store: SqliteStore) {
        store
            .upsert_user_profile(&UserProfile::new("alice", SurfLevel::Advanced))
            .expect("profile");
        for wind in [3.0, 5.0] {
            store
                .insert_user_spot_preference(
                    "alice",
                    &UserSpotPreference {
                        spot_id: 1,
                        is_active: true,
                        overrides: PreferenceSet {
                            max_wind_speed: Some(wind),
                            ..PreferenceSet::default()
                        },
                    },
                )
                .expect("preference");
        }

        let (profile, prefs) = store
            .read_user_profile_and_preferences("alice")
            .expect("read user");
        assert_eq!(profile, Some(UserProfile::new("alice", SurfLevel::Advanced)));
        let winds: Vec<_> = prefs
            .iter()
            .map(|pref| pref.overrides.max_wind_speed)
            .collect();
        assert_eq!(winds, vec![Some(3.0), Some(5.0)]);

        let (missing, none) = store
            .read_user_profile_and_preferences("nobody")
            .expect("read missing user");
        assert!(missing.is_none());
        assert!(none.is_empty());
    }

    #[rstest]
    fn spot_level_preferences_are_keyed_by_level(store: SqliteStore) {
        let prefs = PreferenceSet {
            max_swell_height: Some(2.5),
            ..PreferenceSet::default()
        };
        store
            .upsert_spot_level_preferences(1, SurfLevel::Beginner, &prefs)
            .expect("upsert");
        assert_eq!(
            store
                .read_spot_level_preferences(1, SurfLevel::Beginner)
                .expect("read"),
            Some(prefs)
        );
        assert_eq!(
            store
                .read_spot_level_preferences(1, SurfLevel::Advanced)
                .expect("read"),
            None
        );
    }

    #[rstest]
    fn cache_upsert_keeps_one_row_per_key(store: SqliteStore) {
        store
            .upsert_cache("alice", "today", "[1]", instant(1, 0))
            .expect("first save");
        store
            .upsert_cache("alice", "today", "[2]", instant(1, 1))
            .expect("second save");

        let cached = store
            .read_cache("alice", "today")
            .expect("read cache")
            .expect("entry present");
        assert_eq!(cached.payload, "[2]");
        assert_eq!(cached.updated_at, instant(1, 1));
        let count: i64 = store
            .lock()
            .expect("lock")
            .query_row("SELECT COUNT(*) FROM recommendation_cache", [], |row| {
                row.get(0)
            })
            .expect("count rows");
        assert_eq!(count, 1);
    }

    #[rstest]
    fn open_creates_missing_parent_directories() {
        let dir = TempDir::new().expect("create temp dir");
        let path = camino::Utf8PathBuf::from_path_buf(dir.path().join("nested/deeper/swell.db"))
            .expect("utf-8 path");
        let store = SqliteStore::open(&path).expect("open store");
        store
            .upsert_spot(&Spot::new(1, "Beach", 0.0, 0.0))
            .expect("write");
        assert!(path.as_std_path().is_file());
    }
}
