//! Test utilities for marine data sources.
//!
//! [`StubMarineSource`] is a deterministic double for [`MarineDataSource`]
//! that returns pre-configured payloads without making HTTP requests.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};

use crate::source::{FetchRequest, MarineDataSource, SourceError};

type Location = (u64, u64);

fn location(latitude: f64, longitude: f64) -> Location {
    (latitude.to_bits(), longitude.to_bits())
}

#[derive(Debug, Clone)]
enum StubResponse {
    Payloads { weather: Value, sea_level: Value },
    Error(SourceError),
}

/// Stub `MarineDataSource` for testing.
///
/// Responses are chosen by the request's coordinates, falling back to a
/// default response. Every request is recorded.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use swellcheck_data::{FetchRequest, MarineDataSource};
/// use swellcheck_data::test_support::{StubMarineSource, sea_level_payload, weather_payload};
///
/// let hour = Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).single().expect("valid instant");
/// let source = StubMarineSource::with_payloads(
///     weather_payload(&[hour], 1.5),
///     sea_level_payload(&[(hour, 0.8)]),
/// );
/// let request = FetchRequest::new(0.0, 0.0, hour, hour, "key");
/// let weather = tokio::runtime::Builder::new_current_thread()
///     .build()
///     .expect("runtime")
///     .block_on(source.fetch_weather(&request));
/// assert!(weather.is_ok());
/// ```
#[derive(Debug)]
pub struct StubMarineSource {
    default: StubResponse,
    by_location: HashMap<Location, StubResponse>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl StubMarineSource {
    /// Source returning the given payloads for every location.
    #[must_use]
    pub fn with_payloads(weather: Value, sea_level: Value) -> Self {
        Self::from_default(StubResponse::Payloads { weather, sea_level })
    }

    /// Source failing every request with `error`.
    #[must_use]
    pub fn with_error(error: SourceError) -> Self {
        Self::from_default(StubResponse::Error(error))
    }

    fn from_default(default: StubResponse) -> Self {
        Self {
            default,
            by_location: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Return specific payloads for one location.
    #[must_use]
    pub fn with_location_payloads(
        mut self,
        latitude: f64,
        longitude: f64,
        weather: Value,
        sea_level: Value,
    ) -> Self {
        self.by_location.insert(
            location(latitude, longitude),
            StubResponse::Payloads { weather, sea_level },
        );
        self
    }

    /// Fail requests for one location with `error`.
    #[must_use]
    pub fn failing_for(mut self, latitude: f64, longitude: f64, error: SourceError) -> Self {
        self.by_location
            .insert(location(latitude, longitude), StubResponse::Error(error));
        self
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn respond(&self, request: &FetchRequest) -> &StubResponse {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        self.by_location
            .get(&location(request.latitude, request.longitude))
            .unwrap_or(&self.default)
    }
}

#[async_trait]
impl MarineDataSource for StubMarineSource {
    async fn fetch_weather(&self, request: &FetchRequest) -> Result<Value, SourceError> {
        match self.respond(request) {
            StubResponse::Payloads { weather, .. } => Ok(weather.clone()),
            StubResponse::Error(error) => Err(error.clone()),
        }
    }

    async fn fetch_sea_level(&self, request: &FetchRequest) -> Result<Value, SourceError> {
        match self.respond(request) {
            StubResponse::Payloads { sea_level, .. } => Ok(sea_level.clone()),
            StubResponse::Error(error) => Err(error.clone()),
        }
    }
}

fn provider_time(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Weather payload with one entry per hour and a constant swell height.
#[must_use]
pub fn weather_payload(hours: &[DateTime<Utc>], swell_height: f64) -> Value {
    let entries: Vec<Value> = hours
        .iter()
        .map(|hour| {
            json!({
                "time": provider_time(*hour),
                "swellHeight": {"sg": swell_height},
                "windSpeed": {"sg": 3.0},
            })
        })
        .collect();
    json!({ "hours": entries })
}

/// Sea-level payload with the given levels.
#[must_use]
pub fn sea_level_payload(levels: &[(DateTime<Utc>, f64)]) -> Value {
    let entries: Vec<Value> = levels
        .iter()
        .map(|(hour, level)| json!({"time": provider_time(*hour), "sg": level}))
        .collect();
    json!({ "data": entries })
}
