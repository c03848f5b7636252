//! Marine data sources.
//!
//! [`MarineDataSource`] is the seam between the refresh job and the weather
//! provider. [`HttpMarineSource`] talks to a Stormglass-style HTTP API: one
//! endpoint for point weather and one for sea level, both authorised with an
//! API key in the `Authorization` header.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use chrono::{TimeDelta, Utc};
//! use swellcheck_data::{FetchRequest, HttpMarineSource, HttpMarineSourceConfig, MarineDataSource};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpMarineSourceConfig::default()
//!     .with_timeout(Duration::from_secs(10))
//!     .with_user_agent("swell-report/1.0");
//! let source = HttpMarineSource::with_config(config)?;
//! let start = Utc::now();
//! let request = FetchRequest::new(-23.0, -43.2, start, start + TimeDelta::days(7), "key");
//! let weather = source.fetch_weather(&request).await?;
//! println!("{weather}");
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, header::AUTHORIZATION};
use serde_json::Value;
use thiserror::Error;

use crate::merge::WEATHER_PARAMETERS;

/// Default user agent for provider requests.
pub const DEFAULT_USER_AGENT: &str = "swellcheck/0.1";

/// Default point-weather endpoint.
pub const DEFAULT_WEATHER_URL: &str = "https://api.stormglass.io/v2/weather/point";

/// Default sea-level endpoint.
pub const DEFAULT_SEA_LEVEL_URL: &str = "https://api.stormglass.io/v2/tide/sea-level/point";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Errors raised when a provider payload cannot be obtained.
///
/// Every variant means the source is unavailable for this request; callers
/// skip the affected spot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The request exceeded its timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Endpoint that was called.
        url: String,
        /// Configured timeout.
        timeout_secs: u64,
    },
    /// The provider answered with a non-success status.
    #[error("request to {url} failed with status {status}: {message}")]
    Http {
        /// Endpoint that was called.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
    },
    /// The request failed before a response arrived.
    #[error("network error calling {url}: {message}")]
    Network {
        /// Endpoint that was called.
        url: String,
        /// Error description.
        message: String,
    },
    /// The response body was not JSON.
    #[error("invalid JSON from {url}: {message}")]
    Decode {
        /// Endpoint that was called.
        url: String,
        /// Error description.
        message: String,
    },
    /// The request carried no API key.
    #[error("no API key supplied for the provider request")]
    MissingApiKey,
}

/// Error raised when building an [`HttpMarineSource`].
#[derive(Debug, Error)]
#[error("failed to build HTTP client")]
pub struct SourceBuildError(#[from] reqwest::Error);

/// Location, window and credentials for one provider fetch.
#[derive(Clone, PartialEq)]
pub struct FetchRequest {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Window start.
    pub start: DateTime<Utc>,
    /// Window end.
    pub end: DateTime<Utc>,
    /// Provider API key.
    pub api_key: String,
}

impl FetchRequest {
    /// Construct a request.
    #[must_use]
    pub fn new(
        latitude: f64,
        longitude: f64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            latitude,
            longitude,
            start,
            end,
            api_key: api_key.into(),
        }
    }

    fn window_query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("lat", self.latitude.to_string()),
            ("lng", self.longitude.to_string()),
            ("start", self.start.timestamp().to_string()),
            ("end", self.end.timestamp().to_string()),
        ]
    }
}

impl fmt::Debug for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchRequest")
            .field("latitude", &self.latitude)
            .field("longitude", &self.longitude)
            .field("start", &self.start)
            .field("end", &self.end)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Asynchronous source of raw provider payloads.
#[async_trait]
pub trait MarineDataSource: Send + Sync {
    /// Fetch the hourly weather payload (`{"hours": [...]}`).
    ///
    /// # Errors
    /// Returns [`SourceError`] when the payload cannot be obtained.
    async fn fetch_weather(&self, request: &FetchRequest) -> Result<Value, SourceError>;

    /// Fetch the sea-level payload (`{"data": [...]}`).
    ///
    /// # Errors
    /// Returns [`SourceError`] when the payload cannot be obtained.
    async fn fetch_sea_level(&self, request: &FetchRequest) -> Result<Value, SourceError>;
}

/// Configuration for [`HttpMarineSource`].
#[derive(Debug, Clone)]
pub struct HttpMarineSourceConfig {
    /// Point-weather endpoint.
    pub weather_url: String,
    /// Sea-level endpoint.
    pub sea_level_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpMarineSourceConfig {
    fn default() -> Self {
        Self {
            weather_url: DEFAULT_WEATHER_URL.to_owned(),
            sea_level_url: DEFAULT_SEA_LEVEL_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpMarineSourceConfig {
    /// Create a configuration for the given endpoints.
    #[must_use]
    pub fn new(weather_url: impl Into<String>, sea_level_url: impl Into<String>) -> Self {
        Self {
            weather_url: weather_url.into(),
            sea_level_url: sea_level_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// HTTP marine data source.
#[derive(Debug, Clone)]
pub struct HttpMarineSource {
    client: Client,
    config: HttpMarineSourceConfig,
}

impl HttpMarineSource {
    /// Create a source with the default endpoints.
    ///
    /// # Errors
    /// Returns an error if the HTTP client fails to build.
    pub fn new() -> Result<Self, SourceBuildError> {
        Self::with_config(HttpMarineSourceConfig::default())
    }

    /// Create a source with explicit configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client fails to build.
    pub fn with_config(config: HttpMarineSourceConfig) -> Result<Self, SourceBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &HttpMarineSourceConfig {
        &self.config
    }

    async fn fetch(
        &self,
        url: &str,
        query: &[(&'static str, String)],
        api_key: &str,
    ) -> Result<Value, SourceError> {
        if api_key.trim().is_empty() {
            return Err(SourceError::MissingApiKey);
        }
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, api_key)
            .query(query)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, url))?;

        response.json().await.map_err(|err| SourceError::Decode {
            url: url.to_owned(),
            message: err.to_string(),
        })
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> SourceError {
        if error.is_timeout() {
            return SourceError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return SourceError::Http {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        SourceError::Network {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }
}

/// Query for the weather endpoint: the window plus the requested quantities.
fn weather_query(request: &FetchRequest) -> Vec<(&'static str, String)> {
    let mut query = request.window_query();
    query.push(("params", WEATHER_PARAMETERS.join(",")));
    query
}

#[async_trait]
impl MarineDataSource for HttpMarineSource {
    async fn fetch_weather(&self, request: &FetchRequest) -> Result<Value, SourceError> {
        self.fetch(
            &self.config.weather_url,
            &weather_query(request),
            &request.api_key,
        )
        .await
    }

    async fn fetch_sea_level(&self, request: &FetchRequest) -> Result<Value, SourceError> {
        self.fetch(
            &self.config.sea_level_url,
            &request.window_query(),
            &request.api_key,
        )
        .await
    }
}
