//! Error types emitted by the swellcheck CLI.
//!
//! Failures inside a worker cycle are contained and reported by the cycle
//! itself; only setup problems surface here.

use std::sync::Arc;

use camino::Utf8PathBuf;
use swellcheck_core::StoreError;
use swellcheck_data::SourceBuildError;
use thiserror::Error;

/// Errors emitted by the swellcheck CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// An option was supplied with a value the worker cannot use.
    #[error("invalid {field}: {reason}")]
    InvalidArgument {
        field: &'static str,
        reason: &'static str,
    },
    /// The requested operation requires a missing compile-time feature.
    #[error("{action} requires the `{feature}` feature to be enabled")]
    MissingFeature {
        feature: &'static str,
        action: &'static str,
    },
    /// Opening the forecast database failed.
    #[error("failed to open database at {path:?}: {source}")]
    OpenStore {
        path: Utf8PathBuf,
        #[source]
        source: StoreError,
    },
    /// Constructing the marine data client failed.
    #[error("failed to build marine data client for {weather_url:?}: {source}")]
    BuildSource {
        weather_url: String,
        #[source]
        source: SourceBuildError,
    },
    /// The async runtime could not be started.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}
