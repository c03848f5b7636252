//! Error types raised while computing recommendations.

use swellcheck_core::{PresetError, StoreError};
use thiserror::Error;

/// Errors raised while computing or caching recommendations.
#[derive(Debug, Error)]
pub enum RecommendationError {
    /// The active presets could not be listed.
    #[error("failed to list active presets")]
    ListPresets {
        /// Source error from the store.
        #[source]
        source: StoreError,
    },
    /// The configuration cannot drive a run.
    #[error("configuration {cache_key:?} for user {user_id} is invalid")]
    InvalidConfig {
        /// Owner of the configuration.
        user_id: String,
        /// Cache key of the configuration.
        cache_key: String,
        /// Validation failure.
        #[source]
        source: PresetError,
    },
    /// A store read or write failed.
    #[error("failed to {operation} for user {user_id}")]
    Store {
        /// Description of the failed operation.
        operation: &'static str,
        /// User whose run was affected.
        user_id: String,
        /// Source error from the store.
        #[source]
        source: StoreError,
    },
    /// A blocking worker task did not complete.
    #[error("recommendation task for user {user_id} failed: {message}")]
    Task {
        /// User whose run was affected.
        user_id: String,
        /// Join error description.
        message: String,
    },
}

impl RecommendationError {
    /// User the failure belongs to, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::ListPresets { .. } => None,
            Self::InvalidConfig { user_id, .. }
            | Self::Store { user_id, .. }
            | Self::Task { user_id, .. } => Some(user_id),
        }
    }
}
