//! Error types for the normcache interceptor.

use crate::types::{CacheKey, RequestId};
use thiserror::Error;

/// The cache had no usable data for an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheMissError {
    #[error("Record not found: {0}")]
    RecordNotFound(CacheKey),

    #[error("Missing field '{field}' on record {key}")]
    FieldNotFound { key: CacheKey, field: String },

    #[error("Unexpected value for field '{field}' on record {key}: {reason}")]
    Incomplete {
        key: CacheKey,
        field: String,
        reason: String,
    },
}

/// Transport or decode failure reported by the network side.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Transport completed without emitting a response")]
    NoResponse,
}

/// Outcome of a failed fetch attempt.
///
/// `Composite` is only produced when a policy tried two sources and both failed;
/// `primary` is the source tried first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Cache miss: {0}")]
    CacheMiss(#[from] CacheMissError),

    #[error("Network failure: {0}")]
    Network(#[from] NetworkError),

    #[error("All sources failed: {primary}; then: {secondary}")]
    Composite {
        primary: Box<FetchError>,
        secondary: Box<FetchError>,
    },
}

impl FetchError {
    pub fn composite(primary: FetchError, secondary: FetchError) -> Self {
        FetchError::Composite {
            primary: Box::new(primary),
            secondary: Box::new(secondary),
        }
    }

    pub fn is_cache_miss(&self) -> bool {
        matches!(self, FetchError::CacheMiss(_))
    }

    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::Network(_))
    }
}

/// Store-side failures that are not cache misses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Data does not match selection at '{path}': {reason}")]
    ShapeMismatch { path: String, reason: String },

    #[error("Optimistic layer already staged for request {0}")]
    OptimisticLayerExists(RequestId),
}

/// Set-up errors (configuration loading, logging initialisation)
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Logging error: {0}")]
    LoggingError(String),

    #[error("Client is missing a {0}")]
    MissingComponent(&'static str),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
