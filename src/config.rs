//! Configuration System
//!
//! Process-wide settings for the cache client: the cache write mode, default
//! policies applied to requests that do not set their own, and logging. Loaded from
//! layered sources with environment overrides and validated as a whole.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::policy::{CacheFlags, FetchPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;

mod loader;
mod merge;
mod sources;

pub use loader::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormcacheConfig {
    /// Cache behaviour
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Cache behaviour shared by every request of a client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Run cache writes on a background task instead of before emission
    #[serde(default)]
    pub write_to_cache_asynchronously: bool,

    /// Fetch policy for requests that do not set one
    #[serde(default)]
    pub default_fetch_policy: FetchPolicy,

    /// Refetch policy for requests that do not set one; unset means no watching
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_refetch_policy: Option<FetchPolicy>,

    /// Store responses that carry GraphQL errors
    #[serde(default)]
    pub store_partial_responses: bool,
}

impl CacheConfig {
    /// Store flags every request starts with
    pub fn default_flags(&self) -> CacheFlags {
        if self.store_partial_responses {
            CacheFlags::STORE_PARTIAL_RESPONSE
        } else {
            CacheFlags::NONE
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Cache(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Cache(msg) => write!(f, "Cache: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl NormcacheConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        // A watch that refetches from the network on every cache change would
        // trigger itself through its own writes.
        if matches!(
            self.cache.default_refetch_policy,
            Some(FetchPolicy::NetworkOnly)
        ) && self.cache.write_to_cache_asynchronously
        {
            errors.push(ValidationError::Cache(
                "default_refetch_policy = network_only cannot be combined with asynchronous writes"
                    .to_string(),
            ));
        }

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Load, then validate, reporting every problem at once
    pub fn load_validated(workspace_root: &Path) -> Result<Self, ApiError> {
        let config = ConfigLoader::load(workspace_root)?;
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(config)
    }

    /// Serialize as TOML, e.g. to seed a config file
    pub fn to_toml_string(&self) -> Result<String, ApiError> {
        toml::to_string_pretty(self)
            .map_err(|e| ApiError::ConfigError(format!("Failed to serialize config: {}", e)))
    }

    /// Write this configuration to `path`, creating parent directories
    pub fn write_to(&self, path: &Path) -> Result<(), ApiError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}
