//! Configuration loading with hierarchical merging.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid worker_count: {0}. Must be between 1 and 64")]
    InvalidWorkerCount(usize),

    #[error("invalid queue_capacity: {0}. Must be at least 1")]
    InvalidQueueCapacity(usize),

    #[error("invalid max_requests_per_second: {0}. Must be at least 1")]
    InvalidRateLimit(usize),

    #[error("database path cannot be empty")]
    EmptyDatabasePath,

    #[error("invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("invalid ai provider: {0}. Must be one of: gemini, openai")]
    InvalidProvider(String),
}

/// Loads the configuration tree.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. `stylecast.yaml` in the working directory
    /// 3. Environment variables (`STYLECAST_*`, `__` as section separator)
    pub fn load() -> Result<Config> {
        Self::load_from(Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file("stylecast.yaml"))
            .merge(Env::prefixed("STYLECAST_").split("__")))
    }

    /// Load configuration from a specific file plus environment overrides.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        Self::load_from(Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("STYLECAST_").split("__")))
    }

    fn load_from(figment: Figment) -> Result<Config> {
        let config: Config =
            figment.extract().context("Failed to extract configuration from figment")?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.match_pool.worker_count == 0 || config.match_pool.worker_count > 64 {
            return Err(ConfigError::InvalidWorkerCount(config.match_pool.worker_count));
        }
        if config.match_pool.queue_capacity == 0 {
            return Err(ConfigError::InvalidQueueCapacity(config.match_pool.queue_capacity));
        }
        if config.rate_limit.max_requests_per_second == 0 {
            return Err(ConfigError::InvalidRateLimit(config.rate_limit.max_requests_per_second));
        }
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }

        let provider = config.ai.provider.trim().to_lowercase();
        if provider != "gemini" && provider != "openai" {
            return Err(ConfigError::InvalidProvider(config.ai.provider.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let mut config = Config::default();
        config.ai.provider = "claude".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidProvider(_))
        ));
    }

    #[test]
    fn test_rejects_zero_workers() {
        let mut config = Config::default();
        config.match_pool.worker_count = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidWorkerCount(0))
        ));
    }
}
