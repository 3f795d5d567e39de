//! Runtime configuration.
//!
//! Configuration is resolved once at startup and passed into the resolver and
//! cache. Nothing here is read from the environment while a resolution pass
//! is running.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resolver::fields::FieldAliases;

/// Cache key used when none is configured.
pub const DEFAULT_CACHE_KEY: &str = "demand.lastResolution";

const DEFAULT_SUGGESTION_LIMIT: usize = 3;
const DEFAULT_SUGGESTION_THRESHOLD: f64 = 0.80;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Resolver settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Alias keys for loosely-typed backend records
    pub aliases: FieldAliases,
    /// Maximum number of suggestions recorded for an unmatched line
    pub suggestion_limit: usize,
    /// Minimum similarity (0.0 - 1.0) for a suggestion
    pub suggestion_threshold: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            aliases: FieldAliases::default(),
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            suggestion_threshold: DEFAULT_SUGGESTION_THRESHOLD,
        }
    }
}

impl ResolverConfig {
    /// Parse from JSON. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: ResolverConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !(0.0..=1.0).contains(&self.suggestion_threshold) {
            return Err(ConfigError::InvalidInput(format!(
                "suggestion_threshold must be within 0.0..=1.0, got {}",
                self.suggestion_threshold
            )));
        }
        if self.aliases.medicine_name.is_empty() {
            return Err(ConfigError::InvalidInput(
                "aliases.medicine_name cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Location and key of the durable result cache.
#[derive(Clone, Debug)]
pub struct CacheConfig {
    path: PathBuf,
    cache_key: String,
}

impl CacheConfig {
    pub fn new(path: PathBuf, cache_key: String) -> ConfigResult<Self> {
        if cache_key.trim().is_empty() {
            return Err(ConfigError::InvalidInput("cache_key cannot be empty".into()));
        }
        Ok(Self { path, cache_key })
    }

    /// Cache at `path` under [`DEFAULT_CACHE_KEY`].
    pub fn with_default_key(path: PathBuf) -> Self {
        Self {
            path,
            cache_key: DEFAULT_CACHE_KEY.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }
}

/// Parse an optional cache key value, falling back to [`DEFAULT_CACHE_KEY`] when blank.
pub fn cache_key_from_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_CACHE_KEY.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_to_missing_keys() {
        let config = ResolverConfig::from_json_str(r#"{"suggestion_limit": 5}"#).unwrap();
        assert_eq!(config.suggestion_limit, 5);
        assert_eq!(config.suggestion_threshold, DEFAULT_SUGGESTION_THRESHOLD);
        assert_eq!(config.aliases, FieldAliases::default());
    }

    #[test]
    fn test_partial_alias_override() {
        let config =
            ResolverConfig::from_json_str(r#"{"aliases": {"inventory": ["stock"]}}"#).unwrap();
        assert_eq!(config.aliases.inventory, vec!["stock".to_string()]);
        assert_eq!(config.aliases.id, FieldAliases::default().id);
    }

    #[test]
    fn test_threshold_out_of_range_is_rejected() {
        let err = ResolverConfig::from_json_str(r#"{"suggestion_threshold": 1.5}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidInput(_)));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let err = ResolverConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_cache_config_rejects_blank_key() {
        assert!(CacheConfig::new(PathBuf::from("cache.db"), "  ".into()).is_err());
        let config = CacheConfig::with_default_key(PathBuf::from("cache.db"));
        assert_eq!(config.cache_key(), DEFAULT_CACHE_KEY);
    }

    #[test]
    fn test_cache_key_from_value() {
        assert_eq!(cache_key_from_value(None), DEFAULT_CACHE_KEY);
        assert_eq!(cache_key_from_value(Some("   ".into())), DEFAULT_CACHE_KEY);
        assert_eq!(cache_key_from_value(Some(" demo ".into())), "demo");
    }
}
