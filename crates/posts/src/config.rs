//! Configuration for the post service.

use std::time::Duration;

use postpigeon_authn::namespace_from_seed;
use postpigeon_storage::ConfigError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache::{self, CacheConfig};

/// Environment variable holding the namespace seed.
pub const NAMESPACE_ENV: &str = "POST_PIGEON_NS";

/// Minimum reaper interval.
pub const MIN_REAPER_INTERVAL: Duration = Duration::from_secs(1);

/// Settings for [`PostManager`](crate::PostManager) and [`Reaper`](crate::Reaper).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use postpigeon_posts::PostsConfig;
///
/// let config = PostsConfig::builder()
///     .namespace("post-pigeon-namespace")
///     .reaper_interval(Duration::from_secs(60))
///     .build();
/// config.validate().unwrap();
/// assert_eq!(config.cache_capacity, 10_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, bon::Builder, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostsConfig {
    /// Seed of the content identifier namespace: a UUID, or text of at least 16 bytes.
    #[builder(into)]
    pub namespace: String,

    /// Maximum number of cached posts.
    #[serde(default = "default_cache_capacity")]
    #[builder(default = default_cache_capacity())]
    pub cache_capacity: u64,

    /// Upper bound on how long a post stays cached.
    #[serde(with = "humantime_serde", default = "default_cache_ttl")]
    #[builder(default = default_cache_ttl())]
    pub cache_ttl: Duration,

    /// Delay between expired-post sweeps.
    #[serde(with = "humantime_serde", default = "default_reaper_interval")]
    #[builder(default = default_reaper_interval())]
    pub reaper_interval: Duration,

    /// Largest accepted post body in bytes.
    #[serde(default = "default_max_body_bytes")]
    #[builder(default = default_max_body_bytes())]
    pub max_body_bytes: usize,
}

fn default_cache_capacity() -> u64 {
    cache::DEFAULT_MAX_ENTRIES
}

fn default_cache_ttl() -> Duration {
    cache::DEFAULT_TTL
}

fn default_reaper_interval() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_max_body_bytes() -> usize {
    crate::manager::DEFAULT_MAX_BODY_BYTES
}

impl PostsConfig {
    /// Reads the configuration from the process environment.
    ///
    /// Only the namespace is read; every other field takes its default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if `POST_PIGEON_NS` is unset or
    /// empty, or any error from [`validate`](Self::validate).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let namespace = lookup(NAMESPACE_ENV)
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::Missing { field: "namespace" })?;
        let config = Self::builder().namespace(namespace).build();
        config.validate()?;
        Ok(config)
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.namespace_uuid()?;
        self.cache_config()?;
        if self.reaper_interval < MIN_REAPER_INTERVAL {
            return Err(ConfigError::BelowMinimum {
                field: "reaper_interval",
                value: format!("{}ms", self.reaper_interval.as_millis()),
                min: "1s".to_owned(),
            });
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "max_body_bytes",
                value: "0".to_owned(),
                min: "1".to_owned(),
            });
        }
        Ok(())
    }

    /// The content identifier namespace.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a seed that is neither a UUID nor
    /// 16 bytes long.
    pub fn namespace_uuid(&self) -> Result<Uuid, ConfigError> {
        namespace_from_seed(&self.namespace)
    }

    /// The content cache settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BelowMinimum`] for a zero capacity or a TTL
    /// under one second.
    pub fn cache_config(&self) -> Result<CacheConfig, ConfigError> {
        CacheConfig::builder().max_entries(self.cache_capacity).ttl(self.cache_ttl).build()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const SEED: &str = "post-pigeon-namespace";

    #[test]
    fn test_builder_defaults() {
        let config = PostsConfig::builder().namespace(SEED).build();
        assert_eq!(config.cache_capacity, 10_000);
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.reaper_interval, Duration::from_secs(300));
        assert_eq!(config.max_body_bytes, 15_000);
        config.validate().unwrap();
    }

    #[test]
    fn test_deserialize_humantime_durations() {
        let json = r#"{"namespace":"post-pigeon-namespace","cache_ttl":"10m","reaper_interval":"30s"}"#;
        let config: PostsConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.cache_ttl, Duration::from_secs(600));
        assert_eq!(config.reaper_interval, Duration::from_secs(30));
        assert_eq!(config.cache_capacity, 10_000);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let json = r#"{"namespace":"post-pigeon-namespace","cache_size":5}"#;
        assert!(serde_json::from_str::<PostsConfig>(json).is_err());
    }

    #[test]
    fn test_namespace_required() {
        assert!(serde_json::from_str::<PostsConfig>("{}").is_err());

        let err = PostsConfig::from_lookup(|_| None).unwrap_err();
        assert_eq!(err, ConfigError::Missing { field: "namespace" });

        let err = PostsConfig::from_lookup(|_| Some(String::new())).unwrap_err();
        assert_eq!(err, ConfigError::Missing { field: "namespace" });
    }

    #[test]
    fn test_from_lookup_reads_namespace() {
        let env = HashMap::from([(NAMESPACE_ENV, SEED.to_owned())]);
        let config = PostsConfig::from_lookup(|name| env.get(name).cloned()).unwrap();
        assert_eq!(config.namespace_uuid().unwrap().to_string(), "706f7374-2d70-6967-656f-6e2d6e616d65");
    }

    #[test]
    fn test_validation_names_field() {
        let short = PostsConfig::builder().namespace("short").build();
        assert!(matches!(short.validate(), Err(ConfigError::Invalid { field: "namespace", .. })));

        let config = PostsConfig::builder().namespace(SEED).cache_capacity(0).build();
        assert!(matches!(config.validate(), Err(ConfigError::BelowMinimum { field: "max_entries", .. })));

        let config = PostsConfig::builder().namespace(SEED).reaper_interval(Duration::from_millis(10)).build();
        assert!(matches!(config.validate(), Err(ConfigError::BelowMinimum { field: "reaper_interval", .. })));

        let config = PostsConfig::builder().namespace(SEED).max_body_bytes(0).build();
        assert!(matches!(config.validate(), Err(ConfigError::BelowMinimum { field: "max_body_bytes", .. })));
    }
}
