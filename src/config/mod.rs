//! Application configuration
//!
//! Loaded once at startup from an optional `snaplink.toml` plus
//! `SNAPLINK_*` environment overrides. Every field has a default so a
//! bare process starts against local sqlite + local redis.

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub fast_store: FastStoreConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub sequence: SequenceConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub links: LinkConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Backend selector: "sea-orm" or "memory"
    #[serde(default = "default_database_backend")]
    pub backend: String,
    #[serde(default = "default_database_url")]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FastStoreConfig {
    /// Backend selector: "redis" or "memory"
    #[serde(default = "default_fast_store_backend")]
    pub backend: String,
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Per-call deadline; a hung store call must not pin a request thread
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
    #[serde(default = "default_cache_ttl")]
    pub default_ttl: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceConfig {
    #[serde(default = "default_counter_name")]
    pub counter_name: String,
    #[serde(default = "default_range_size")]
    pub range_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_requests")]
    pub max_requests: u64,
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_sync_interval")]
    pub interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    #[serde(default = "default_expiry_days")]
    pub default_expiry_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
}

impl AppConfig {
    /// Load configuration, falling back to defaults on any error so a
    /// misconfigured file cannot keep the process from starting.
    pub fn load() -> Self {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("snaplink").required(false))
            .add_source(config::Environment::with_prefix("SNAPLINK").separator("__"));

        match builder.build().and_then(|c| c.try_deserialize()) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load configuration, using defaults: {}", e);
                AppConfig::default()
            }
        }
    }
}

fn default_database_backend() -> String {
    "sea-orm".to_string()
}

fn default_database_url() -> String {
    "sqlite://snaplink.db?mode=rwc".to_string()
}

fn default_fast_store_backend() -> String {
    "redis".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".to_string()
}

fn default_command_timeout_ms() -> u64 {
    500
}

fn default_cache_capacity() -> u64 {
    10_000
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_counter_name() -> String {
    "url_sequence".to_string()
}

fn default_range_size() -> u64 {
    100
}

fn default_max_requests() -> u64 {
    10
}

fn default_window_seconds() -> u64 {
    60
}

fn default_sync_interval() -> u64 {
    30
}

fn default_expiry_days() -> i64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_enable_rotation() -> bool {
    false
}

fn default_max_backups() -> u32 {
    7
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: default_database_backend(),
            url: default_database_url(),
        }
    }
}

impl Default for FastStoreConfig {
    fn default() -> Self {
        Self {
            backend: default_fast_store_backend(),
            url: default_redis_url(),
            command_timeout_ms: default_command_timeout_ms(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_cache_capacity(),
            default_ttl: default_cache_ttl(),
        }
    }
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            counter_name: default_counter_name(),
            range_size: default_range_size(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_seconds: default_window_seconds(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_sync_interval(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            default_expiry_days: default_expiry_days(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            enable_rotation: default_enable_rotation(),
            max_backups: default_max_backups(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.sequence.range_size, 100);
        assert_eq!(config.sequence.counter_name, "url_sequence");
        assert_eq!(config.rate_limit.max_requests, 10);
        assert_eq!(config.links.default_expiry_days, 30);
        assert_eq!(config.fast_store.backend, "redis");
    }

    #[test]
    fn test_deserialize_partial() {
        let raw = r#"{"sequence": {"range_size": 500}}"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.sequence.range_size, 500);
        // untouched sections keep their defaults
        assert_eq!(config.rate_limit.window_seconds, 60);
    }
}
