//! Configuration loading for the Divvy admin client.
//!
//! Connection and auth fields are required. Cache, pagination and logging
//! sections fall back to defaults when omitted.

use divvy_cache::{CacheConfig, DEFAULT_CAPACITY};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable holding the config path when `--config` is absent.
pub const CONFIG_ENV: &str = "DIVVY_ADMIN_CONFIG";

/// Default page size for paginated domains.
pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdminConfig {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    pub auth: AuthConfig,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub api_key: Option<String>,
    pub jwt: Option<String>,
}

/// Eviction capacity of each domain cache.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CacheSettings {
    pub activity: usize,
    pub balances: usize,
    pub expenses: usize,
    pub groups: usize,
    pub users: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            activity: DEFAULT_CAPACITY,
            balances: DEFAULT_CAPACITY,
            expenses: DEFAULT_CAPACITY,
            groups: DEFAULT_CAPACITY,
            users: DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PaginationConfig {
    pub page_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `divvy_cache=debug,info`.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or DIVVY_ADMIN_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl AdminConfig {
    /// Load from `--config <path>` or `DIVVY_ADMIN_CONFIG`, then validate.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args(std::env::args().skip(1)).or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: AdminConfig = toml::from_str(contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.api_base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must start with http:// or https://".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        let has_api_key = self.auth.api_key.as_deref().is_some_and(|key| !key.trim().is_empty());
        let has_jwt = self.auth.jwt.as_deref().is_some_and(|jwt| !jwt.trim().is_empty());
        if !has_api_key && !has_jwt {
            return Err(ConfigError::InvalidValue {
                field: "auth",
                reason: "api_key or jwt must be provided".to_string(),
            });
        }
        for (field, capacity) in [
            ("cache.activity", self.cache.activity),
            ("cache.balances", self.cache.balances),
            ("cache.expenses", self.cache.expenses),
            ("cache.groups", self.cache.groups),
            ("cache.users", self.cache.users),
        ] {
            if capacity == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be > 0".to_string(),
                });
            }
        }
        if self.pagination.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pagination.page_size",
                reason: "must be > 0".to_string(),
            });
        }
        if let Err(err) = tracing_subscriber::EnvFilter::try_new(&self.logging.level) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level",
                reason: err.to_string(),
            });
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim().trim_end_matches('/')
    }

    /// Cache config for a domain with the given capacity. Paginated domains
    /// fetch pages of the configured size by default.
    pub fn cache_config(&self, capacity: usize, paginated: bool) -> CacheConfig {
        let config = CacheConfig::new().with_capacity(capacity);
        if paginated {
            config.with_default_limit(self.pagination.page_size)
        } else {
            config
        }
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_ENV).ok().map(PathBuf::from)
}

/// The value following `--config`, if present.
pub fn config_path_from_args(args: impl IntoIterator<Item = String>) -> Option<PathBuf> {
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}
