//! Tracing subscriber setup for the admin binary.

use crate::config::LoggingConfig;
use crate::error::{ClientError, ClientResult};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter from `RUST_LOG` when set, else from the configured level.
pub fn env_filter(config: &LoggingConfig) -> ClientResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| ClientError::Logging(format!("invalid level {:?}: {}", config.level, e))),
    }
}

/// Install the global subscriber. Call once at start-up.
pub fn init_tracing(config: &LoggingConfig) -> ClientResult<()> {
    let filter = env_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    result.map_err(|e| ClientError::Logging(format!("Failed to init subscriber: {}", e)))
}
