//! Error types for the admin client.

use crate::config::ConfigError;
use divvy_core::LoadError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid value for header {header}: {reason}")]
    InvalidHeader { header: &'static str, reason: String },
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Failed to initialise logging: {0}")]
    Logging(String),
    #[error("Usage: {0}")]
    Usage(String),
}

pub type ClientResult<T> = Result<T, ClientError>;
