use std::path::PathBuf;

use thiserror::Error;

use crate::provider::ProviderError;

#[derive(Error, Debug)]
pub enum TubelensError {
    #[error("{oracle} oracle failed: {reason}")]
    Oracle { oracle: &'static str, reason: String },

    #[error("{oracle} oracle timed out after {seconds}s")]
    Timeout { oracle: &'static str, seconds: u64 },

    #[error("{oracle} oracle is unavailable")]
    OracleUnavailable { oracle: &'static str },

    #[error("Tokenizer error: {reason}")]
    Tokenizer { reason: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    InvalidConfig { key: String, reason: String },

    #[error("Failed to read {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl TubelensError {
    pub fn oracle(oracle: &'static str, reason: impl Into<String>) -> Self {
        Self::Oracle {
            oracle,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TubelensError>;
