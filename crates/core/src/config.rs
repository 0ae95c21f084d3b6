//! Runtime configuration.
//!
//! Every field has a default, so a missing config file is the same as an
//! empty one. Credentials never live here; backends read them from the
//! environment when they are built.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    chunker::ChunkPolicy,
    error::{Result, TubelensError},
    provider::Provider,
};

const ENV_PREFIX: &str = "TUBELENS_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub chunking: ChunkingConfig,
    pub summary: SummaryConfig,
    pub sentiment: SentimentConfig,
    pub oracles: OracleConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub policy: ChunkPolicy,
    /// Transcript formatting chunk size, in chars or tokens depending on policy
    pub chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            policy: ChunkPolicy::Words,
            chunk_size: 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Transcript prefix fed to the summarizer
    pub input_char_limit: usize,
    /// Cap on the combined, cleaned summary
    pub output_char_limit: usize,
    /// Summarizer input window; half of what the default model accepts
    pub chunk_size: usize,
    pub min_length: usize,
    pub max_length: usize,
    /// Sentences kept by the extractive fallback
    pub fallback_sentences: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            input_char_limit: 5000,
            output_char_limit: 1200,
            chunk_size: 512,
            min_length: 30,
            max_length: 150,
            fallback_sentences: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    /// Comments are cut to this many chars before classification
    pub max_comment_chars: usize,
    pub max_comments: usize,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            max_comment_chars: 512,
            max_comments: 250,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub timeout_secs: u64,
    pub huggingface_url: String,
    pub summarization_model: String,
    pub sentiment_model: String,
    pub punctuation_provider: Provider,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            huggingface_url: "https://api-inference.huggingface.co/models".to_string(),
            summarization_model: "facebook/bart-large-cnn".to_string(),
            sentiment_model: "distilbert-base-uncased-finetuned-sst-2-english".to_string(),
            punctuation_provider: Provider::Grok,
        }
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file and apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| TubelensError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise from the default location if a
    /// file exists there, otherwise fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(default) if default.exists() => Self::load(&default),
            _ => {
                let mut config = Config::default();
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tubelens").join("config.toml"))
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `TUBELENS_SECTION__KEY` overrides plus the model name variables,
    /// reading values through `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(model) = lookup("SUMMARIZATION_MODEL") {
            self.oracles.summarization_model = model;
        }
        if let Some(model) = lookup("SENTIMENT_MODEL") {
            self.oracles.sentiment_model = model;
        }

        for key in OVERRIDABLE_KEYS {
            let env_key = format!("{ENV_PREFIX}{key}");
            if let Some(value) = lookup(&env_key) {
                if let Err(e) = self.set_value(key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", env_key, e);
                }
            }
        }
    }

    fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "CHUNKING__POLICY" => self.chunking.policy = parse_enum(key, value)?,
            "CHUNKING__CHUNK_SIZE" => self.chunking.chunk_size = parse_number(key, value)?,
            "SUMMARY__INPUT_CHAR_LIMIT" => {
                self.summary.input_char_limit = parse_number(key, value)?
            }
            "SUMMARY__OUTPUT_CHAR_LIMIT" => {
                self.summary.output_char_limit = parse_number(key, value)?
            }
            "SUMMARY__CHUNK_SIZE" => self.summary.chunk_size = parse_number(key, value)?,
            "SUMMARY__MIN_LENGTH" => self.summary.min_length = parse_number(key, value)?,
            "SUMMARY__MAX_LENGTH" => self.summary.max_length = parse_number(key, value)?,
            "SUMMARY__FALLBACK_SENTENCES" => {
                self.summary.fallback_sentences = parse_number(key, value)?
            }
            "SENTIMENT__MAX_COMMENT_CHARS" => {
                self.sentiment.max_comment_chars = parse_number(key, value)?
            }
            "SENTIMENT__MAX_COMMENTS" => self.sentiment.max_comments = parse_number(key, value)?,
            "ORACLES__TIMEOUT_SECS" => self.oracles.timeout_secs = parse_number(key, value)?,
            "ORACLES__HUGGINGFACE_URL" => self.oracles.huggingface_url = value.trim().to_string(),
            "ORACLES__SUMMARIZATION_MODEL" => {
                self.oracles.summarization_model = value.trim().to_string()
            }
            "ORACLES__SENTIMENT_MODEL" => self.oracles.sentiment_model = value.trim().to_string(),
            "ORACLES__PUNCTUATION_PROVIDER" => {
                self.oracles.punctuation_provider = parse_enum(key, value)?
            }
            _ => tracing::debug!("Unknown env config key: {}", key),
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("chunking.chunk_size", self.chunking.chunk_size as u64),
            ("summary.input_char_limit", self.summary.input_char_limit as u64),
            ("summary.output_char_limit", self.summary.output_char_limit as u64),
            ("summary.chunk_size", self.summary.chunk_size as u64),
            ("summary.max_length", self.summary.max_length as u64),
            ("sentiment.max_comment_chars", self.sentiment.max_comment_chars as u64),
            ("oracles.timeout_secs", self.oracles.timeout_secs),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(invalid(key, "must be greater than zero"));
            }
        }

        if self.summary.min_length > self.summary.max_length {
            return Err(invalid(
                "summary.min_length",
                format!(
                    "{} is larger than summary.max_length ({})",
                    self.summary.min_length, self.summary.max_length
                ),
            ));
        }

        Ok(())
    }
}

/// Every scalar field, as `SECTION__KEY`
const OVERRIDABLE_KEYS: [&str; 15] = [
    "CHUNKING__POLICY",
    "CHUNKING__CHUNK_SIZE",
    "SUMMARY__INPUT_CHAR_LIMIT",
    "SUMMARY__OUTPUT_CHAR_LIMIT",
    "SUMMARY__CHUNK_SIZE",
    "SUMMARY__MIN_LENGTH",
    "SUMMARY__MAX_LENGTH",
    "SUMMARY__FALLBACK_SENTENCES",
    "SENTIMENT__MAX_COMMENT_CHARS",
    "SENTIMENT__MAX_COMMENTS",
    "ORACLES__TIMEOUT_SECS",
    "ORACLES__HUGGINGFACE_URL",
    "ORACLES__SUMMARIZATION_MODEL",
    "ORACLES__SENTIMENT_MODEL",
    "ORACLES__PUNCTUATION_PROVIDER",
];

fn invalid(key: &str, reason: impl Into<String>) -> TubelensError {
    TubelensError::InvalidConfig {
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(key, format!("cannot parse '{value}' as a number")))
}

fn parse_enum<T: serde::de::DeserializeOwned>(key: &str, value: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(value.trim().to_lowercase()))
        .map_err(|_| invalid(key, format!("unknown value '{value}'")))
}
