//! Tubelens Core Library
//!
//! Turns a video's transcript and comments into a bounded summary, a
//! punctuated transcript and a comment sentiment report. Models are reached
//! through the oracle traits in [`oracle`], so the chunking and aggregation
//! logic runs the same against real backends and test doubles.

pub mod analyzer;
pub mod backends;
pub mod chunker;
pub mod config;
pub mod error;
pub mod format;
pub mod oracle;
pub mod provider;
pub mod sentiment;
pub mod summary;
pub mod text;
pub mod transcript;
pub mod types;

#[cfg(test)]
mod fakes;

// Re-export commonly used items at crate root
pub use analyzer::{AnalysisError, CommentSource, Oracles, TranscriptSource, VideoAnalyzer};
pub use chunker::{ChunkPolicy, Chunker};
pub use config::Config;
pub use error::{Result, TubelensError};
pub use format::{format_analysis_readable, format_sentiment_readable};
pub use oracle::{
    Classification, PunctuationRestorer, SentimentClassifier, SentimentLabel, Summarizer,
};
pub use provider::{Provider, ProviderConfig};
pub use sentiment::{Effectiveness, SentimentReport};
pub use text::trim_to_nearest_sentence;
pub use types::VideoAnalysis;
