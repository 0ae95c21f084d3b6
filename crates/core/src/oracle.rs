//! Capabilities the pipeline delegates to models.
//!
//! Each oracle is a single-method trait so the chunking and aggregation
//! logic can run against any backend, including the fakes used in tests.

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TubelensError};

pub const SUMMARIZER: &str = "summarization";
pub const PUNCTUATION: &str = "punctuation";
pub const SENTIMENT: &str = "sentiment";

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Abstractive summary of `chunk`, roughly `min_length..=max_length` tokens long
    async fn summarize(&self, chunk: &str, min_length: usize, max_length: usize) -> Result<String>;
}

#[async_trait]
pub trait PunctuationRestorer: Send + Sync {
    async fn restore_punctuation(&self, chunk: &str) -> Result<String>;
}

#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Classification>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: SentimentLabel,
    /// Confidence in `label`, in `[0, 1]`
    pub confidence: f64,
}

impl Classification {
    /// Confidence folded onto a single scale where 1.0 is maximally positive
    pub fn positivity(&self) -> f64 {
        let confidence = self.confidence.clamp(0.0, 1.0);
        match self.label {
            SentimentLabel::Positive => confidence,
            SentimentLabel::Negative => 1.0 - confidence,
        }
    }
}

/// Await an oracle call, turning an elapsed deadline into a regular error
pub async fn with_timeout<T>(
    oracle: &'static str,
    timeout: Duration,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(TubelensError::Timeout {
            oracle,
            seconds: timeout.as_secs(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positivity_folds_negative_confidence() {
        let positive = Classification {
            label: SentimentLabel::Positive,
            confidence: 0.9,
        };
        let negative = Classification {
            label: SentimentLabel::Negative,
            confidence: 0.9,
        };
        assert!((positive.positivity() - 0.9).abs() < 1e-12);
        assert!((negative.positivity() - 0.1).abs() < 1e-12);
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_deadline_is_a_timeout_error() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("late")
        };
        let err = with_timeout(SUMMARIZER, Duration::from_secs(5), slow)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TubelensError::Timeout {
                oracle: SUMMARIZER,
                seconds: 5
            }
        ));
    }
}
