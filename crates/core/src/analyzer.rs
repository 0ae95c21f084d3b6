//! Public entry points.
//!
//! [`Oracles::init`] builds the model backends once at startup;
//! [`VideoAnalyzer`] owns them for the life of the process and exposes the
//! three text operations. Every operation here is total: failures come back
//! as sentinel strings or empty reports, never as errors.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use crate::{
    backends::{ChatPunctuationRestorer, HuggingFaceSentimentClassifier, HuggingFaceSummarizer},
    chunker::Chunker,
    config::Config,
    error::Result,
    oracle::{PunctuationRestorer, SentimentClassifier, Summarizer},
    sentiment::{SentimentAggregator, SentimentReport},
    summary::SummaryOrchestrator,
    transcript::TranscriptFormatter,
    types::VideoAnalysis,
};

/// Where transcripts come from. `None` means the video has no captions.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn get_transcript(&self, video_id: &str) -> Option<String>;
}

/// Where comments come from. Retrieval failures are an empty list.
#[async_trait]
pub trait CommentSource: Send + Sync {
    async fn get_comments(&self, video_id: &str, max_results: usize) -> Vec<String>;
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("no transcript is available for video {video_id}")]
    NoTranscript { video_id: String },
}

/// Model capabilities, each absent when its backend could not be built
#[derive(Clone, Default)]
pub struct Oracles {
    pub summarizer: Option<Arc<dyn Summarizer>>,
    pub punctuator: Option<Arc<dyn PunctuationRestorer>>,
    pub classifier: Option<Arc<dyn SentimentClassifier>>,
}

impl Oracles {
    /// Build every backend named in `config`. A backend that fails to
    /// initialize (usually a missing credential) is logged and left out.
    pub fn init(config: &Config) -> Self {
        let oracles = &config.oracles;

        let summarizer = available(
            "summarization",
            HuggingFaceSummarizer::new(&oracles.huggingface_url, &oracles.summarization_model),
        )
        .map(|s| Arc::new(s) as Arc<dyn Summarizer>);

        let classifier = available(
            "sentiment",
            HuggingFaceSentimentClassifier::new(&oracles.huggingface_url, &oracles.sentiment_model),
        )
        .map(|c| Arc::new(c) as Arc<dyn SentimentClassifier>);

        let punctuator = available(
            "punctuation",
            ChatPunctuationRestorer::new(oracles.punctuation_provider),
        )
        .map(|p| Arc::new(p) as Arc<dyn PunctuationRestorer>);

        Self {
            summarizer,
            punctuator,
            classifier,
        }
    }
}

fn available<T>(name: &str, backend: Result<T>) -> Option<T> {
    match backend {
        Ok(backend) => {
            info!("{} oracle ready", name);
            Some(backend)
        }
        Err(e) => {
            error!("{} oracle failed to initialize: {}", name, e);
            None
        }
    }
}

pub struct VideoAnalyzer {
    summary: SummaryOrchestrator,
    transcript: TranscriptFormatter,
    sentiment: SentimentAggregator,
    max_comments: usize,
}

impl VideoAnalyzer {
    /// Wire the components. Fails only when the configured chunking policy
    /// cannot be set up.
    pub fn new(config: &Config, oracles: Oracles) -> Result<Self> {
        let chunker = Chunker::for_policy(config.chunking.policy)?;
        let timeout = config.oracles.timeout();

        Ok(Self {
            summary: SummaryOrchestrator::new(
                oracles.summarizer,
                oracles.punctuator.clone(),
                chunker.clone(),
                config.summary.clone(),
                timeout,
            ),
            transcript: TranscriptFormatter::new(
                oracles.punctuator,
                chunker,
                config.chunking.chunk_size,
                timeout,
            ),
            sentiment: SentimentAggregator::new(
                oracles.classifier,
                config.sentiment.max_comment_chars,
                timeout,
            ),
            max_comments: config.sentiment.max_comments,
        })
    }

    pub fn summary(&self) -> &SummaryOrchestrator {
        &self.summary
    }

    pub fn transcript(&self) -> &TranscriptFormatter {
        &self.transcript
    }

    pub fn sentiment(&self) -> &SentimentAggregator {
        &self.sentiment
    }

    pub async fn generate_concise_summary(&self, transcript: &str) -> String {
        self.summary
            .generate_concise_summary(transcript)
            .instrument(request_span("summary"))
            .await
    }

    pub async fn format_transcript(&self, transcript: &str) -> String {
        self.transcript
            .format_transcript(transcript)
            .instrument(request_span("format"))
            .await
    }

    pub async fn analyze_sentiment(&self, comments: &[String]) -> SentimentReport {
        self.sentiment
            .analyze_sentiment(comments)
            .instrument(request_span("sentiment"))
            .await
    }

    /// Fetch and analyze one video. A missing transcript ends the request
    /// before comments are fetched.
    pub async fn analyze(
        &self,
        video_id: &str,
        transcripts: &dyn TranscriptSource,
        comments: &dyn CommentSource,
    ) -> std::result::Result<VideoAnalysis, AnalysisError> {
        let Some(transcript) = transcripts.get_transcript(video_id).await else {
            return Err(AnalysisError::NoTranscript {
                video_id: video_id.to_string(),
            });
        };
        let comments = comments.get_comments(video_id, self.max_comments).await;
        info!(
            video_id,
            transcript_chars = transcript.len(),
            comments = comments.len(),
            "Inputs fetched"
        );

        Ok(VideoAnalysis {
            video_id: video_id.to_string(),
            summary: self.generate_concise_summary(&transcript).await,
            formatted_transcript: self.format_transcript(&transcript).await,
            sentiment: self.analyze_sentiment(&comments).await,
            comment_count: comments.len(),
        })
    }
}

fn request_span(operation: &'static str) -> tracing::Span {
    info_span!("request", operation, request_id = %Uuid::new_v4())
}
