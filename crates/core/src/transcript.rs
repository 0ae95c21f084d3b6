use std::{sync::Arc, time::Duration};

use tracing::{debug, warn};

use crate::{
    chunker::{Chunker, SkippedChunk},
    error::TubelensError,
    oracle::{self, PunctuationRestorer, with_timeout},
};

pub const UNABLE_TO_FORMAT: &str = "Unable to format the transcript.";
pub const PUNCTUATION_UNAVAILABLE: &str =
    "Transcript unavailable: the punctuation model could not be loaded.";

const PARAGRAPH_BREAK: &str = "\n\n";

#[derive(Debug)]
pub struct FormattedTranscript {
    /// One paragraph per restored chunk, in chunk order
    pub text: String,
    pub chunk_count: usize,
    pub skipped: Vec<SkippedChunk>,
}

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("punctuation oracle is unavailable")]
    Unavailable,

    #[error("failed to chunk transcript: {0}")]
    Chunking(TubelensError),

    #[error("none of the {chunk_count} chunks could be restored")]
    NoUsableChunks {
        chunk_count: usize,
        skipped: Vec<SkippedChunk>,
    },
}

pub struct TranscriptFormatter {
    punctuator: Option<Arc<dyn PunctuationRestorer>>,
    chunker: Chunker,
    chunk_size: usize,
    timeout: Duration,
}

impl TranscriptFormatter {
    pub fn new(
        punctuator: Option<Arc<dyn PunctuationRestorer>>,
        chunker: Chunker,
        chunk_size: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            punctuator,
            chunker,
            chunk_size,
            timeout,
        }
    }

    /// Punctuated transcript split into paragraphs, or a fixed signal. Never fails.
    pub async fn format_transcript(&self, transcript: &str) -> String {
        match self.format(transcript).await {
            Ok(formatted) => formatted.text,
            Err(FormatError::Unavailable) => PUNCTUATION_UNAVAILABLE.to_string(),
            Err(e) => {
                warn!("Transcript formatting failed: {}", e);
                UNABLE_TO_FORMAT.to_string()
            }
        }
    }

    /// Restore each chunk independently and join them as paragraphs.
    ///
    /// An empty transcript has no chunks and formats to an empty string.
    pub async fn format(&self, transcript: &str) -> Result<FormattedTranscript, FormatError> {
        let Some(punctuator) = &self.punctuator else {
            return Err(FormatError::Unavailable);
        };

        let chunks = self
            .chunker
            .split(transcript, self.chunk_size)
            .map_err(FormatError::Chunking)?;
        let chunk_count = chunks.len();

        let mut paragraphs = Vec::with_capacity(chunk_count);
        let mut skipped = Vec::new();
        let mut attempted = 0usize;

        for (index, chunk) in chunks.iter().enumerate() {
            let chunk = chunk.trim();
            if chunk.is_empty() {
                continue;
            }
            attempted += 1;

            let call = punctuator.restore_punctuation(chunk);
            match with_timeout(oracle::PUNCTUATION, self.timeout, call).await {
                Ok(restored) if !restored.trim().is_empty() => {
                    debug!(chunk = index, "Chunk punctuated");
                    paragraphs.push(restored.trim().to_string());
                }
                Ok(_) => {
                    warn!(chunk = index, "Punctuation restorer returned nothing");
                    skipped.push(SkippedChunk {
                        index,
                        error: TubelensError::oracle(oracle::PUNCTUATION, "empty output"),
                    });
                }
                Err(e) => {
                    warn!(chunk = index, "Skipping chunk: {}", e);
                    skipped.push(SkippedChunk { index, error: e });
                }
            }
        }

        if attempted > 0 && paragraphs.is_empty() {
            return Err(FormatError::NoUsableChunks {
                chunk_count,
                skipped,
            });
        }

        Ok(FormattedTranscript {
            text: paragraphs.join(PARAGRAPH_BREAK),
            chunk_count,
            skipped,
        })
    }
}
