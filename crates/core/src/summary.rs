use std::{sync::Arc, time::Duration};

use tracing::{debug, warn};

use crate::{
    chunker::{Chunker, SkippedChunk},
    config::SummaryConfig,
    error::TubelensError,
    oracle::{self, PunctuationRestorer, Summarizer, with_timeout},
    text::{
        char_len, clean_special_characters, first_sentences, trim_to_nearest_sentence,
        truncate_at_word,
    },
};

pub const UNABLE_TO_SUMMARIZE: &str = "Unable to generate a summary for this video.";
pub const SUMMARIZER_UNAVAILABLE: &str =
    "Summary unavailable: the summarization model could not be loaded.";

#[derive(Debug)]
pub struct Summary {
    pub text: String,
    pub chunk_count: usize,
    pub skipped: Vec<SkippedChunk>,
    /// False when the punctuation pass failed and `text` is the cleaned summary
    pub punctuation_restored: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("transcript is empty")]
    EmptyInput,

    #[error("summarization oracle is unavailable")]
    Unavailable,

    #[error("failed to chunk transcript: {0}")]
    Chunking(TubelensError),

    #[error("none of the {chunk_count} chunks produced a usable summary")]
    NoUsableChunks {
        chunk_count: usize,
        skipped: Vec<SkippedChunk>,
    },
}

pub struct SummaryOrchestrator {
    summarizer: Option<Arc<dyn Summarizer>>,
    punctuator: Option<Arc<dyn PunctuationRestorer>>,
    chunker: Chunker,
    config: SummaryConfig,
    timeout: Duration,
}

impl SummaryOrchestrator {
    pub fn new(
        summarizer: Option<Arc<dyn Summarizer>>,
        punctuator: Option<Arc<dyn PunctuationRestorer>>,
        chunker: Chunker,
        config: SummaryConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            summarizer,
            punctuator,
            chunker,
            config,
            timeout,
        }
    }

    /// Summary of `text` or a fallback string. Never fails.
    ///
    /// Failure policy: an empty transcript yields [`UNABLE_TO_SUMMARIZE`], a
    /// missing oracle yields [`SUMMARIZER_UNAVAILABLE`], and a transcript for
    /// which no chunk could be summarized yields its first few sentences
    /// (extractive fallback), capped to the output limit.
    pub async fn generate_concise_summary(&self, text: &str) -> String {
        match self.summarize(text).await {
            Ok(summary) => summary.text,
            Err(SummaryError::EmptyInput) => UNABLE_TO_SUMMARIZE.to_string(),
            Err(SummaryError::Unavailable) => SUMMARIZER_UNAVAILABLE.to_string(),
            Err(e) => {
                warn!("Falling back to extractive summary: {}", e);
                self.extractive_fallback(text)
            }
        }
    }

    /// Run the chunk, summarize, combine, clean, cap and punctuate pipeline.
    pub async fn summarize(&self, text: &str) -> Result<Summary, SummaryError> {
        if text.trim().is_empty() {
            return Err(SummaryError::EmptyInput);
        }
        let Some(summarizer) = &self.summarizer else {
            return Err(SummaryError::Unavailable);
        };

        let input = self.bound_input(text);
        let chunks = self
            .chunker
            .split(&input, self.config.chunk_size)
            .map_err(SummaryError::Chunking)?;
        let chunk_count = chunks.len();

        let mut partials = Vec::with_capacity(chunk_count);
        let mut skipped = Vec::new();

        for (index, chunk) in chunks.iter().enumerate() {
            if chunk.trim().is_empty() {
                continue;
            }
            let call = summarizer.summarize(chunk, self.config.min_length, self.config.max_length);
            match with_timeout(oracle::SUMMARIZER, self.timeout, call).await {
                Ok(partial) if !partial.trim().is_empty() => {
                    debug!(chunk = index, chars = char_len(&partial), "Chunk summarized");
                    partials.push(partial);
                }
                Ok(_) => {
                    warn!(chunk = index, "Summarizer returned an empty summary");
                    skipped.push(SkippedChunk {
                        index,
                        error: TubelensError::oracle(oracle::SUMMARIZER, "empty summary"),
                    });
                }
                Err(e) => {
                    warn!(chunk = index, "Skipping chunk: {}", e);
                    skipped.push(SkippedChunk { index, error: e });
                }
            }
        }

        let cleaned = clean_special_characters(&partials.join(" "));
        if cleaned.is_empty() {
            return Err(SummaryError::NoUsableChunks {
                chunk_count,
                skipped,
            });
        }

        let capped = self.cap_output(cleaned);
        let (text, punctuation_restored) = self.punctuate(capped).await;

        Ok(Summary {
            text,
            chunk_count,
            skipped,
            punctuation_restored,
        })
    }

    /// Bound the transcript to the input limit, cutting at a sentence
    /// boundary, or at a word boundary when the text has no sentence break
    /// inside the limit (unpunctuated auto-captions).
    fn bound_input<'a>(&self, text: &'a str) -> std::borrow::Cow<'a, str> {
        let limit = self.config.input_char_limit;
        if char_len(text) <= limit {
            return text.into();
        }

        let trimmed = trim_to_nearest_sentence(text, limit);
        if trimmed.is_empty() {
            truncate_at_word(text, limit).into()
        } else {
            trimmed.into()
        }
    }

    /// Cleaning strips sentence terminators, so the sentence trim usually
    /// finds a single oversized sentence; the word cut covers that case.
    fn cap_output(&self, cleaned: String) -> String {
        let limit = self.config.output_char_limit;
        if char_len(&cleaned) <= limit {
            return cleaned;
        }

        let trimmed = trim_to_nearest_sentence(&cleaned, limit);
        if trimmed.is_empty() {
            truncate_at_word(&cleaned, limit).to_string()
        } else {
            trimmed
        }
    }

    async fn punctuate(&self, text: String) -> (String, bool) {
        let Some(punctuator) = &self.punctuator else {
            return (text, false);
        };

        let call = punctuator.restore_punctuation(&text);
        let restored = with_timeout(oracle::PUNCTUATION, self.timeout, call).await;
        match restored {
            Ok(restored) if !restored.trim().is_empty() => (restored.trim().to_string(), true),
            Ok(_) => {
                warn!("Punctuation restorer returned nothing; keeping cleaned summary");
                (text, false)
            }
            Err(e) => {
                warn!("Punctuation restoration failed; keeping cleaned summary: {}", e);
                (text, false)
            }
        }
    }

    fn extractive_fallback(&self, text: &str) -> String {
        let lead = first_sentences(text, self.config.fallback_sentences);
        let lead = truncate_at_word(&lead, self.config.output_char_limit);
        if lead.is_empty() {
            UNABLE_TO_SUMMARIZE.to_string()
        } else {
            lead.to_string()
        }
    }
}
