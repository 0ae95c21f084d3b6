use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use tiktoken_rs::CoreBPE;

use crate::{
    error::{Result, TubelensError},
    text::char_len,
};

/// How long text is cut into chunks before it reaches an oracle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkPolicy {
    /// Whole words, at most `max_size` chars per chunk
    #[default]
    Words,
    /// Fixed windows of `max_size` tokens, decoded back to text
    Tokens,
}

pub trait Tokenizer: Send + Sync {
    fn encode(&self, text: &str) -> Vec<u32>;
    fn decode(&self, tokens: &[u32]) -> Result<String>;
}

/// `cl100k_base` byte-pair encoding
pub struct BpeTokenizer {
    bpe: CoreBPE,
}

impl BpeTokenizer {
    pub fn cl100k() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| TubelensError::Tokenizer {
            reason: e.to_string(),
        })?;
        Ok(Self { bpe })
    }
}

impl Tokenizer for BpeTokenizer {
    fn encode(&self, text: &str) -> Vec<u32> {
        self.bpe
            .encode_with_special_tokens(text)
            .into_iter()
            .map(|token| token as u32)
            .collect()
    }

    /// Lossy: a window cut inside a multi-byte char decodes with U+FFFD at
    /// the cut. `tokens` must come from `encode`.
    fn decode(&self, tokens: &[u32]) -> Result<String> {
        let bytes: Vec<u8> = self
            .bpe
            ._decode_native_and_split(tokens.to_vec())
            .flatten()
            .collect();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// A chunk that did not contribute to a result, with the reason
#[derive(Debug)]
pub struct SkippedChunk {
    pub index: usize,
    pub error: TubelensError,
}

#[derive(Clone)]
pub enum Chunker {
    Words,
    Tokens(Arc<dyn Tokenizer>),
}

impl fmt::Debug for Chunker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chunker::Words => f.write_str("Chunker::Words"),
            Chunker::Tokens(_) => f.write_str("Chunker::Tokens"),
        }
    }
}

impl Chunker {
    /// Build the chunker for a configured policy. The token policy loads the
    /// BPE tables, which is the only way this can fail.
    pub fn for_policy(policy: ChunkPolicy) -> Result<Self> {
        match policy {
            ChunkPolicy::Words => Ok(Chunker::Words),
            ChunkPolicy::Tokens => Ok(Chunker::Tokens(Arc::new(BpeTokenizer::cl100k()?))),
        }
    }

    pub fn policy(&self) -> ChunkPolicy {
        match self {
            Chunker::Words => ChunkPolicy::Words,
            Chunker::Tokens(_) => ChunkPolicy::Tokens,
        }
    }

    /// Split `text` into ordered chunks of at most `max_size` chars or tokens.
    /// Empty text yields no chunks.
    pub fn split(&self, text: &str, max_size: usize) -> Result<Vec<String>> {
        match self {
            Chunker::Words => Ok(split_words(text, max_size)),
            Chunker::Tokens(tokenizer) => split_tokens(text, max_size, tokenizer.as_ref()),
        }
    }
}

/// Word-accumulation split. A chunk closes right before the word that would
/// push its space-joined length past `max_size`; that word opens the next
/// chunk. A single word longer than `max_size` becomes its own chunk.
pub fn split_words(text: &str, max_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = char_len(word);
        let joined_len = if current.is_empty() {
            word_len
        } else {
            current_len + 1 + word_len
        };

        if joined_len > max_size && !current.is_empty() {
            chunks.push(current.join(" "));
            current.clear();
            current_len = word_len;
        } else {
            current_len = joined_len;
        }
        current.push(word);
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}

/// Token-window split: exactly `ceil(tokens / max_size)` chunks, each window
/// decoded on its own.
pub fn split_tokens(text: &str, max_size: usize, tokenizer: &dyn Tokenizer) -> Result<Vec<String>> {
    let tokens = tokenizer.encode(text);
    tokens
        .chunks(max_size.max(1))
        .map(|window| tokenizer.decode(window))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One token per char, so windows are easy to reason about
    struct CharTokenizer;

    impl Tokenizer for CharTokenizer {
        fn encode(&self, text: &str) -> Vec<u32> {
            text.chars().map(u32::from).collect()
        }

        fn decode(&self, tokens: &[u32]) -> Result<String> {
            tokens
                .iter()
                .map(|&t| {
                    char::from_u32(t).ok_or_else(|| TubelensError::Tokenizer {
                        reason: format!("invalid token {t}"),
                    })
                })
                .collect()
        }
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(split_words("", 10).is_empty());
        assert!(split_words("   \n\t ", 10).is_empty());
        assert!(split_tokens("", 10, &CharTokenizer).unwrap().is_empty());
    }

    #[test]
    fn words_close_before_overflowing_word() {
        let chunks = split_words("aaa bbb ccc ddd", 7);
        assert_eq!(chunks, vec!["aaa bbb", "ccc ddd"]);
    }

    #[test]
    fn words_never_exceed_limit_except_oversized_words() {
        let text = "the quick brown fox jumps over the lazy dog \
                    pneumonoultramicroscopicsilicovolcanoconiosis is a word";
        let chunks = split_words(text, 12);
        for chunk in &chunks {
            let words = chunk.split(' ').count();
            assert!(char_len(chunk) <= 12 || words == 1, "chunk too long: {chunk:?}");
        }
        assert!(chunks.contains(&"pneumonoultramicroscopicsilicovolcanoconiosis".to_string()));
        assert!(!chunks.iter().any(String::is_empty));
    }

    #[test]
    fn words_reassemble_to_normalized_text() {
        let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod tempor";
        for limit in [1, 5, 11, 20, 200] {
            assert_eq!(split_words(text, limit).join(" "), text);
        }
    }

    #[test]
    fn word_limit_counts_chars() {
        let chunks = split_words("ёж ёж ёж", 5);
        assert_eq!(chunks, vec!["ёж ёж", "ёж"]);
    }

    #[test]
    fn tokens_produce_ceil_windows_and_roundtrip() {
        let text = "abcdefghij";
        let chunks = split_tokens(text, 3, &CharTokenizer).unwrap();
        assert_eq!(chunks, vec!["abc", "def", "ghi", "j"]);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn bpe_windows_concatenate_back_to_ascii_input() {
        let chunker = Chunker::for_policy(ChunkPolicy::Tokens).unwrap();
        let text = "Rust makes it easy to split long transcripts into windows.";
        let chunks = chunker.split(text, 4).unwrap();
        assert!(chunks.len() > 1);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn bpe_windows_split_inside_multibyte_chars() {
        let tokenizer = BpeTokenizer::cl100k().unwrap();
        let text = "Rust 🦀 is fun 龘 𠀋 ok";
        let token_count = tokenizer.encode(text).len();

        for size in 1..=6 {
            let chunks = split_tokens(text, size, &tokenizer).unwrap();
            assert_eq!(chunks.len(), token_count.div_ceil(size), "size {size}");
        }

        let whole = split_tokens(text, token_count, &tokenizer).unwrap();
        assert_eq!(whole, vec![text.to_string()]);
    }
}
