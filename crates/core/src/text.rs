//! Text helpers shared by the summary, transcript and sentiment stages.
//!
//! All lengths are counted in Unicode scalar values (`char`s), never bytes,
//! so limits behave the same for ASCII and non-ASCII transcripts.

use std::sync::LazyLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

static SPECIAL_CHARACTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid special character pattern"));
static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Length of `text` in chars
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Longest prefix of `text` holding at most `limit` chars
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Longest prefix of at most `limit` chars that ends on a word boundary.
///
/// Falls back to a hard char cut when the first word alone is longer than
/// `limit`. Trailing whitespace is trimmed.
pub fn truncate_at_word(text: &str, limit: usize) -> &str {
    let text = text.trim();
    if char_len(text) <= limit {
        return text;
    }

    let hard = truncate_chars(text, limit);
    let cut_inside_word = text[hard.len()..]
        .chars()
        .next()
        .is_some_and(|c| !c.is_whitespace());

    if !cut_inside_word {
        return hard.trim_end();
    }

    match hard.rfind(char::is_whitespace) {
        Some(idx) => hard[..idx].trim_end(),
        None => hard,
    }
}

/// Split `text` into trimmed, non-empty sentences in document order.
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.unicode_sentences()
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .collect()
}

/// Keep whole sentences from the start of `text` while the accumulated
/// length (sentences joined by single spaces) stays within `limit`.
///
/// Returns an empty string when the first sentence alone is longer than
/// `limit`; callers decide how to handle that degenerate case.
pub fn trim_to_nearest_sentence(text: &str, limit: usize) -> String {
    let mut trimmed = String::new();
    let mut running = 0usize;

    for sentence in split_sentences(text) {
        let len = char_len(sentence);
        if running + len > limit {
            break;
        }
        trimmed.push_str(sentence);
        trimmed.push(' ');
        running += len + 1;
    }

    trimmed.trim_end().to_string()
}

/// The first `count` sentences of `text`, joined by single spaces
pub fn first_sentences(text: &str, count: usize) -> String {
    split_sentences(text)
        .into_iter()
        .take(count)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drop every character that is neither a word character nor whitespace,
/// collapse whitespace runs to one space and trim both ends.
pub fn clean_special_characters(text: &str) -> String {
    let stripped = SPECIAL_CHARACTERS.replace_all(text, "");
    WHITESPACE_RUNS
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_stops_before_sentence_that_overflows() {
        assert_eq!(
            trim_to_nearest_sentence("Hello world. Second sentence.", 15),
            "Hello world."
        );
    }

    #[test]
    fn trim_keeps_everything_when_it_fits() {
        let text = "One. Two. Three.";
        assert_eq!(trim_to_nearest_sentence(text, 100), text);
    }

    #[test]
    fn trim_returns_empty_when_first_sentence_is_too_long() {
        assert_eq!(
            trim_to_nearest_sentence("This first sentence is long. Short.", 10),
            ""
        );
    }

    #[test]
    fn trim_counts_chars_not_bytes() {
        let text = "Привет мир. Ещё одно предложение.";
        assert_eq!(trim_to_nearest_sentence(text, 12), "Привет мир.");
    }

    #[test]
    fn clean_removes_punctuation_and_collapses_whitespace() {
        assert_eq!(
            clean_special_characters("  Hello,   world!\n\nIt's   great...  "),
            "Hello world Its great"
        );
    }

    #[test]
    fn clean_keeps_unicode_word_characters() {
        assert_eq!(clean_special_characters("café — naïve!"), "café naïve");
    }

    #[test]
    fn truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn truncate_at_word_backs_off_to_whitespace() {
        assert_eq!(truncate_at_word("alpha beta gamma", 12), "alpha beta");
        assert_eq!(truncate_at_word("alpha beta gamma", 10), "alpha beta");
        assert_eq!(truncate_at_word("supercalifragilistic", 5), "super");
    }

    #[test]
    fn first_sentences_takes_leading_sentences() {
        assert_eq!(first_sentences("A one. B two. C three. D four.", 3), "A one. B two. C three.");
        assert_eq!(first_sentences("", 3), "");
    }
}
