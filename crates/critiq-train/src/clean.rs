//! Corpus-side text cleaner. Simpler than the interactive normalizer: no
//! lemmatization, and a short fixed stop-word list.

use std::sync::LazyLock;

use regex::Regex;

static NON_ALPHA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z\s]").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

pub const CORPUS_STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "if", "then", "so", "because", "as", "of", "to", "in",
    "on", "for", "with", "by", "is", "are", "was", "were", "be", "been", "being", "it", "this",
    "that", "these", "those", "at", "from", "up", "down", "out", "about",
];

/// Lower-case, strip non-letters, collapse whitespace, drop stop words.
#[must_use]
pub fn clean_corpus_text(text: &str) -> String {
    let lower = text.to_lowercase();
    let letters = NON_ALPHA.replace_all(&lower, " ");
    let collapsed = WHITESPACE.replace_all(&letters, " ");
    collapsed
        .split_whitespace()
        .filter(|w| !CORPUS_STOP_WORDS.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_symbols_and_stop_words() {
        assert_eq!(
            clean_corpus_text("The Court's ruling, in 2019, was UNFAIR!"),
            "court s ruling unfair"
        );
    }

    #[test]
    fn keeps_words_the_lemmatizing_normalizer_would_drop() {
        assert_eq!(clean_corpus_text("not very good"), "not very good");
        assert_eq!(clean_corpus_text("   "), "");
    }
}
