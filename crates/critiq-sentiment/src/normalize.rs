//! Lemmatizing normalizer for interactive scoring.

use std::sync::LazyLock;

use regex::Regex;

use crate::nlp::NlpPipeline;

static NON_ALPHA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z\s]").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Lower-case, strip non-letters, collapse whitespace, trim.
#[must_use]
pub fn clean(raw: &str) -> String {
    let lower = raw.to_lowercase();
    let letters = NON_ALPHA.replace_all(&lower, " ");
    WHITESPACE.replace_all(&letters, " ").trim().to_string()
}

/// Clean `raw`, then keep the lemma of every non-stop token.
///
/// `None` and empty input give an empty string.
///
/// Not strictly idempotent: a second pass lemmatizes lemmas again, so a word
/// such as `beings` becomes `being` on the first pass and is dropped on the
/// second, where the surface form `being` matches the stop list.
#[must_use]
pub fn normalize<N: NlpPipeline + ?Sized>(nlp: &N, raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    let cleaned = clean(raw);
    if cleaned.is_empty() {
        return cleaned;
    }
    nlp.tokens(&cleaned)
        .into_iter()
        .filter(|token| !token.lemma.trim().is_empty() && !nlp.is_stop(&token.text))
        .map(|token| token.lemma)
        .collect::<Vec<_>>()
        .join(" ")
}
