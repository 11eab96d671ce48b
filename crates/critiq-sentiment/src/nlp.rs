//! Tokenizing and lemmatizing capability used by the text normalizer.

use std::collections::HashSet;
use std::path::Path;

use crate::error::{read_resource, SentimentError};

/// One whitespace-delimited token with its dictionary form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub lemma: String,
}

/// Lemmas plus a stop-word set.
///
/// Implementations are loaded once and shared read-only between requests.
pub trait NlpPipeline: Send + Sync {
    /// Split already-cleaned text into tokens.
    fn tokens(&self, text: &str) -> Vec<Token>;

    /// Whether the lower-cased surface form is a stop word.
    fn is_stop(&self, word: &str) -> bool;
}

/// Built-in English stop words. Negators and intensifiers are included, as in
/// the common general-purpose English lists.
pub(crate) const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst", "an",
    "and", "another", "any", "anyhow", "anyone", "anything", "anyway", "anywhere", "are",
    "around", "as", "at", "back", "be", "became", "because", "become", "becomes", "becoming",
    "been", "before", "beforehand", "behind", "being", "below", "beside", "besides", "between",
    "beyond", "both", "but", "by", "ca", "call", "can", "cannot", "could", "did", "do", "does",
    "doing", "done", "down", "due", "during", "each", "either", "else", "elsewhere", "empty",
    "enough", "even", "ever", "every", "everyone", "everything", "everywhere", "except", "few",
    "first", "for", "former", "formerly", "from", "front", "full", "further", "get", "give",
    "go", "had", "has", "have", "he", "hence", "her", "here", "hereafter", "hereby", "herein",
    "hers", "herself", "him", "himself", "his", "how", "however", "i", "if", "in", "indeed",
    "into", "is", "it", "its", "itself", "just", "keep", "last", "latter", "least", "less",
    "made", "make", "many", "may", "me", "meanwhile", "might", "mine", "more", "moreover",
    "most", "mostly", "move", "much", "must", "my", "myself", "name", "namely", "neither",
    "never", "nevertheless", "next", "no", "nobody", "none", "noone", "nor", "not", "nothing",
    "now", "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto", "or", "other",
    "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own", "part", "per",
    "perhaps", "please", "put", "quite", "rather", "re", "really", "regarding", "same", "say",
    "see", "seem", "seemed", "seeming", "seems", "several", "she", "should", "show", "side",
    "since", "so", "some", "somehow", "someone", "something", "sometime", "sometimes",
    "somewhere", "still", "such", "take", "than", "that", "the", "their", "them", "themselves",
    "then", "there", "thereafter", "thereby", "therefore", "therein", "thereupon", "these",
    "they", "third", "this", "those", "though", "through", "throughout", "thru", "thus", "to",
    "together", "too", "top", "toward", "towards", "under", "unless", "until", "up", "upon",
    "us", "used", "using", "various", "very", "via", "was", "we", "well", "were", "what",
    "whatever", "when", "whence", "whenever", "where", "whereafter", "whereas", "whereby",
    "wherein", "whereupon", "wherever", "whether", "which", "while", "whither", "who",
    "whoever", "whole", "whom", "whose", "why", "will", "with", "within", "without", "would",
    "yet", "you", "your", "yours", "yourself", "yourselves",
];

const IRREGULAR: &[(&str, &str)] = &[
    ("am", "be"),
    ("are", "be"),
    ("is", "be"),
    ("was", "be"),
    ("were", "be"),
    ("been", "be"),
    ("being", "be"),
    ("has", "have"),
    ("had", "have"),
    ("having", "have"),
    ("does", "do"),
    ("did", "do"),
    ("done", "do"),
    ("went", "go"),
    ("gone", "go"),
    ("goes", "go"),
    ("made", "make"),
    ("said", "say"),
    ("got", "get"),
    ("took", "take"),
    ("taken", "take"),
    ("came", "come"),
    ("gave", "give"),
    ("given", "give"),
    ("bought", "buy"),
    ("thought", "think"),
    ("felt", "feel"),
    ("found", "find"),
    ("told", "tell"),
    ("children", "child"),
    ("people", "person"),
    ("men", "man"),
    ("women", "woman"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("mice", "mouse"),
    ("better", "well"),
    ("worse", "bad"),
];

/// `-ed` words kept as written: participial adjectives with their own
/// valence and words that are not past tenses at all.
const KEEPS_ED: &[&str] = &[
    "annoyed",
    "beloved",
    "bored",
    "confused",
    "damaged",
    "delighted",
    "disappointed",
    "excited",
    "frustrated",
    "hundred",
    "impressed",
    "interested",
    "naked",
    "pleased",
    "satisfied",
    "sacred",
    "surprised",
    "tired",
    "wicked",
    "worried",
];

/// Rule-based English pipeline: whitespace tokens, dictionary plus suffix
/// lemmatizer, and a fixed stop-word set.
#[derive(Debug, Clone)]
pub struct EnglishPipeline {
    stop_words: HashSet<String>,
}

impl Default for EnglishPipeline {
    fn default() -> Self {
        Self::with_stop_words(STOP_WORDS.iter().map(|w| (*w).to_string()))
    }
}

impl EnglishPipeline {
    pub fn with_stop_words(words: impl IntoIterator<Item = String>) -> Self {
        Self {
            stop_words: words.into_iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    /// Build the pipeline, replacing the built-in stop words with a
    /// newline-separated list when a path is given.
    ///
    /// Blank lines and lines starting with `#` are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::ResourceMissing`] or
    /// [`SentimentError::ResourceIo`] if the file cannot be read.
    pub fn load(stop_words: Option<&Path>) -> Result<Self, SentimentError> {
        let Some(path) = stop_words else {
            return Ok(Self::default());
        };
        let content = read_resource(path)?;
        let words: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();
        tracing::info!(path = %path.display(), count = words.len(), "loaded stop words");
        Ok(Self::with_stop_words(words))
    }

    #[must_use]
    pub fn stop_word_count(&self) -> usize {
        self.stop_words.len()
    }
}

impl NlpPipeline for EnglishPipeline {
    fn tokens(&self, text: &str) -> Vec<Token> {
        text.split_whitespace()
            .map(|word| Token {
                text: word.to_string(),
                lemma: lemmatize(word),
            })
            .collect()
    }

    fn is_stop(&self, word: &str) -> bool {
        self.stop_words.contains(&word.to_lowercase())
    }
}

/// Dictionary form of a lower-case word.
///
/// Irregular forms come from a fixed table; regular plurals, third-person
/// `-s` forms and regular past tenses are reduced by suffix rules. Verb
/// `-ing` forms are kept.
#[must_use]
pub fn lemmatize(word: &str) -> String {
    let lower = word.to_lowercase();
    if let Some((_, lemma)) = IRREGULAR.iter().find(|(form, _)| *form == lower) {
        return (*lemma).to_string();
    }

    let len = lower.chars().count();
    let regular_past = lower.ends_with("ed") && !lower.ends_with("eed");
    if len > 4 && regular_past && !KEEPS_ED.contains(&lower.as_str()) {
        return past_tense_stem(&lower[..lower.len() - 2]);
    }
    if len > 4 {
        if let Some(stem) = lower.strip_suffix("ies") {
            return format!("{stem}y");
        }
    }
    if let Some(stem) = lower.strip_suffix("sses") {
        return format!("{stem}ss");
    }
    for suffix in ["xes", "ches", "shes"] {
        if lower.ends_with(suffix) {
            return lower[..lower.len() - 2].to_string();
        }
    }
    let keeps_s = ["ss", "us", "is", "ous"].iter().any(|s| lower.ends_with(s));
    if len > 3 && !keeps_s {
        if let Some(stem) = lower.strip_suffix('s') {
            return stem.to_string();
        }
    }
    lower
}

/// Base form of a regular past tense with its `-ed` already removed.
fn past_tense_stem(stem: &str) -> String {
    if let Some(base) = stem.strip_suffix('i') {
        return format!("{base}y");
    }
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();
    let doubled = n >= 2 && chars[n - 1] == chars[n - 2];
    if doubled && !is_vowel(chars[n - 1]) && !"lsz".contains(chars[n - 1]) {
        return chars[..n - 1].iter().collect();
    }
    if stem.ends_with(['v', 'u']) || short_syllable(&chars) {
        return format!("{stem}e");
    }
    stem.to_string()
}

/// A single syllable ending consonant, vowel, consonant, as in `lov`, `hat`, `smil`.
fn short_syllable(chars: &[char]) -> bool {
    let n = chars.len();
    if n < 3 {
        return false;
    }
    let (c1, v, c2) = (chars[n - 3], chars[n - 2], chars[n - 1]);
    !is_vowel(c1)
        && is_vowel(v)
        && !is_vowel(c2)
        && !"wxy".contains(c2)
        && chars[..n - 3].iter().all(|&c| !is_vowel(c))
}

fn is_vowel(c: char) -> bool {
    "aeiou".contains(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lemmatizes_irregular_and_plural_forms() {
        assert_eq!(lemmatize("was"), "be");
        assert_eq!(lemmatize("children"), "child");
        assert_eq!(lemmatize("stories"), "story");
        assert_eq!(lemmatize("classes"), "class");
        assert_eq!(lemmatize("boxes"), "box");
        assert_eq!(lemmatize("watches"), "watch");
        assert_eq!(lemmatize("products"), "product");
    }

    #[test]
    fn keeps_words_that_only_look_plural() {
        assert_eq!(lemmatize("glass"), "glass");
        assert_eq!(lemmatize("status"), "status");
        assert_eq!(lemmatize("famous"), "famous");
        assert_eq!(lemmatize("bus"), "bus");
        assert_eq!(lemmatize("ties"), "tie");
        assert_eq!(lemmatize("amazing"), "amazing");
    }

    #[test]
    fn reduces_regular_past_tenses() {
        assert_eq!(lemmatize("loved"), "love");
        assert_eq!(lemmatize("hated"), "hate");
        assert_eq!(lemmatize("liked"), "like");
        assert_eq!(lemmatize("failed"), "fail");
        assert_eq!(lemmatize("ordered"), "order");
        assert_eq!(lemmatize("arrived"), "arrive");
        assert_eq!(lemmatize("smiled"), "smile");
        assert_eq!(lemmatize("carried"), "carry");
        assert_eq!(lemmatize("stopped"), "stop");
        assert_eq!(lemmatize("called"), "call");
        assert_eq!(lemmatize("missed"), "miss");
    }

    #[test]
    fn keeps_adjectival_and_non_verb_ed_words() {
        assert_eq!(lemmatize("disappointed"), "disappointed");
        assert_eq!(lemmatize("satisfied"), "satisfied");
        assert_eq!(lemmatize("speed"), "speed");
        assert_eq!(lemmatize("used"), "used");
        assert_eq!(lemmatize("hundred"), "hundred");
    }

    #[test]
    fn stop_words_match_case_insensitively() {
        let nlp = EnglishPipeline::default();
        assert!(nlp.is_stop("The"));
        assert!(nlp.is_stop("not"));
        assert!(!nlp.is_stop("wonderful"));
    }

    #[test]
    fn tokens_carry_surface_form_and_lemma() {
        let tokens = EnglishPipeline::default().tokens("boxes were late");
        assert_eq!(
            tokens[0],
            Token {
                text: "boxes".to_string(),
                lemma: "box".to_string()
            }
        );
        assert_eq!(tokens[1].lemma, "be");
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn loads_custom_stop_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stop.txt");
        std::fs::write(&path, "# custom\nfoo\n\n  Bar \n").unwrap();
        let nlp = EnglishPipeline::load(Some(&path)).unwrap();
        assert_eq!(nlp.stop_word_count(), 2);
        assert!(nlp.is_stop("bar"));
        assert!(!nlp.is_stop("the"));
    }

    #[test]
    fn missing_stop_list_fails_fast() {
        let err = EnglishPipeline::load(Some(Path::new("/nonexistent/stop.txt"))).unwrap_err();
        assert!(matches!(err, SentimentError::ResourceMissing { .. }));
    }
}
