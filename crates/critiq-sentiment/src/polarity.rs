//! Lexicon-driven compound polarity scoring.
//!
//! Sums per-token valences with booster, negation, and contrastive-`but`
//! adjustments, then squashes the sum into `[-1.0, 1.0]`.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{read_resource, SentimentError};

/// Produces a compound polarity score in `[-1.0, 1.0]` for a text span.
pub trait PolarityScorer: Send + Sync {
    fn compound(&self, text: &str) -> f64;
}

/// Word valences on the usual `-4.0..=4.0` rating scale.
pub(crate) const LEXICON: &[(&str, f64)] = &[
    // Positive
    ("amazing", 2.8),
    ("awesome", 3.1),
    ("beautiful", 2.9),
    ("best", 3.2),
    ("brilliant", 2.8),
    ("clean", 1.7),
    ("comfortable", 1.5),
    ("convenient", 1.5),
    ("delight", 2.9),
    ("delightful", 2.9),
    ("easy", 1.9),
    ("effective", 2.1),
    ("efficient", 1.8),
    ("enjoy", 2.2),
    ("excellent", 3.2),
    ("fantastic", 2.6),
    ("fast", 1.3),
    ("fine", 0.8),
    ("friendly", 2.2),
    ("glad", 2.0),
    ("good", 1.9),
    ("great", 3.1),
    ("happy", 2.7),
    ("helpful", 1.8),
    ("impressive", 2.3),
    ("improve", 1.9),
    ("improvement", 2.0),
    ("like", 1.5),
    ("love", 3.2),
    ("lovely", 2.8),
    ("nice", 1.8),
    ("perfect", 2.7),
    ("pleasant", 2.3),
    ("pleased", 1.9),
    ("positive", 2.6),
    ("professional", 1.6),
    ("quick", 1.1),
    ("recommend", 1.5),
    ("reliable", 1.9),
    ("satisfied", 1.8),
    ("smooth", 1.3),
    ("superb", 3.1),
    ("support", 1.7),
    ("supportive", 1.6),
    ("thank", 1.5),
    ("useful", 1.9),
    ("valuable", 2.1),
    ("welcome", 2.0),
    ("win", 2.8),
    ("wonderful", 2.7),
    ("worth", 0.9),
    // Negative
    ("angry", -2.3),
    ("annoying", -2.2),
    ("awful", -2.0),
    ("bad", -2.5),
    ("boring", -1.3),
    ("broken", -2.1),
    ("careless", -1.5),
    ("complaint", -1.5),
    ("confusing", -1.3),
    ("damaged", -1.9),
    ("defective", -1.9),
    ("delay", -1.3),
    ("difficult", -1.5),
    ("disappointed", -1.9),
    ("disappointing", -2.2),
    ("dislike", -1.6),
    ("fail", -2.5),
    ("failure", -2.3),
    ("frustrating", -1.9),
    ("hate", -2.7),
    ("horrible", -2.5),
    ("poor", -2.1),
    ("problem", -1.7),
    ("rude", -2.0),
    ("sad", -2.1),
    ("slow", -0.7),
    ("terrible", -2.1),
    ("ugly", -2.3),
    ("unacceptable", -2.0),
    ("unfair", -2.1),
    ("unhappy", -1.8),
    ("useless", -1.8),
    ("waste", -1.8),
    ("worse", -2.1),
    ("worst", -3.1),
    ("wrong", -2.1),
];

const NEGATIONS: &[&str] = &[
    "aint", "cannot", "cant", "couldnt", "didnt", "doesnt", "dont", "hadnt", "hasnt", "havent",
    "isnt", "neither", "never", "no", "nobody", "none", "nor", "not", "nothing", "nowhere",
    "shouldnt", "wasnt", "werent", "without", "wont", "wouldnt",
];

const BOOSTERS_UP: &[&str] = &[
    "absolutely", "completely", "deeply", "enormously", "especially", "exceptionally",
    "extremely", "highly", "hugely", "incredibly", "particularly", "quite", "really", "so",
    "thoroughly", "too", "totally", "truly", "utterly", "very",
];

const BOOSTERS_DOWN: &[&str] = &[
    "barely", "hardly", "less", "marginally", "partly", "scarcely", "slightly", "somewhat",
];

const BOOST: f64 = 0.293;
const BOOST_DECAY: [f64; 3] = [1.0, 0.95, 0.9];
const NEGATION_SCALAR: f64 = -0.74;
const EXCLAMATION_BOOST: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
const NORMALIZATION_ALPHA: f64 = 15.0;

/// Lexicon scorer with booster, negation, and `but` handling.
#[derive(Debug, Clone)]
pub struct LexiconPolarity {
    valences: HashMap<String, f64>,
}

impl Default for LexiconPolarity {
    fn default() -> Self {
        Self::from_entries(LEXICON.iter().map(|(w, v)| ((*w).to_string(), *v)))
    }
}

impl LexiconPolarity {
    pub fn from_entries(entries: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self {
            valences: entries
                .into_iter()
                .map(|(word, valence)| (word.to_lowercase(), valence))
                .collect(),
        }
    }

    /// Build the scorer, replacing the built-in lexicon with a tab-separated
    /// `token<TAB>mean[<TAB>...]` file when a path is given.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::ResourceMissing`] or
    /// [`SentimentError::ResourceIo`] if the file cannot be read, and
    /// [`SentimentError::ResourceParse`] (1-based line) for a malformed entry.
    pub fn load(lexicon: Option<&Path>) -> Result<Self, SentimentError> {
        let Some(path) = lexicon else {
            return Ok(Self::default());
        };
        let content = read_resource(path)?;
        let mut entries = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split('\t');
            let token = fields.next().unwrap_or_default().trim();
            let parse_err = |reason: String| SentimentError::ResourceParse {
                path: path.to_path_buf(),
                line: idx + 1,
                reason,
            };
            let mean = fields
                .next()
                .ok_or_else(|| parse_err("expected token<TAB>mean".to_string()))?;
            let mean: f64 = mean
                .trim()
                .parse()
                .map_err(|e| parse_err(format!("bad valence {mean:?}: {e}")))?;
            if token.is_empty() {
                return Err(parse_err("empty token".to_string()));
            }
            entries.push((token.to_string(), mean));
        }
        tracing::info!(path = %path.display(), count = entries.len(), "loaded polarity lexicon");
        Ok(Self::from_entries(entries))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.valences.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.valences.is_empty()
    }

    #[must_use]
    pub fn valence(&self, word: &str) -> Option<f64> {
        self.valences.get(word).copied()
    }

    /// Unnormalized valence sum.
    fn raw_sum(&self, text: &str) -> f64 {
        let words: Vec<String> = text
            .split_whitespace()
            .map(|w| {
                w.chars()
                    .filter(|c| c.is_alphanumeric())
                    .collect::<String>()
                    .to_lowercase()
            })
            .filter(|w| !w.is_empty())
            .collect();

        let but_at = words.iter().position(|w| w == "but");
        let mut sum = 0.0;

        for (i, word) in words.iter().enumerate() {
            let Some(base) = self.valence(word) else {
                continue;
            };
            let mut valence = base;
            for (distance, decay) in BOOST_DECAY.iter().enumerate() {
                let Some(j) = i.checked_sub(distance + 1) else {
                    break;
                };
                valence += booster(&words[j], base) * decay;
            }
            if words[i.saturating_sub(3)..i]
                .iter()
                .any(|w| NEGATIONS.contains(&w.as_str()))
            {
                valence *= NEGATION_SCALAR;
            }
            if let Some(pivot) = but_at {
                if i < pivot {
                    valence *= 0.5;
                } else if i > pivot {
                    valence *= 1.5;
                }
            }
            sum += valence;
        }

        let exclamations = text.matches('!').count().min(MAX_EXCLAMATIONS);
        #[allow(clippy::cast_precision_loss)]
        let emphasis = exclamations as f64 * EXCLAMATION_BOOST;
        if sum > 0.0 {
            sum += emphasis;
        } else if sum < 0.0 {
            sum -= emphasis;
        }
        sum
    }
}

impl PolarityScorer for LexiconPolarity {
    fn compound(&self, text: &str) -> f64 {
        squash(self.raw_sum(text))
    }
}

/// Booster contribution of `word` to a token with base valence `base`.
fn booster(word: &str, base: f64) -> f64 {
    let magnitude = if BOOSTERS_UP.contains(&word) {
        BOOST
    } else if BOOSTERS_DOWN.contains(&word) {
        -BOOST
    } else {
        return 0.0;
    };
    if base < 0.0 {
        -magnitude
    } else {
        magnitude
    }
}

/// `s / sqrt(s^2 + alpha)`, clamped to `[-1.0, 1.0]`.
fn squash(sum: f64) -> f64 {
    if sum == 0.0 {
        return 0.0;
    }
    (sum / (sum * sum + NORMALIZATION_ALPHA).sqrt()).clamp(-1.0, 1.0)
}
