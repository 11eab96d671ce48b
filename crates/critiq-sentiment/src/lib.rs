//! Rule-based comment sentiment for critiq.
//!
//! Normalizes comment text with an injected [`NlpPipeline`], scores it with a
//! [`PolarityScorer`], and maps the compound score onto a five-level label.
//! Both capabilities are constructed explicitly and shared read-only.

pub mod error;
pub mod nlp;
pub mod normalize;
pub mod polarity;
pub mod scorer;
pub mod types;

pub use error::SentimentError;
pub use nlp::{EnglishPipeline, NlpPipeline, Token};
pub use normalize::normalize;
pub use polarity::{LexiconPolarity, PolarityScorer};
pub use scorer::SentimentScorer;
pub use types::{SentimentBatch, SentimentLabel, SentimentResult, SentimentSummary, TextSentiment};
