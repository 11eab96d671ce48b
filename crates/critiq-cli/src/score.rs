//! `critiq score`: rule-based sentiment for every comment in a table.

use std::path::Path;

use anyhow::Context;
use critiq_core::AppConfig;
use critiq_sentiment::{SentimentBatch, SentimentScorer, SentimentSummary};
use serde::Serialize;

use crate::resolve::{build_resolver, read_table};

#[derive(Debug, Serialize)]
pub(crate) struct SummaryOutput<'a> {
    pub overall_score: f64,
    pub summary: &'a SentimentSummary,
}

pub(crate) fn render(batch: &SentimentBatch, summary_only: bool) -> anyhow::Result<String> {
    let json = if summary_only {
        serde_json::to_string_pretty(&SummaryOutput {
            overall_score: batch.overall_score,
            summary: &batch.summary,
        })?
    } else {
        serde_json::to_string_pretty(batch)?
    };
    Ok(json)
}

pub(crate) fn run_score(config: &AppConfig, file: &Path, summary_only: bool) -> anyhow::Result<()> {
    let scorer = SentimentScorer::load(config.stopwords_path.as_deref(), config.lexicon_path.as_deref())
        .context("failed to load sentiment resources")?;
    let resolver = build_resolver(config)?;
    let table = read_table(file)?;

    let batch = scorer
        .score_table(&resolver, &table)
        .with_context(|| format!("cannot score {}", file.display()))?;
    println!("{}", render(&batch, summary_only)?);
    Ok(())
}
