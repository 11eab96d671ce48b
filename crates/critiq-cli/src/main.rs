use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod resolve;
mod score;
mod train;

#[derive(Debug, Parser)]
#[command(name = "critiq")]
#[command(about = "Column resolution, comment sentiment, and classifier training")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Infer the comment, timestamp, category, and id columns of a table
    Resolve {
        /// CSV or TSV file
        file: PathBuf,
    },
    /// Resolve a table and score the sentiment of every comment
    Score {
        /// CSV or TSV file
        file: PathBuf,

        /// Print only the overall score and label distribution
        #[arg(long)]
        summary_only: bool,
    },
    /// Train the forest and BERT classifiers on the labeled corpus
    Train {
        /// First corpus root (defaults to `CRITIQ_DATA_DIR`)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Second corpus root (defaults to `CRITIQ_GOLD_DIR`)
        #[arg(long)]
        gold_dir: Option<PathBuf>,

        /// Artifact root (defaults to `CRITIQ_MODELS_DIR`)
        #[arg(long)]
        models_dir: Option<PathBuf>,

        /// Train only the forest
        #[arg(long)]
        skip_deep: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let config = critiq_core::load_app_config().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.log_level))
                .context("invalid log filter")?,
        )
        .init();
    tracing::debug!(env = %config.env, "configuration loaded");

    let cli = Cli::parse();
    match cli.command {
        Commands::Resolve { file } => resolve::run_resolve(&config, &file),
        Commands::Score { file, summary_only } => score::run_score(&config, &file, summary_only),
        Commands::Train {
            data_dir,
            gold_dir,
            models_dir,
            skip_deep,
        } => train::run_train(
            &config,
            &train::TrainArgs {
                data_dir,
                gold_dir,
                models_dir,
                skip_deep,
            },
        ),
    }
}
