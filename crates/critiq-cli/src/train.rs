//! `critiq train`: hybrid classifier training.

use std::path::PathBuf;

use anyhow::Context;
use critiq_core::AppConfig;
use critiq_train::{train_hybrid, FsArtifactStore, TrainConfig};

#[derive(Debug, Clone, Default)]
pub(crate) struct TrainArgs {
    pub data_dir: Option<PathBuf>,
    pub gold_dir: Option<PathBuf>,
    pub models_dir: Option<PathBuf>,
    pub skip_deep: bool,
}

/// Apply command-line overrides on top of the environment configuration.
pub(crate) fn train_config(config: &AppConfig, args: &TrainArgs) -> (TrainConfig, PathBuf) {
    let mut train = TrainConfig::from_app_config(config);
    if let Some(dir) = &args.data_dir {
        train.data_dir.clone_from(dir);
    }
    if let Some(dir) = &args.gold_dir {
        train.gold_dir.clone_from(dir);
    }
    if args.skip_deep {
        train.deep = None;
    }
    let models_dir = args
        .models_dir
        .clone()
        .unwrap_or_else(|| config.models_dir.clone());
    (train, models_dir)
}

pub(crate) fn run_train(config: &AppConfig, args: &TrainArgs) -> anyhow::Result<()> {
    let (train, models_dir) = train_config(config, args);
    let store = FsArtifactStore::new(&models_dir);
    tracing::info!(
        data_dir = %train.data_dir.display(),
        gold_dir = %train.gold_dir.display(),
        models_dir = %models_dir.display(),
        deep = train.deep.is_some(),
        "starting training run"
    );

    let outcome = train_hybrid(&train, &store).context("training run failed")?;

    println!("{}", outcome.report);
    for epoch in &outcome.deep_epochs {
        println!(
            "epoch {}: train loss {:.4}, validation loss {:.4}",
            epoch.epoch, epoch.train_loss, epoch.validation_loss
        );
    }
    println!(
        "run {} wrote {} artifacts under {}",
        outcome.manifest.run_id,
        outcome.manifest.artifacts.len(),
        models_dir.display()
    );
    Ok(())
}
