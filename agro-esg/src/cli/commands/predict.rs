//! Predict a record's sustainability index

use super::train::train;
use crate::cli::app::PredictArgs;
use agro_esg_core::AppConfig;
use agro_esg_core::predict::{FarmRecord, RecordStore, SaveChoice};
use anyhow::{Context, Result};
use std::path::Path;

pub async fn execute(args: PredictArgs, config: AppConfig) -> Result<()> {
    let choice = args.save.as_deref().map(str::parse::<SaveChoice>).transpose()?;
    let record = match &args.input {
        Some(path) => read_record(path)?,
        None => FarmRecord::sample(),
    };
    record.validate()?;

    let (predictors, _) = train(&config).await?;
    let predictions = predictors.predict_all(&record)?;

    println!("Record {} ({})", record.company, record.sector);
    println!("  decision tree:     {:.2}", predictions.tree);
    println!("  mlp:               {:.2}", predictions.mlp);
    println!("  gradient boosting: {:.2}", predictions.boosting);

    if let Some(choice) = choice {
        let store = RecordStore::new(&config.dataset.path);
        let rows = store.save(&record, &predictions, choice)?;
        println!("\nSaved {} row(s) to {}", rows.len(), store.path().display());
    }

    Ok(())
}

fn read_record(path: &Path) -> Result<FarmRecord> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read record {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Invalid record file {}", path.display()))
}
