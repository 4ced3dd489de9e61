//! Train the predictors and report held-out metrics

use super::spinner;
use agro_esg_core::AppConfig;
use agro_esg_core::predict::{Dataset, Predictors, TrainingReport};
use anyhow::{Context, Result};

pub async fn execute(config: AppConfig) -> Result<()> {
    let (_, report) = train(&config).await?;
    print_report(&report);
    Ok(())
}

/// Load the dataset and train all three models off the async threads
pub async fn train(config: &AppConfig) -> Result<(Predictors, TrainingReport)> {
    let dataset = Dataset::from_csv(&config.dataset.path)
        .with_context(|| format!("Failed to read dataset {}", config.dataset.path.display()))?;

    let bar = spinner(format!("Training on {} records", dataset.len()));
    let split = config.dataset.clone();
    let training = config.training.clone();
    let result = tokio::task::spawn_blocking(move || Predictors::train(&dataset, &split, &training)).await;
    bar.finish_and_clear();

    Ok(result.context("Training task failed")??)
}

fn print_report(report: &TrainingReport) {
    println!("Trained on {} records, evaluated on {}\n", report.train_size, report.test_size);
    println!("{:<20} {:>10} {:>10} {:>10}", "model", "MAE", "MSE", "R2");
    for (name, metrics) in &report.models {
        println!("{:<20} {:>10.4} {:>10.4} {:>10.4}", name, metrics.mae, metrics.mse, metrics.r2);
    }
}
