// Command implementations

pub mod ask;
pub mod chat;
pub mod predict;
pub mod train;

use agro_esg_core::AppConfig;
use agro_esg_core::llm::{CandleEngine, Orchestrator, PromptCatalog};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Spinner on stderr with a steady tick
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]") {
        bar.set_style(style);
    }
    bar.set_message(message.into());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Load the prompt catalog and the local model, then wire the pipeline
pub async fn build_orchestrator(config: &AppConfig) -> Result<Arc<Orchestrator>> {
    let catalog = PromptCatalog::from_file(&config.prompts.path)
        .with_context(|| format!("Failed to load prompt catalog {}", config.prompts.path.display()))?;

    let bar = spinner("Loading model");
    let model = config.model.clone();
    let engine = tokio::task::spawn_blocking(move || CandleEngine::load(&model)).await;
    bar.finish_and_clear();
    let engine = engine.context("Model loading task failed")?.context("Failed to load the language model")?;
    info!("Model loaded from {}", config.model.weights.display());

    let orchestrator = Orchestrator::new(Arc::new(engine), &catalog)?;
    Ok(Arc::new(orchestrator))
}
