//! One-shot question command

use super::{build_orchestrator, spinner};
use crate::cli::app::AskArgs;
use agro_esg_core::AppConfig;
use anyhow::{Context, Result};
use tracing::debug;

pub async fn execute(args: AskArgs, config: AppConfig) -> Result<()> {
    let orchestrator = build_orchestrator(&config).await?;
    let question = args.text();

    let bar = spinner("Thinking");
    let outcome = tokio::task::spawn_blocking(move || orchestrator.run(&question)).await;
    bar.finish_and_clear();

    let outcome = outcome.context("Generation task failed")??;
    debug!("Verdict {} via {:?}", outcome.verdict, outcome.path);
    println!("{}", outcome.text);
    Ok(())
}
