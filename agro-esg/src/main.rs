use agro_esg_core::AppConfig;
use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Parse CLI arguments first to get verbosity level
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        2.. => "trace",
    };

    // stdout carries the transcript, logs go to stderr
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config = AppConfig::load_or_default(cli.config.as_deref())?;
    let runtime = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Chat => {
            info!("Starting conversation");
            runtime.block_on(cli::commands::chat::execute(config))?;
        }
        Commands::Ask(args) => {
            info!("Ask command: {:?}", args);
            runtime.block_on(cli::commands::ask::execute(args, config))?;
        }
        Commands::Train => {
            info!("Training predictors");
            runtime.block_on(cli::commands::train::execute(config))?;
        }
        Commands::Predict(args) => {
            info!("Predict command: {:?}", args);
            runtime.block_on(cli::commands::predict::execute(args, config))?;
        }
    }

    Ok(())
}
