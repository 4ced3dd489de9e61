//! Interactive conversation in the terminal

use super::{build_orchestrator, spinner};
use agro_esg_core::AppConfig;
use agro_esg_core::chat::{AsyncRequestRunner, ConversationMessage, ConversationView, TranscriptRenderer};
use anyhow::Result;
use indicatif::ProgressBar;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

const QUIT_COMMAND: &str = "/quit";

/// Prints assistant turns and shows a spinner while input is disabled
#[derive(Default)]
struct TerminalRenderer {
    spinner: Option<ProgressBar>,
}

impl TranscriptRenderer for TerminalRenderer {
    fn render(&mut self, message: &ConversationMessage) {
        // typed text is already on screen
        if message.is_user() {
            return;
        }
        if let Some(bar) = self.spinner.take() {
            bar.finish_and_clear();
        }
        if message.failed {
            eprintln!("assistant (error)> {}", message.text);
        } else {
            println!("assistant> {}\n", message.text);
        }
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        if enabled {
            if let Some(bar) = self.spinner.take() {
                bar.finish_and_clear();
            }
        } else if self.spinner.is_none() {
            self.spinner = Some(spinner("Thinking"));
        }
    }
}

pub async fn execute(config: AppConfig) -> Result<()> {
    let orchestrator = build_orchestrator(&config).await?;
    let runner = AsyncRequestRunner::from_current(orchestrator)?;
    let mut view = ConversationView::new(runner, Box::new(TerminalRenderer::default()));

    println!("Agro ESG assistant. Ask about sustainable agriculture, {} to leave.\n", QUIT_COMMAND);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if view.is_awaiting_reply() {
            view.process_next_reply().await;
            continue;
        }

        print!("you> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim() == QUIT_COMMAND {
            break;
        }
        view.submit_text(&line);
    }

    info!("Conversation ended after {} messages", view.len());
    Ok(())
}
