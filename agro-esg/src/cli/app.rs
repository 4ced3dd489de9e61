use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "agro-esg",
    version,
    about = "Agro ESG - Local assistant for sustainable agriculture",
    long_about = "Agro ESG answers agriculture and ESG questions with a local language model, screening every question with a guard pass first, and predicts farm sustainability indices from operational data."
)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive conversation
    #[command(about = "Chat with the assistant (type /quit to leave)")]
    Chat,

    /// Ask a single question
    #[command(about = "Ask one question and print the answer")]
    Ask(AskArgs),

    /// Train the sustainability-index predictors
    #[command(about = "Train the predictors on the dataset and report held-out metrics")]
    Train,

    /// Predict the sustainability index of a farm record
    #[command(about = "Predict a record's sustainability index with every model")]
    Predict(PredictArgs),
}

#[derive(Parser, Debug)]
pub struct AskArgs {
    /// Question to ask
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,
}

impl AskArgs {
    pub fn text(&self) -> String {
        self.question.join(" ")
    }
}

#[derive(Parser, Debug)]
pub struct PredictArgs {
    /// TOML file holding the record; the built-in sample is used when omitted
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Append the record to the dataset (tree, mlp, boosting, all or user)
    #[arg(short, long)]
    pub save: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask_joins_words() {
        let cli = Cli::parse_from(["agro-esg", "-vv", "ask", "what", "is", "soil", "erosion?"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Ask(args) => assert_eq!(args.text(), "what is soil erosion?"),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_predict() {
        let cli = Cli::parse_from(["agro-esg", "predict", "--save", "all", "-c", "custom.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        match cli.command {
            Commands::Predict(args) => {
                assert_eq!(args.save.as_deref(), Some("all"));
                assert!(args.input.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
