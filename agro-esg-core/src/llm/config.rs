//! Configuration for the local language model and its prompts

use super::types::GenerationConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Local model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the quantized GGUF weights (llama or gemma3 architecture)
    pub weights: PathBuf,

    /// Path to the Hugging Face `tokenizer.json`
    pub tokenizer: PathBuf,

    /// Token strings that end generation; unknown ones are skipped
    pub eos_tokens: Vec<String>,

    /// Seed for the sampler
    pub seed: u64,

    /// Default token budget for answers
    pub max_new_tokens: usize,

    /// Default sampling temperature for answers
    pub temperature: f64,
}

impl ModelConfig {
    /// Generation parameters used by the answer stage
    pub fn default_generation(&self) -> GenerationConfig {
        GenerationConfig::new(self.max_new_tokens, self.temperature)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            weights: PathBuf::from("models/gemma-3-1b-ft.gguf"),
            tokenizer: PathBuf::from("models/tokenizer.json"),
            eos_tokens: vec!["<eos>".to_string(), "<end_of_turn>".to_string(), "</s>".to_string()],
            seed: 299_792_458,
            max_new_tokens: 500,
            temperature: 0.2,
        }
    }
}

/// Location of the prompt catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub path: PathBuf,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self { path: PathBuf::from("config/prompts.yaml") }
    }
}
