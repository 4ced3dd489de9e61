//! Common types for the guard-and-answer pipeline
//!
//! This module defines the generation parameters passed to a completion
//! engine and the values produced while a question moves through the
//! pipeline.

use super::errors::{ChatError, ChatResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameters for a single generation call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Upper bound on newly generated tokens
    pub max_new_tokens: usize,

    /// Softmax temperature; zero means greedy decoding
    pub temperature: f64,

    /// Sample from the distribution instead of taking the argmax
    pub do_sample: bool,
}

impl GenerationConfig {
    /// Create a config whose sampling flag follows the temperature
    pub fn new(max_new_tokens: usize, temperature: f64) -> Self {
        Self { max_new_tokens, temperature, do_sample: temperature > 0.0 }
    }

    /// Short deterministic config used for classification prompts
    pub fn guard() -> Self {
        Self { max_new_tokens: 5, temperature: 0.0, do_sample: false }
    }

    /// Explicitly override the sampling flag
    pub fn with_sampling(mut self, do_sample: bool) -> Self {
        self.do_sample = do_sample;
        self
    }

    /// Whether decoding must take the most likely token at each step.
    ///
    /// Sampling at temperature zero is undefined, so it decodes greedily
    /// even when `do_sample` is set.
    pub fn is_greedy(&self) -> bool {
        !self.do_sample || self.temperature <= 0.0
    }

    /// Check the input constraints of a generation call
    pub fn validate(&self) -> ChatResult<()> {
        if self.max_new_tokens == 0 {
            return Err(ChatError::invalid_request("max_new_tokens must be greater than zero"));
        }
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(ChatError::invalid_request(format!(
                "temperature must be a finite value >= 0, got {}",
                self.temperature
            )));
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(500, 0.2)
    }
}

/// Outcome of the guard stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Allowed,
    Blocked,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Allowed => write!(f, "ALLOWED"),
            Verdict::Blocked => write!(f, "BLOCKED"),
        }
    }
}

/// States a single `ask` call moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineState {
    Idle,
    Guarding,
    BlockedExit,
    Answering,
    Done,
}

/// Full result of one pass through the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub verdict: Verdict,
    pub text: String,
    pub path: Vec<PipelineState>,
}
