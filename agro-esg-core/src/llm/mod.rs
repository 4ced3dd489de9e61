//! Local language model integration for the ESG assistant
//!
//! This module holds the guard-and-answer pipeline: a cheap, deterministic
//! classification call screens each question before the domain-constrained
//! model is allowed to produce a full answer.

pub mod answer;
pub mod candle;
pub mod config;
pub mod errors;
pub mod guard;
pub mod mock;
pub mod orchestrator;
pub mod prompts;
pub mod traits;
pub mod types;

pub use answer::AnswerStage;
pub use candle::CandleEngine;
pub use config::{ModelConfig, PromptsConfig};
pub use errors::{ChatError, ChatResult};
pub use guard::GuardStage;
pub use orchestrator::Orchestrator;
pub use prompts::{PromptCatalog, PromptTemplate};
pub use traits::{CompletionEngine, QuestionAnswerer, QuestionGuard};
pub use types::{GenerationConfig, PipelineOutcome, PipelineState, Verdict};
