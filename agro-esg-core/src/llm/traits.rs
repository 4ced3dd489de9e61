//! Traits at the seams of the chat pipeline
//!
//! A completion engine turns a rendered prompt into text. Guard and answer
//! stages are traits as well so the orchestrator can be composed from any
//! implementation.

use super::errors::ChatResult;
use super::types::{GenerationConfig, Verdict};

/// Causal text completion capability
///
/// Implementations block the calling thread for the whole generation, so
/// they are only ever driven from a worker thread.
pub trait CompletionEngine: Send + Sync {
    /// Get the name of this engine
    fn name(&self) -> &str;

    /// Parameters used when a caller has no specific requirements
    fn default_config(&self) -> GenerationConfig;

    /// Generate a completion for `prompt`.
    ///
    /// Only newly generated text is returned, trimmed. The prompt is never
    /// echoed back.
    fn generate(&self, prompt: &str, config: &GenerationConfig) -> ChatResult<String>;
}

/// Screens a question before any expensive generation
pub trait QuestionGuard: Send + Sync {
    fn check(&self, question: &str) -> ChatResult<Verdict>;
}

/// Produces the final answer for an allowed question
pub trait QuestionAnswerer: Send + Sync {
    fn answer(&self, question: &str) -> ChatResult<String>;
}
