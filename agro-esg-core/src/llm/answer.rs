//! Answer stage: full-length, sampled generation for allowed questions

use super::errors::ChatResult;
use super::prompts::PromptTemplate;
use super::traits::{CompletionEngine, QuestionAnswerer};
use std::sync::Arc;
use tracing::debug;

pub struct AnswerStage {
    engine: Arc<dyn CompletionEngine>,
    template: PromptTemplate,
}

impl AnswerStage {
    pub fn new(engine: Arc<dyn CompletionEngine>, template: PromptTemplate) -> Self {
        Self { engine, template }
    }
}

impl QuestionAnswerer for AnswerStage {
    fn answer(&self, question: &str) -> ChatResult<String> {
        let prompt = self.template.render(&[("question", question)])?;
        let config = self.engine.default_config();
        debug!("Answering with {} (max {} tokens)", self.engine.name(), config.max_new_tokens);
        self.engine.generate(&prompt, &config)
    }
}
