//! Guard stage: cheap classification that gates the answer stage

use super::errors::ChatResult;
use super::prompts::PromptTemplate;
use super::traits::{CompletionEngine, QuestionGuard};
use super::types::{GenerationConfig, Verdict};
use prompt_utils::verdict::mentions_blocked;
use std::sync::Arc;
use tracing::{debug, info};

/// Classifies questions as allowed or blocked with one short generation
pub struct GuardStage {
    engine: Arc<dyn CompletionEngine>,
    template: PromptTemplate,
}

impl GuardStage {
    pub fn new(engine: Arc<dyn CompletionEngine>, template: PromptTemplate) -> Self {
        Self { engine, template }
    }

    /// Map a guard completion to a verdict.
    ///
    /// Substring match: any completion mentioning BLOCKED blocks the
    /// question, so verbose replies like "blocked due to policy" still count.
    pub fn classify(completion: &str) -> Verdict {
        if mentions_blocked(completion) { Verdict::Blocked } else { Verdict::Allowed }
    }
}

impl QuestionGuard for GuardStage {
    fn check(&self, question: &str) -> ChatResult<Verdict> {
        let prompt = self.template.render(&[("question", question)])?;
        let completion = self.engine.generate(&prompt, &GenerationConfig::guard())?;
        debug!("Guard completion: {:?}", completion);

        let verdict = Self::classify(&completion);
        info!("Guard verdict: {}", verdict);
        Ok(verdict)
    }
}
