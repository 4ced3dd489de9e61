//! Two-stage guard-and-answer orchestration
//!
//! Every `ask` starts from `Idle`, runs the guard, and either exits with the
//! catalog's rejection message or runs the answer stage. No state survives
//! between calls: each question is judged and answered on its own, without
//! earlier turns as context.

use super::answer::AnswerStage;
use super::errors::ChatResult;
use super::guard::GuardStage;
use super::prompts::{PromptCatalog, PromptTemplate};
use super::traits::{CompletionEngine, QuestionAnswerer, QuestionGuard};
use super::types::{PipelineOutcome, PipelineState, Verdict};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Sole entry point the conversation layer talks to
pub struct Orchestrator {
    guard: Box<dyn QuestionGuard>,
    answerer: Box<dyn QuestionAnswerer>,
    rejection_message: String,
}

impl Orchestrator {
    /// Build both stages over one engine from the prompt catalog.
    ///
    /// Fails with a configuration error when a catalog prompt introduces
    /// placeholders the pipeline cannot bind.
    pub fn new(engine: Arc<dyn CompletionEngine>, catalog: &PromptCatalog) -> ChatResult<Self> {
        let guard_template = PromptTemplate::guard(catalog.guard_prompt());
        guard_template.ensure_inputs(&["question"])?;

        let answer_template = PromptTemplate::answer(catalog.system_prompt());
        answer_template.ensure_inputs(&["question"])?;

        info!("Orchestrator ready on engine {}", engine.name());

        Ok(Self::with_stages(
            Box::new(GuardStage::new(engine.clone(), guard_template)),
            Box::new(AnswerStage::new(engine, answer_template)),
            catalog.rejection_message(),
        ))
    }

    /// Compose the pipeline from arbitrary stage implementations
    pub fn with_stages(
        guard: Box<dyn QuestionGuard>,
        answerer: Box<dyn QuestionAnswerer>,
        rejection_message: impl Into<String>,
    ) -> Self {
        Self { guard, answerer, rejection_message: rejection_message.into() }
    }

    /// Answer a question, or return the rejection message if it is blocked
    pub fn ask(&self, question: &str) -> ChatResult<String> {
        self.run(question).map(|outcome| outcome.text)
    }

    /// Run the pipeline and report the states it went through
    pub fn run(&self, question: &str) -> ChatResult<PipelineOutcome> {
        let started = Instant::now();
        let mut path = vec![PipelineState::Idle];

        transition(&mut path, PipelineState::Guarding);
        let verdict = self.guard.check(question).inspect_err(|e| warn!("Guard stage failed: {}", e))?;

        let text = match verdict {
            Verdict::Blocked => {
                transition(&mut path, PipelineState::BlockedExit);
                self.rejection_message.clone()
            }
            Verdict::Allowed => {
                transition(&mut path, PipelineState::Answering);
                self.answerer
                    .answer(question)
                    .inspect_err(|e| warn!("Answer stage failed: {}", e))?
            }
        };

        transition(&mut path, PipelineState::Done);
        debug!("Pipeline finished in {:?}", started.elapsed());

        Ok(PipelineOutcome { verdict, text, path })
    }

    pub fn rejection_message(&self) -> &str {
        &self.rejection_message
    }
}

fn transition(path: &mut Vec<PipelineState>, next: PipelineState) {
    if let Some(current) = path.last() {
        debug!("Pipeline {:?} -> {:?}", current, next);
    }
    path.push(next);
}
