//! Scripted completion engine for testing
//!
//! This module provides a test double for the CompletionEngine trait for use
//! in unit tests only. It is not available in production builds.

#![cfg(test)]

use super::errors::ChatResult;
use super::traits::CompletionEngine;
use super::types::GenerationConfig;
use std::sync::{Arc, Mutex};

type Script = dyn Fn(&str, &GenerationConfig) -> ChatResult<String> + Send + Sync;

/// Engine that answers from a script and records every call
#[derive(Clone)]
pub struct ScriptedEngine {
    script: Arc<Script>,
    defaults: GenerationConfig,
    call_history: Arc<Mutex<Vec<(String, GenerationConfig)>>>,
}

impl ScriptedEngine {
    /// Create an engine driven by an arbitrary closure
    pub fn new(
        script: impl Fn(&str, &GenerationConfig) -> ChatResult<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Arc::new(script),
            defaults: GenerationConfig::default(),
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Reply `guard_reply` to guard-configured calls and `answer_reply` otherwise
    pub fn guard_and_answer(guard_reply: &str, answer_reply: &str) -> Self {
        let guard_reply = guard_reply.to_string();
        let answer_reply = answer_reply.to_string();
        Self::new(move |_, config| {
            if *config == GenerationConfig::guard() {
                Ok(guard_reply.clone())
            } else {
                Ok(answer_reply.clone())
            }
        })
    }

    /// Get the history of calls made to this engine
    pub fn calls(&self) -> Vec<(String, GenerationConfig)> {
        self.call_history.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.call_history.lock().unwrap().len()
    }
}

impl CompletionEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_config(&self) -> GenerationConfig {
        self.defaults
    }

    fn generate(&self, prompt: &str, config: &GenerationConfig) -> ChatResult<String> {
        self.call_history.lock().unwrap().push((prompt.to_string(), *config));
        (self.script)(prompt, config).map(|text| text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::errors::ChatError;

    #[test]
    fn test_scripted_engine_records_calls() {
        let engine = ScriptedEngine::guard_and_answer("ALLOWED", "  an answer \n");

        let guard = engine.generate("guard prompt", &GenerationConfig::guard()).unwrap();
        assert_eq!(guard, "ALLOWED");

        let answer = engine.generate("answer prompt", &engine.default_config()).unwrap();
        assert_eq!(answer, "an answer");

        let calls = engine.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "guard prompt");
        assert_eq!(calls[1].1, GenerationConfig::default());
    }

    #[test]
    fn test_scripted_engine_error() {
        let engine = ScriptedEngine::new(|_, _| Err(ChatError::generation("model unavailable")));
        let result = engine.generate("prompt", &GenerationConfig::guard());
        assert!(result.unwrap_err().to_string().contains("model unavailable"));
        assert_eq!(engine.call_count(), 1);
    }
}
