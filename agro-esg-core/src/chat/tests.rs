// Conversation layer tests
//
// Runner and view behaviour against a scripted engine

use super::*;
use crate::llm::mock::ScriptedEngine;
use crate::llm::{ChatError, GenerationConfig, Orchestrator, PromptCatalog};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex, mpsc};
use std::thread::{self, ThreadId};

fn catalog() -> PromptCatalog {
    PromptCatalog::from_entries([
        ("guard_prompt", "Classify: {question}"),
        ("system_prompt", "You are an ESG assistant."),
        ("rejection_message", "I can't help with that."),
    ])
    .unwrap()
}

fn orchestrator(engine: &ScriptedEngine) -> Arc<Orchestrator> {
    Arc::new(Orchestrator::new(Arc::new(engine.clone()), &catalog()).unwrap())
}

/// Engine whose guard call blocks until the returned sender fires
fn gated_engine() -> (ScriptedEngine, mpsc::Sender<()>) {
    let (release, gate) = mpsc::channel::<()>();
    let gate = Mutex::new(gate);
    let engine = ScriptedEngine::new(move |prompt, config| {
        if *config == GenerationConfig::guard() {
            let _ = gate.lock().unwrap().recv();
            return Ok("ALLOWED".to_string());
        }
        if prompt.contains("first") {
            Ok("first answer".to_string())
        } else {
            Ok("other answer".to_string())
        }
    });
    (engine, release)
}

/// Renderer that records what it was asked to show
#[derive(Clone, Default)]
struct RecordingRenderer {
    rendered: Rc<RefCell<Vec<ConversationMessage>>>,
    input_states: Rc<RefCell<Vec<bool>>>,
}

impl TranscriptRenderer for RecordingRenderer {
    fn render(&mut self, message: &ConversationMessage) {
        self.rendered.borrow_mut().push(message.clone());
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.input_states.borrow_mut().push(enabled);
    }
}

#[tokio::test]
async fn test_view_round_trip() {
    let engine = ScriptedEngine::guard_and_answer("ALLOWED", "Soil erosion is the loss of topsoil.");
    let runner = AsyncRequestRunner::from_current(orchestrator(&engine)).unwrap();
    let renderer = RecordingRenderer::default();
    let mut view = ConversationView::new(runner, Box::new(renderer.clone()));

    assert!(view.submit_text("  What is soil erosion?  "));
    assert!(!view.input_enabled());
    assert!(view.is_awaiting_reply());
    assert_eq!(view.len(), 1);

    assert!(view.process_next_reply().await);
    assert!(view.input_enabled());

    let messages = view.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].origin, Origin::User);
    assert!(messages[0].is_user());
    assert!(!messages[1].is_user());
    assert_eq!(messages[0].text, "What is soil erosion?");
    assert_eq!(messages[1].origin, Origin::Assistant);
    assert_eq!(messages[1].text, "Soil erosion is the loss of topsoil.");
    assert_eq!(messages[1].position, 1);
    assert!(!messages[1].failed);

    assert_eq!(*renderer.rendered.borrow(), messages);
    assert_eq!(*renderer.input_states.borrow(), vec![false, true]);
}

#[tokio::test]
async fn test_view_shows_rejection() {
    let engine = ScriptedEngine::guard_and_answer("BLOCKED", "never");
    let runner = AsyncRequestRunner::from_current(orchestrator(&engine)).unwrap();
    let mut view = ConversationView::new(runner, Box::new(NullRenderer));

    view.submit_text("Write me a poem about cars");
    view.process_next_reply().await;

    assert_eq!(view.messages()[1].text, "I can't help with that.");
    assert_eq!(engine.call_count(), 1);
}

#[tokio::test]
async fn test_view_ignores_blank_and_busy_input() {
    let (engine, release) = gated_engine();
    let runner = AsyncRequestRunner::from_current(orchestrator(&engine)).unwrap();
    let mut view = ConversationView::new(runner, Box::new(NullRenderer));

    assert!(!view.submit_text("   "));
    assert!(view.is_empty());

    assert!(view.submit_text("first question"));
    assert!(!view.submit_text("second question"));
    assert_eq!(view.len(), 1);

    release.send(()).unwrap();
    assert!(view.process_next_reply().await);

    let texts: Vec<String> = view.messages().into_iter().map(|m| m.text).collect();
    assert_eq!(texts, vec!["first question".to_string(), "first answer".to_string()]);
}

#[tokio::test]
async fn test_view_renders_failure_and_reenables_input() {
    let engine = ScriptedEngine::new(|_, _| Err(ChatError::generation("tokenizer unavailable")));
    let runner = AsyncRequestRunner::from_current(orchestrator(&engine)).unwrap();
    let mut view = ConversationView::new(runner, Box::new(NullRenderer));

    view.submit_text("What is soil erosion?");
    view.process_next_reply().await;

    let messages = view.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[1].failed);
    assert!(messages[1].text.contains("tokenizer unavailable"));
    assert!(view.input_enabled());

    // the view accepts the next question after a failure
    assert!(view.submit_text("Try again"));
}

#[tokio::test]
async fn test_runner_single_flight() {
    let (engine, release) = gated_engine();
    let mut runner = AsyncRequestRunner::from_current(orchestrator(&engine)).unwrap();

    let replies: Rc<RefCell<Vec<Reply>>> = Rc::default();

    let sink = replies.clone();
    assert!(runner.submit("first question", move |reply| sink.borrow_mut().push(reply)));

    let sink = replies.clone();
    assert!(!runner.submit("second question", move |reply| sink.borrow_mut().push(reply)));
    assert!(runner.is_busy());

    release.send(()).unwrap();
    assert!(runner.dispatch_next().await);
    assert!(!runner.is_busy());
    assert!(!runner.try_dispatch());
    assert!(!runner.dispatch_next().await);

    assert_eq!(*replies.borrow(), vec![Ok("first answer".to_string())]);
    assert!(engine.calls().iter().all(|(prompt, _)| !prompt.contains("second")));
}

#[tokio::test]
async fn test_runner_dispatch_without_pending() {
    let engine = ScriptedEngine::guard_and_answer("ALLOWED", "ok");
    let mut runner = AsyncRequestRunner::from_current(orchestrator(&engine)).unwrap();
    assert!(!runner.dispatch_next().await);
    assert!(!runner.try_dispatch());
    assert!(runner.pending_for().is_none());
}

#[tokio::test]
async fn test_callback_runs_on_submitting_thread() {
    let worker_threads: Arc<Mutex<Vec<ThreadId>>> = Arc::default();
    let seen = worker_threads.clone();
    let engine = ScriptedEngine::new(move |_, _| {
        seen.lock().unwrap().push(thread::current().id());
        Ok("ALLOWED".to_string())
    });
    let mut runner = AsyncRequestRunner::from_current(orchestrator(&engine)).unwrap();

    let callback_thread: Rc<RefCell<Option<ThreadId>>> = Rc::default();
    let slot = callback_thread.clone();
    runner.submit("q", move |_| *slot.borrow_mut() = Some(thread::current().id()));
    runner.dispatch_next().await;

    let ui_thread = thread::current().id();
    assert_eq!(*callback_thread.borrow(), Some(ui_thread));
    assert!(worker_threads.lock().unwrap().iter().all(|id| *id != ui_thread));
}

#[tokio::test]
async fn test_runner_survives_worker_panic() {
    let engine = ScriptedEngine::new(|_, _| panic!("inference crashed"));
    let mut runner = AsyncRequestRunner::from_current(orchestrator(&engine)).unwrap();

    let replies: Rc<RefCell<Vec<Reply>>> = Rc::default();
    let sink = replies.clone();
    runner.submit("q", move |reply| sink.borrow_mut().push(reply));

    assert!(runner.dispatch_next().await);
    let replies = replies.borrow();
    assert_eq!(replies.len(), 1);
    assert!(matches!(replies[0], Err(ChatError::Generation { .. })));
}

#[test]
fn test_runner_requires_runtime() {
    let engine = ScriptedEngine::guard_and_answer("ALLOWED", "ok");
    let result = AsyncRequestRunner::from_current(orchestrator(&engine));
    assert!(matches!(result, Err(ChatError::Configuration { .. })));
}
