//! Conversation view: ordered transcript plus the input gate

use super::runner::{AsyncRequestRunner, Reply};
use super::{ConversationMessage, Origin, TranscriptRenderer};
use chrono::Utc;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, warn};

/// UI-thread state shared with the completion callback
struct ViewState {
    messages: Vec<ConversationMessage>,
    input_enabled: bool,
    renderer: Box<dyn TranscriptRenderer>,
}

impl ViewState {
    fn append(&mut self, origin: Origin, text: String, failed: bool) {
        let message = ConversationMessage {
            position: self.messages.len(),
            origin,
            text,
            failed,
            created_at: Utc::now(),
        };
        self.renderer.render(&message);
        self.messages.push(message);
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
        self.renderer.set_input_enabled(enabled);
    }

    fn on_reply(&mut self, reply: Reply) {
        match reply {
            Ok(text) => self.append(Origin::Assistant, text, false),
            Err(e) => {
                warn!("Showing failed turn: {}", e);
                self.append(Origin::Assistant, format!("Sorry, something went wrong: {}", e), true);
            }
        }
        self.set_input_enabled(true);
    }
}

/// Append-only transcript that feeds questions to the runner
pub struct ConversationView {
    state: Rc<RefCell<ViewState>>,
    runner: AsyncRequestRunner,
}

impl ConversationView {
    pub fn new(runner: AsyncRequestRunner, renderer: Box<dyn TranscriptRenderer>) -> Self {
        let state = ViewState { messages: Vec::new(), input_enabled: true, renderer };
        Self { state: Rc::new(RefCell::new(state)), runner }
    }

    /// Submit user text.
    ///
    /// Blank text and submissions while a request is pending are ignored and
    /// return false.
    pub fn submit_text(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        if !self.state.borrow().input_enabled || self.runner.is_busy() {
            debug!("Input disabled, ignoring submission");
            return false;
        }

        {
            let mut state = self.state.borrow_mut();
            state.append(Origin::User, text.to_string(), false);
            state.set_input_enabled(false);
        }

        let state = Rc::clone(&self.state);
        let accepted = self.runner.submit(text, move |reply| state.borrow_mut().on_reply(reply));
        if !accepted {
            self.state.borrow_mut().set_input_enabled(true);
        }
        accepted
    }

    /// Wait for the pending reply and append it; false when nothing is pending
    pub async fn process_next_reply(&mut self) -> bool {
        self.runner.dispatch_next().await
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.runner.is_busy()
    }

    pub fn input_enabled(&self) -> bool {
        self.state.borrow().input_enabled
    }

    /// Snapshot of the transcript
    pub fn messages(&self) -> Vec<ConversationMessage> {
        self.state.borrow().messages.clone()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
