//! Conversation layer
//!
//! Owns the visible transcript and moves questions off the UI thread. The
//! UI thread only ever touches the transcript; inference happens on a
//! worker and comes back as one message per request.

pub mod runner;
pub mod view;

#[cfg(test)]
mod tests;

pub use runner::{AsyncRequestRunner, Reply};
pub use view::ConversationView;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    User,
    Assistant,
}

/// One immutable entry in the transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Zero-based position in the transcript
    pub position: usize,
    pub origin: Origin,
    pub text: String,
    /// Set when the assistant turn reports a failed request
    pub failed: bool,
    pub created_at: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn is_user(&self) -> bool {
        self.origin == Origin::User
    }
}

/// Write path into the visible transcript
pub trait TranscriptRenderer {
    /// Show a newly appended message
    fn render(&mut self, message: &ConversationMessage);

    /// Reflect whether the user may type; disabled while a request is pending
    fn set_input_enabled(&mut self, enabled: bool);
}

/// Renderer that discards everything
#[derive(Debug, Default)]
pub struct NullRenderer;

impl TranscriptRenderer for NullRenderer {
    fn render(&mut self, _message: &ConversationMessage) {}

    fn set_input_enabled(&mut self, _enabled: bool) {}
}
