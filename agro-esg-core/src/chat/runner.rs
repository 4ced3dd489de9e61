//! Single-flight execution of orchestrator calls off the UI thread
//!
//! `submit` hands the question to a blocking worker and keeps the callback on
//! the submitting side. The worker sends its reply back over a channel; the
//! UI loop drains it with `dispatch_next` or `try_dispatch`, so callbacks
//! always run on the thread that owns the runner.

use crate::llm::{ChatError, ChatResult, Orchestrator};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Result delivered to a completion callback
pub type Reply = ChatResult<String>;

/// The one request allowed in flight
struct PendingRequest {
    id: Uuid,
    submitted_at: Instant,
    on_complete: Box<dyn FnOnce(Reply)>,
}

/// Message from the worker back to the UI side
struct Completion {
    id: Uuid,
    reply: Reply,
}

pub struct AsyncRequestRunner {
    orchestrator: Arc<Orchestrator>,
    handle: Handle,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    pending: Option<PendingRequest>,
}

impl AsyncRequestRunner {
    /// Create a runner whose workers run on `handle`'s blocking pool
    pub fn new(orchestrator: Arc<Orchestrator>, handle: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { orchestrator, handle, tx, rx, pending: None }
    }

    /// Create a runner on the ambient tokio runtime
    pub fn from_current(orchestrator: Arc<Orchestrator>) -> ChatResult<Self> {
        let handle = Handle::try_current()
            .map_err(|e| ChatError::config(format!("No async runtime available: {}", e)))?;
        Ok(Self::new(orchestrator, handle))
    }

    /// Whether a request is in flight
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Start answering `question`.
    ///
    /// Returns false without doing anything when a request is already in
    /// flight; the earlier request keeps its callback.
    pub fn submit(&mut self, question: impl Into<String>, on_complete: impl FnOnce(Reply) + 'static) -> bool {
        if self.pending.is_some() {
            debug!("Request already in flight, ignoring submission");
            return false;
        }

        let id = Uuid::new_v4();
        let question = question.into();
        let orchestrator = self.orchestrator.clone();
        let tx = self.tx.clone();

        self.pending =
            Some(PendingRequest { id, submitted_at: Instant::now(), on_complete: Box::new(on_complete) });
        info!("Submitted request {}", id);

        self.handle.spawn_blocking(move || {
            let reply = panic::catch_unwind(AssertUnwindSafe(|| orchestrator.ask(&question)))
                .unwrap_or_else(|_| Err(ChatError::generation("Worker panicked during generation")));
            // receiver lives as long as the runner; a closed channel means nobody is waiting
            let _ = tx.send(Completion { id, reply });
        });

        true
    }

    /// Wait for the in-flight request and run its callback.
    ///
    /// Returns false immediately when nothing is pending.
    pub async fn dispatch_next(&mut self) -> bool {
        while self.pending.is_some() {
            match self.rx.recv().await {
                Some(completion) => {
                    if self.complete(completion) {
                        return true;
                    }
                }
                None => break,
            }
        }
        false
    }

    /// Run the callback if the in-flight request has finished, without waiting
    pub fn try_dispatch(&mut self) -> bool {
        while let Ok(completion) = self.rx.try_recv() {
            if self.complete(completion) {
                return true;
            }
        }
        false
    }

    /// Time the in-flight request has been running
    pub fn pending_for(&self) -> Option<Duration> {
        self.pending.as_ref().map(|p| p.submitted_at.elapsed())
    }

    fn complete(&mut self, completion: Completion) -> bool {
        let Some(pending) = self.pending.take_if(|p| p.id == completion.id) else {
            error!("Dropping reply for unknown request {}", completion.id);
            return false;
        };

        match &completion.reply {
            Ok(_) => info!("Request {} finished in {:?}", pending.id, pending.submitted_at.elapsed()),
            Err(e) => error!("Request {} failed: {}", pending.id, e),
        }

        (pending.on_complete)(completion.reply);
        true
    }
}
