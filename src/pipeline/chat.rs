//! Conversation orchestration.
//!
//! `ChatSession` is the single owner of the document set, the ordered turn
//! log, and the `busy` request gate. Every mutation goes through the
//! transitions below, split reducer-style so each one is synchronous:
//!
//! - `begin`   — Idle → AwaitingResponse: append user turn + pending
//!   placeholder, raise the gate, snapshot instruction/history/query.
//! - `resolve` — AwaitingResponse → Idle: reconcile the placeholder in
//!   place (success or failure), drop the gate.
//!
//! `send` composes the two around one adapter call. The gate is the sole
//! mutual exclusion: on a single cooperative runtime, at most one
//! invocation is outstanding, so at most one turn is ever pending. There
//! is no queueing, no cancellation, and no timeout at this layer.

use uuid::Uuid;

use crate::models::{HistoryEntry, IngestedDocument, Turn};
use crate::pipeline::context::build_instruction;
use crate::pipeline::gemini::{AdapterError, ModelInvoker};

/// Shown in place of an empty model payload.
pub const EMPTY_RESPONSE_FALLBACK: &str = "No response generated.";

/// Fixed user-facing text for any failed invocation. The root cause is
/// logged but never carried into the turn.
pub const REQUEST_FAILED_MESSAGE: &str =
    "Sorry, I encountered an error processing your request.";

/// Opening assistant turn of every fresh session.
pub const GREETING: &str = "Hello! I am your RAG assistant. Upload your documents, \
and I will answer questions based on their content.";

/// Everything needed to run one model invocation for a pending turn.
///
/// The instruction is rebuilt from the live document set on every `begin`,
/// never cached across turns.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub turn_id: Uuid,
    pub instruction: String,
    pub history: Vec<HistoryEntry>,
    pub query: String,
}

/// In-memory conversation state for one session.
#[derive(Debug)]
pub struct ChatSession {
    documents: Vec<IngestedDocument>,
    turns: Vec<Turn>,
    busy: bool,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
            turns: vec![Turn::assistant(GREETING)],
            busy: false,
        }
    }

    pub fn documents(&self) -> &[IngestedDocument] {
        &self.documents
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Add documents to the active set. Allowed in any state; takes effect
    /// at the next instruction build and never touches an existing turn.
    pub fn add_documents(&mut self, documents: Vec<IngestedDocument>) {
        tracing::debug!(added = documents.len(), "documents added to session");
        self.documents.extend(documents);
    }

    /// Remove a document by id. Returns whether anything was removed.
    pub fn remove_document(&mut self, id: Uuid) -> bool {
        let before = self.documents.len();
        self.documents.retain(|d| d.id != id);
        let removed = self.documents.len() < before;
        if removed {
            tracing::debug!(%id, "document removed from session");
        }
        removed
    }

    /// Clear the conversation log back to the greeting, keeping the
    /// document set. Refused while a request is in flight.
    pub fn reset(&mut self) -> bool {
        if self.busy {
            tracing::debug!("reset refused: request in flight");
            return false;
        }
        self.turns = vec![Turn::assistant(GREETING)];
        true
    }

    /// Begin a submission: Idle → AwaitingResponse.
    ///
    /// `None` when the gate is up or the trimmed query is empty; both are
    /// silent no-ops (no new turn, no invocation). Otherwise the user turn
    /// and the pending placeholder are appended, the gate is raised, and
    /// the request bundle is snapshotted in one step.
    pub fn begin(&mut self, query: &str) -> Option<PendingRequest> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        if self.busy {
            tracing::debug!("submission rejected: request already in flight");
            return None;
        }

        // History is everything said before this submission; the new query
        // travels separately, so it must not appear here too.
        let history: Vec<HistoryEntry> = self.turns.iter().map(HistoryEntry::from).collect();

        self.turns.push(Turn::user(query));
        let pending = Turn::pending();
        let turn_id = pending.id;
        self.turns.push(pending);
        self.busy = true;

        Some(PendingRequest {
            turn_id,
            instruction: build_instruction(&self.documents),
            history,
            query: query.to_string(),
        })
    }

    /// Reconcile the pending turn in place: AwaitingResponse → Idle.
    ///
    /// The turn keeps its id and position; only `text` and `is_pending`
    /// change, exactly once. The gate drops regardless of outcome.
    pub fn resolve(&mut self, turn_id: Uuid, outcome: Result<String, AdapterError>) {
        self.busy = false;

        let Some(turn) = self
            .turns
            .iter_mut()
            .find(|t| t.id == turn_id && t.is_pending)
        else {
            tracing::warn!(%turn_id, "no pending turn to reconcile");
            return;
        };

        turn.text = match outcome {
            Ok(text) if text.is_empty() => EMPTY_RESPONSE_FALLBACK.to_string(),
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "model invocation failed");
                REQUEST_FAILED_MESSAGE.to_string()
            }
        };
        turn.is_pending = false;
    }

    /// Run one full submission cycle against the given adapter.
    ///
    /// Returns a copy of the reconciled assistant turn, or `None` when
    /// the submission was rejected (gate up or empty query).
    pub async fn send<M: ModelInvoker>(&mut self, query: &str, invoker: &M) -> Option<Turn> {
        let request = self.begin(query)?;
        let outcome = invoker
            .invoke(&request.instruction, &request.history, &request.query)
            .await;
        self.resolve(request.turn_id, outcome);
        self.turns.iter().find(|t| t.id == request.turn_id).cloned()
    }
}
