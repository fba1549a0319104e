//! Effects produced by state transitions

use super::state::{ChatMessage, SessionPhase};
use crate::api::{ChatRequest, UploadFile};

/// Effects to be executed after state transition
#[derive(Debug, Clone)]
pub enum Effect {
    /// Ask the backend for a new session
    CreateSession,

    /// Load documents already attached to a session
    ListDocuments { session_id: String },

    /// Exchange a message with the assistant
    SendChat { request: ChatRequest },

    UploadDocument { session_id: String, file: UploadFile },

    DeleteDocument { document_id: i64 },

    /// Notify observers
    Notify(Notice),
}

/// Incremental updates for observers that render as things happen
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    MessageAppended(ChatMessage),
    PhaseChanged(SessionPhase),
    Error(String),
    DocumentsChanged,
}

impl Effect {
    pub fn notify_message(message: ChatMessage) -> Self {
        Effect::Notify(Notice::MessageAppended(message))
    }

    pub fn notify_error(message: impl Into<String>) -> Self {
        Effect::Notify(Notice::Error(message.into()))
    }

    pub fn notify_documents_changed() -> Self {
        Effect::Notify(Notice::DocumentsChanged)
    }

    /// Whether this effect issues a backend request
    #[allow(dead_code)] // Used by tests
    pub fn is_request(&self) -> bool {
        !matches!(self, Effect::Notify(_))
    }
}
