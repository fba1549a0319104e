//! Pure state transition function
//!
//! Every caller action and every backend completion passes through
//! [`transition`], which sees the latest state and returns the next state
//! plus the effects the runtime must carry out. No I/O happens here.

use super::effect::Effect;
use super::event::{Event, MessageStamp};
use super::state::{ChatMessage, SessionPhase, SessionState};
use super::upload::validate_upload;
use crate::api::{ChatRequest, Document, UploadReceipt, UploadStatus};
use crate::config::DEFAULT_USER_ID;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Reasons an event leaves the state untouched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Message is empty")]
    EmptyMessage,
    #[error("No active session")]
    NoSession,
    #[error("A request is already in progress")]
    Busy,
    #[error("Stale completion: {0}")]
    Stale(String),
}

/// Pure transition function
pub fn transition(state: &SessionState, event: Event) -> Result<TransitionResult, TransitionError> {
    match event {
        // ============================================================
        // Initialization
        // ============================================================
        Event::Initialize => {
            // A reply still in flight goes stale once the phase leaves Sending
            if state.phase == SessionPhase::Initializing {
                return Err(TransitionError::Busy);
            }
            let mut next = state.clone();
            next.phase = SessionPhase::Initializing;
            next.error = None;
            Ok(TransitionResult::new(next).with_effect(Effect::CreateSession))
        }

        Event::Reset => {
            if state.phase == SessionPhase::Initializing {
                return Err(TransitionError::Busy);
            }
            let mut next = state.clone();
            next.clear_transcript();
            next.initialized = false;
            next.phase = SessionPhase::Initializing;
            Ok(TransitionResult::new(next).with_effect(Effect::CreateSession))
        }

        Event::SessionCreated { created, stamp } => {
            if state.phase != SessionPhase::Initializing {
                return Err(stale("session created while not initializing"));
            }
            let welcome = ChatMessage::assistant(stamp, created.welcome_message);
            let session_id = created.session_id;

            let mut next = state.clone();
            next.session.session_id = session_id.clone();
            next.session.user_id = created.user_id.unwrap_or(DEFAULT_USER_ID);
            next.session.messages = vec![welcome.clone()];
            next.session.documents.clear();
            next.initialized = true;
            next.phase = SessionPhase::Ready;
            Ok(TransitionResult::new(next)
                .with_effect(Effect::notify_message(welcome))
                .with_effect(Effect::ListDocuments { session_id }))
        }

        Event::SessionFailed { reason } => {
            if state.phase != SessionPhase::Initializing {
                return Err(stale("session failure while not initializing"));
            }
            let message = format!("Failed to initialize chat: {reason}");
            let mut next = state.clone();
            next.phase = SessionPhase::Failed {
                message: message.clone(),
            };
            next.error = Some(message.clone());
            Ok(TransitionResult::new(next).with_effect(Effect::notify_error(message)))
        }

        Event::DocumentsLoaded {
            session_id,
            documents,
        } => {
            ensure_current(state, &session_id)?;
            let mut next = state.clone();
            next.session.documents.clear();
            for document in documents {
                next.session.upsert_document(document);
            }
            Ok(TransitionResult::new(next).with_effect(Effect::notify_documents_changed()))
        }

        Event::DocumentsLoadFailed { session_id, reason } => {
            ensure_current(state, &session_id)?;
            Ok(with_error(state, format!("Failed to load documents: {reason}")))
        }

        // ============================================================
        // Messaging
        // ============================================================
        Event::SendMessage {
            content,
            provider,
            stamp,
        } => {
            let text = content.trim();
            if text.is_empty() {
                return Err(TransitionError::EmptyMessage);
            }
            if !state.session.has_session() {
                return Err(TransitionError::NoSession);
            }
            if state.is_loading() {
                return Err(TransitionError::Busy);
            }

            let message = ChatMessage::user(stamp, text);
            let request = ChatRequest {
                message: text.to_string(),
                session_id: state.session.session_id.clone(),
                preferred_provider: provider,
            };

            let mut next = state.clone();
            next.session.messages.push(message.clone());
            next.phase = SessionPhase::Sending;
            Ok(TransitionResult::new(next)
                .with_effect(Effect::notify_message(message))
                .with_effect(Effect::SendChat { request }))
        }

        Event::ChatReplied {
            session_id,
            reply,
            stamp,
        } => {
            ensure_sending(state, &session_id)?;
            let message = ChatMessage::from_reply(stamp, &reply);

            let mut next = state.clone();
            next.session.messages.push(message.clone());
            next.quick_suggestions = reply.quick_suggestions;
            next.error = None;
            next.phase = SessionPhase::Ready;
            Ok(TransitionResult::new(next).with_effect(Effect::notify_message(message)))
        }

        Event::ChatFailed {
            session_id,
            reason,
            stamp,
        } => {
            ensure_sending(state, &session_id)?;
            let message = ChatMessage::assistant(
                stamp,
                format!("Sorry, I encountered an error: {reason}. Please try again."),
            );
            let error = format!("Failed to send message: {reason}");

            let mut next = state.clone();
            next.session.messages.push(message.clone());
            next.error = Some(error.clone());
            next.phase = SessionPhase::Ready;
            Ok(TransitionResult::new(next)
                .with_effect(Effect::notify_message(message))
                .with_effect(Effect::notify_error(error)))
        }

        // ============================================================
        // Documents
        // ============================================================
        Event::AttachDocument { document, stamp } => Ok(attach(state, document, stamp)),

        Event::UploadDocument { file } => {
            if !state.session.has_session() {
                return Err(TransitionError::NoSession);
            }
            // The current id belongs to the session being replaced
            if state.phase == SessionPhase::Initializing {
                return Err(TransitionError::Busy);
            }
            if let Err(rejection) = validate_upload(&file) {
                return Ok(with_error(state, rejection.to_string()));
            }
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::UploadDocument {
                session_id: state.session.session_id.clone(),
                file,
            }))
        }

        Event::UploadCompleted {
            session_id,
            receipt,
            file_size,
            stamp,
        } => {
            ensure_current(state, &session_id)?;
            let document = document_from_receipt(receipt, file_size, &stamp);
            Ok(attach(state, document, stamp))
        }

        Event::UploadFailed { session_id, reason } => {
            ensure_current(state, &session_id)?;
            Ok(with_error(state, format!("Failed to upload document: {reason}")))
        }

        Event::DetachDocument { document_id } => Ok(TransitionResult::new(state.clone())
            .with_effect(Effect::DeleteDocument { document_id })),

        Event::DocumentDeleted { document_id } => {
            let mut next = state.clone();
            next.session.remove_document(document_id);
            Ok(TransitionResult::new(next).with_effect(Effect::notify_documents_changed()))
        }

        Event::DocumentDeleteFailed {
            document_id,
            reason,
        } => {
            tracing::debug!(document_id, "Document delete failed");
            Ok(with_error(state, format!("Failed to delete document: {reason}")))
        }

        // ============================================================
        // Housekeeping
        // ============================================================
        Event::Clear => {
            let mut next = state.clone();
            next.clear_transcript();
            Ok(TransitionResult::new(next))
        }
    }
}

// Helper functions

fn stale(detail: &str) -> TransitionError {
    TransitionError::Stale(detail.to_string())
}

/// Completion must belong to the session that is current now
fn ensure_current(state: &SessionState, session_id: &str) -> Result<(), TransitionError> {
    if state.session.session_id == session_id {
        Ok(())
    } else {
        Err(stale("completion for a replaced session"))
    }
}

/// Chat completion must answer the one send in flight for the current session
fn ensure_sending(state: &SessionState, session_id: &str) -> Result<(), TransitionError> {
    if state.phase != SessionPhase::Sending {
        return Err(stale("chat completion while not sending"));
    }
    ensure_current(state, session_id)
}

fn with_error(state: &SessionState, message: String) -> TransitionResult {
    let mut next = state.clone();
    next.error = Some(message.clone());
    TransitionResult::new(next).with_effect(Effect::notify_error(message))
}

fn attach(state: &SessionState, document: Document, stamp: MessageStamp) -> TransitionResult {
    let confirmation = ChatMessage::assistant(stamp, attach_confirmation(&document));
    let mut next = state.clone();
    next.session.upsert_document(document);
    next.session.messages.push(confirmation.clone());
    TransitionResult::new(next)
        .with_effect(Effect::notify_message(confirmation))
        .with_effect(Effect::notify_documents_changed())
}

fn attach_confirmation(document: &Document) -> String {
    match document.chunk_count {
        Some(chunks) => format!(
            "Document \"{}\" uploaded successfully ({chunks} sections indexed). You can now ask questions about its contents.",
            document.file_name
        ),
        None => format!(
            "Document \"{}\" uploaded successfully. You can now ask questions about its contents.",
            document.file_name
        ),
    }
}

fn document_from_receipt(receipt: UploadReceipt, file_size: u64, stamp: &MessageStamp) -> Document {
    Document {
        id: receipt.document_id,
        file_name: receipt.file_name,
        file_type: receipt.file_type,
        file_size,
        storage_url: receipt.storage_url,
        upload_status: UploadStatus::Completed,
        chunk_count: Some(receipt.total_chunks),
        created_at: stamp.timestamp.to_rfc3339(),
    }
}
