//! Events that drive the session

use crate::api::{ChatReply, Document, ProviderPreference, SessionCreated, UploadFile, UploadReceipt};
use chrono::{DateTime, Utc};

/// Identity and creation time for a message about to be appended.
///
/// Generated outside the reducer so transitions stay deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageStamp {
    pub id: String,
    pub timestamp: DateTime<Utc>,
}

impl MessageStamp {
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
        }
    }
}

impl Default for MessageStamp {
    fn default() -> Self {
        Self::new()
    }
}

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    Initialize,
    SendMessage {
        content: String,
        provider: Option<ProviderPreference>,
        stamp: MessageStamp,
    },
    AttachDocument {
        document: Document,
        stamp: MessageStamp,
    },
    UploadDocument {
        file: UploadFile,
    },
    DetachDocument {
        document_id: i64,
    },
    Clear,
    Reset,

    // Backend completions
    SessionCreated {
        created: SessionCreated,
        stamp: MessageStamp,
    },
    SessionFailed {
        reason: String,
    },
    DocumentsLoaded {
        session_id: String,
        documents: Vec<Document>,
    },
    DocumentsLoadFailed {
        session_id: String,
        reason: String,
    },
    ChatReplied {
        session_id: String,
        reply: ChatReply,
        stamp: MessageStamp,
    },
    ChatFailed {
        session_id: String,
        reason: String,
        stamp: MessageStamp,
    },
    UploadCompleted {
        session_id: String,
        receipt: UploadReceipt,
        file_size: u64,
        stamp: MessageStamp,
    },
    UploadFailed {
        session_id: String,
        reason: String,
    },
    DocumentDeleted {
        document_id: i64,
    },
    DocumentDeleteFailed {
        document_id: i64,
        reason: String,
    },
}

impl Event {
    /// Short label for logs
    pub fn name(&self) -> &'static str {
        match self {
            Event::Initialize => "initialize",
            Event::SendMessage { .. } => "send_message",
            Event::AttachDocument { .. } => "attach_document",
            Event::UploadDocument { .. } => "upload_document",
            Event::DetachDocument { .. } => "detach_document",
            Event::Clear => "clear",
            Event::Reset => "reset",
            Event::SessionCreated { .. } => "session_created",
            Event::SessionFailed { .. } => "session_failed",
            Event::DocumentsLoaded { .. } => "documents_loaded",
            Event::DocumentsLoadFailed { .. } => "documents_load_failed",
            Event::ChatReplied { .. } => "chat_replied",
            Event::ChatFailed { .. } => "chat_failed",
            Event::UploadCompleted { .. } => "upload_completed",
            Event::UploadFailed { .. } => "upload_failed",
            Event::DocumentDeleted { .. } => "document_deleted",
            Event::DocumentDeleteFailed { .. } => "document_delete_failed",
        }
    }
}
