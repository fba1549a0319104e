//! Chat session state types

use super::event::MessageStamp;
use crate::api::{ChatReply, Document, SourceCitation};
use crate::config::DEFAULT_USER_ID;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Messages
// ============================================================================

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

/// Extra data the backend attaches to assistant replies
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AssistantAnnotations {
    pub is_shariah_compliant: Option<bool>,
    pub principles_involved: Vec<String>,
    pub recommended_issuances: Vec<Value>,
    pub platform_actions: Vec<String>,
    pub model_used: Option<String>,
    pub cost: Option<f64>,
    pub sources: Vec<SourceCitation>,
}

impl AssistantAnnotations {
    pub fn from_reply(reply: &ChatReply) -> Self {
        Self {
            is_shariah_compliant: reply.is_shariah_compliant,
            principles_involved: reply.principles_involved.clone(),
            recommended_issuances: reply.recommended_issuances.clone(),
            platform_actions: reply.suggested_actions.clone(),
            model_used: reply.model_used.clone(),
            cost: reply.cost,
            sources: reply.sources.clone(),
        }
    }
}

/// One entry in the transcript. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<AssistantAnnotations>,
}

impl ChatMessage {
    pub fn user(stamp: MessageStamp, content: impl Into<String>) -> Self {
        Self {
            id: stamp.id,
            content: content.into(),
            sender: Sender::User,
            timestamp: stamp.timestamp,
            annotations: None,
        }
    }

    pub fn assistant(stamp: MessageStamp, content: impl Into<String>) -> Self {
        Self {
            id: stamp.id,
            content: content.into(),
            sender: Sender::Assistant,
            timestamp: stamp.timestamp,
            annotations: None,
        }
    }

    pub fn from_reply(stamp: MessageStamp, reply: &ChatReply) -> Self {
        Self {
            annotations: Some(AssistantAnnotations::from_reply(reply)),
            ..Self::assistant(stamp, reply.response.clone())
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Data owned by the active session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Backend-issued handle; empty until initialization completes
    pub session_id: String,
    pub user_id: i64,
    pub messages: Vec<ChatMessage>,
    /// Attached documents, unique by id
    pub documents: Vec<Document>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self {
            session_id: String::new(),
            user_id: DEFAULT_USER_ID,
            messages: Vec::new(),
            documents: Vec::new(),
        }
    }
}

impl ChatSession {
    pub fn has_session(&self) -> bool {
        !self.session_id.is_empty()
    }

    /// Insert or replace by id
    pub fn upsert_document(&mut self, document: Document) {
        match self.documents.iter_mut().find(|d| d.id == document.id) {
            Some(existing) => *existing = document,
            None => self.documents.push(document),
        }
    }

    pub fn remove_document(&mut self, document_id: i64) -> Option<Document> {
        let index = self.documents.iter().position(|d| d.id == document_id)?;
        Some(self.documents.remove(index))
    }

    pub fn document(&self, document_id: i64) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == document_id)
    }
}

// ============================================================================
// Session State
// ============================================================================

/// Lifecycle of the session
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionPhase {
    /// Nothing requested yet
    #[default]
    Uninitialized,
    /// Session creation in flight (first init or reset)
    Initializing,
    /// Accepting messages
    Ready,
    /// One chat request in flight
    Sending,
    /// Session creation failed; waits for initialize or reset
    Failed { message: String },
}

impl SessionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::Uninitialized => "uninitialized",
            SessionPhase::Initializing => "initializing",
            SessionPhase::Ready => "ready",
            SessionPhase::Sending => "sending",
            SessionPhase::Failed { .. } => "failed",
        }
    }
}

/// Everything the UI renders
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub session: ChatSession,
    pub quick_suggestions: Vec<String>,
    /// Most recent failure, last write wins
    pub error: Option<String>,
    pub initialized: bool,
}

impl SessionState {
    /// True while a session creation or chat request is outstanding
    pub fn is_loading(&self) -> bool {
        matches!(
            self.phase,
            SessionPhase::Initializing | SessionPhase::Sending
        )
    }

    pub(crate) fn clear_transcript(&mut self) {
        self.session.messages.clear();
        self.quick_suggestions.clear();
        self.error = None;
    }
}
