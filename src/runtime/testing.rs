//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use crate::api::{
    ApiError, BudgetStatus, ChatBackend, ChatReply, ChatRequest, Document, HealthStatus,
    SessionCreated, UploadFile, UploadReceipt,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

type Queue<T> = Mutex<VecDeque<Result<T, ApiError>>>;

fn pop<T>(queue: &Queue<T>, operation: &str) -> Result<T, ApiError> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(ApiError::network(format!("No mock {operation} queued"))))
}

// ============================================================================
// Mock Backend
// ============================================================================

/// Backend that returns queued responses and records every call
#[derive(Default)]
pub struct MockBackend {
    sessions: Queue<SessionCreated>,
    replies: Queue<ChatReply>,
    document_lists: Queue<Vec<Document>>,
    uploads: Queue<UploadReceipt>,
    deletions: Queue<()>,
    /// Record of chat requests made
    pub chat_requests: Mutex<Vec<ChatRequest>>,
    /// Session ids passed to upload, with the file name
    pub upload_requests: Mutex<Vec<(String, String)>>,
    pub delete_requests: Mutex<Vec<i64>>,
    pub session_requests: Mutex<usize>,
}

#[allow(dead_code)]
impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_session(&self, session_id: &str, welcome: &str) {
        self.sessions.lock().unwrap().push_back(Ok(SessionCreated {
            session_id: session_id.to_string(),
            user_id: Some(1),
            welcome_message: welcome.to_string(),
            islamic_principles: vec![],
            platform_features: vec![],
        }));
    }

    pub fn queue_session_error(&self, error: ApiError) {
        self.sessions.lock().unwrap().push_back(Err(error));
    }

    pub fn queue_reply(&self, reply: ChatReply) {
        self.replies.lock().unwrap().push_back(Ok(reply));
    }

    pub fn queue_reply_error(&self, error: ApiError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn queue_documents(&self, documents: Vec<Document>) {
        self.document_lists.lock().unwrap().push_back(Ok(documents));
    }

    pub fn queue_upload(&self, receipt: UploadReceipt) {
        self.uploads.lock().unwrap().push_back(Ok(receipt));
    }

    pub fn queue_delete(&self, result: Result<(), ApiError>) {
        self.deletions.lock().unwrap().push_back(result);
    }

    pub fn recorded_chat_requests(&self) -> Vec<ChatRequest> {
        self.chat_requests.lock().unwrap().clone()
    }

    pub fn recorded_uploads(&self) -> Vec<(String, String)> {
        self.upload_requests.lock().unwrap().clone()
    }

    pub fn session_request_count(&self) -> usize {
        *self.session_requests.lock().unwrap()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn create_session(&self) -> Result<SessionCreated, ApiError> {
        *self.session_requests.lock().unwrap() += 1;
        pop(&self.sessions, "session")
    }

    async fn send_message(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
        self.chat_requests.lock().unwrap().push(request.clone());
        pop(&self.replies, "reply")
    }

    async fn list_documents(&self, _session_id: &str) -> Result<Vec<Document>, ApiError> {
        // Sessions start empty unless a listing was queued
        self.document_lists
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn delete_document(&self, document_id: i64) -> Result<(), ApiError> {
        self.delete_requests.lock().unwrap().push(document_id);
        pop(&self.deletions, "deletion")
    }

    async fn upload_document(
        &self,
        session_id: &str,
        file: &UploadFile,
    ) -> Result<UploadReceipt, ApiError> {
        self.upload_requests
            .lock()
            .unwrap()
            .push((session_id.to_string(), file.file_name.clone()));
        pop(&self.uploads, "upload")
    }

    async fn session_history(&self, _session_id: &str) -> Result<Value, ApiError> {
        Ok(serde_json::json!({ "messages": [] }))
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        Ok(HealthStatus {
            status: "healthy".to_string(),
            service: "mock".to_string(),
            version: "0.0.0".to_string(),
        })
    }

    async fn budget(&self) -> Result<BudgetStatus, ApiError> {
        Err(ApiError::network("No mock budget"))
    }
}

// ============================================================================
// Delayed Mock Backend (for in-flight testing)
// ============================================================================

/// Mock backend whose chat replies wait for a delay or an explicit release
pub struct DelayedMockBackend {
    pub inner: MockBackend,
    delay: Duration,
    /// Notified when a chat request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl DelayedMockBackend {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockBackend::new(),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl ChatBackend for DelayedMockBackend {
    async fn create_session(&self) -> Result<SessionCreated, ApiError> {
        self.inner.create_session().await
    }

    async fn send_message(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
        self.inner.chat_requests.lock().unwrap().push(request.clone());
        self.request_started.notify_one();
        tokio::time::sleep(self.delay).await;
        pop(&self.inner.replies, "reply")
    }

    async fn list_documents(&self, session_id: &str) -> Result<Vec<Document>, ApiError> {
        self.inner.list_documents(session_id).await
    }

    async fn delete_document(&self, document_id: i64) -> Result<(), ApiError> {
        self.inner.delete_document(document_id).await
    }

    async fn upload_document(
        &self,
        session_id: &str,
        file: &UploadFile,
    ) -> Result<UploadReceipt, ApiError> {
        self.inner.upload_document(session_id, file).await
    }

    async fn session_history(&self, session_id: &str) -> Result<Value, ApiError> {
        self.inner.session_history(session_id).await
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.inner.health().await
    }

    async fn budget(&self) -> Result<BudgetStatus, ApiError> {
        self.inner.budget().await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ProviderPreference, UploadStatus};
    use crate::runtime::{spawn_session, SessionHandle};
    use crate::session::{Notice, SessionPhase, SessionState, Sender};

    const WAIT: Duration = Duration::from_secs(2);

    async fn wait_for(
        handle: &SessionHandle,
        predicate: impl FnMut(&SessionState) -> bool,
    ) -> SessionState {
        tokio::time::timeout(WAIT, handle.wait_until(predicate))
            .await
            .expect("timed out waiting for state")
            .expect("runtime stopped")
    }

    async fn ready_session(backend: &Arc<MockBackend>, session_id: &str) -> SessionHandle {
        backend.queue_session(session_id, "Hello");
        let handle = spawn_session(backend.clone());
        let mut notices = handle.subscribe();
        handle.initialize().await.unwrap();

        // Initial document listing lands after Ready; wait so it cannot race the test
        loop {
            match tokio::time::timeout(WAIT, notices.recv()).await {
                Ok(Ok(Notice::DocumentsChanged)) => break,
                Ok(Ok(_)) => continue,
                other => panic!("session never loaded documents: {other:?}"),
            }
        }
        handle
    }

    fn document(id: i64) -> Document {
        Document {
            id,
            file_name: format!("doc-{id}.pdf"),
            file_type: "application/pdf".to_string(),
            file_size: 2048,
            storage_url: format!("https://files.example/{id}"),
            upload_status: UploadStatus::Completed,
            chunk_count: Some(4),
            created_at: "2024-05-01T10:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_backend_queue() {
        let mock = MockBackend::new();
        mock.queue_reply(ChatReply::text("Hello"));

        let request = ChatRequest {
            message: "hi".to_string(),
            session_id: "s".to_string(),
            preferred_provider: None,
        };
        assert_eq!(mock.send_message(&request).await.unwrap().response, "Hello");

        // Second call should fail (no more responses)
        assert!(mock.send_message(&request).await.is_err());
        assert_eq!(mock.recorded_chat_requests().len(), 2);
    }

    /// The abc123 scenario: welcome, question, answer with suggestions
    #[tokio::test]
    async fn test_initialize_and_chat() {
        let backend = Arc::new(MockBackend::new());
        let handle = ready_session(&backend, "abc123").await;

        let state = handle.snapshot();
        assert_eq!(state.session.session_id, "abc123");
        assert!(state.initialized);
        assert_eq!(state.session.messages.len(), 1);
        assert_eq!(state.session.messages[0].content, "Hello");

        backend.queue_reply(ChatReply {
            quick_suggestions: vec!["Tell me more".to_string()],
            ..ChatReply::text("A Sukuk is...")
        });
        handle
            .send_message("What is Sukuk?", Some(ProviderPreference::Gemini))
            .await
            .unwrap();

        let state = wait_for(&handle, |s| s.session.messages.len() == 3).await;
        assert_eq!(state.session.messages[1].sender, Sender::User);
        assert_eq!(state.session.messages[1].content, "What is Sukuk?");
        assert_eq!(state.session.messages[2].sender, Sender::Assistant);
        assert_eq!(state.quick_suggestions, vec!["Tell me more"]);
        assert!(!state.is_loading());

        let requests = backend.recorded_chat_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].session_id, "abc123");
        assert_eq!(
            requests[0].preferred_provider,
            Some(ProviderPreference::Gemini)
        );
    }

    #[tokio::test]
    async fn test_initialize_failure() {
        let backend = Arc::new(MockBackend::new());
        backend.queue_session_error(ApiError::network("connection refused"));
        let handle = spawn_session(backend.clone());
        handle.initialize().await.unwrap();

        let state = wait_for(&handle, |s| matches!(s.phase, SessionPhase::Failed { .. })).await;
        assert!(!state.initialized);
        assert_eq!(
            state.error.as_deref(),
            Some("Failed to initialize chat: connection refused")
        );

        // Sending without a session reaches nothing
        handle.send_message("hello", None).await.unwrap();
        backend.queue_session("retry", "Hi again");
        handle.initialize().await.unwrap();
        let state = wait_for(&handle, |s| s.phase == SessionPhase::Ready).await;
        assert_eq!(state.session.session_id, "retry");
        assert!(backend.recorded_chat_requests().is_empty());
    }

    #[tokio::test]
    async fn test_rapid_sends_issue_one_request() {
        let backend = Arc::new(DelayedMockBackend::new(Duration::from_millis(50)));
        backend.inner.queue_session("abc123", "Hello");
        backend.inner.queue_reply(ChatReply::text("only answer"));

        let handle = spawn_session(backend.clone());
        handle.initialize().await.unwrap();
        wait_for(&handle, |s| s.phase == SessionPhase::Ready).await;

        handle.send_message("first", None).await.unwrap();
        handle.send_message("second", None).await.unwrap();

        let state = wait_for(&handle, |s| s.session.messages.len() == 3).await;
        assert_eq!(state.session.messages[1].content, "first");
        assert_eq!(state.session.messages[2].content, "only answer");

        let requests = backend.inner.recorded_chat_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].message, "first");
    }

    #[tokio::test]
    async fn test_failed_send_appends_apology() {
        let backend = Arc::new(MockBackend::new());
        let handle = ready_session(&backend, "abc123").await;
        let mut notices = handle.subscribe();

        backend.queue_reply_error(ApiError::timeout("Request timeout"));
        handle.send_message("What is Ijara?", None).await.unwrap();

        let state = wait_for(&handle, |s| s.error.is_some()).await;
        assert!(!state.is_loading());
        assert_eq!(state.session.messages.len(), 3);
        assert_eq!(
            state.session.messages[2].content,
            "Sorry, I encountered an error: Request timeout. Please try again."
        );

        let mut saw_error = false;
        while let Ok(Ok(notice)) = tokio::time::timeout(WAIT, notices.recv()).await {
            if notice == Notice::Error("Failed to send message: Request timeout".to_string()) {
                saw_error = true;
                break;
            }
        }
        assert!(saw_error);
    }

    #[tokio::test]
    async fn test_reset_yields_fresh_session() {
        let backend = Arc::new(MockBackend::new());
        let handle = ready_session(&backend, "first").await;

        backend.queue_reply(ChatReply::text("answer"));
        handle.send_message("question", None).await.unwrap();
        wait_for(&handle, |s| s.session.messages.len() == 3).await;

        backend.queue_session("second", "Welcome back");
        handle.reset().await.unwrap();
        let state = wait_for(&handle, |s| {
            s.phase == SessionPhase::Ready && s.session.session_id == "second"
        })
        .await;
        assert_eq!(state.session.messages.len(), 1);
        assert_eq!(state.session.messages[0].content, "Welcome back");
        assert_eq!(backend.session_request_count(), 2);
    }

    #[tokio::test]
    async fn test_reset_before_initialize_creates_session() {
        let backend = Arc::new(MockBackend::new());
        backend.queue_session("fresh", "Welcome");
        let handle = spawn_session(backend.clone());
        assert_eq!(handle.snapshot(), SessionState::default());

        handle.reset().await.unwrap();
        let state = wait_for(&handle, |s| s.phase == SessionPhase::Ready).await;
        assert_eq!(state.session.session_id, "fresh");
        assert_eq!(state.session.messages.len(), 1);
        assert_eq!(backend.session_request_count(), 1);
    }

    #[tokio::test]
    async fn test_clear_keeps_documents() {
        let backend = Arc::new(MockBackend::new());
        backend.queue_documents(vec![document(1)]);
        let handle = ready_session(&backend, "abc123").await;
        wait_for(&handle, |s| s.session.documents.len() == 1).await;

        handle.clear().await.unwrap();
        let state = wait_for(&handle, |s| s.session.messages.is_empty()).await;
        assert_eq!(state.session.session_id, "abc123");
        assert_eq!(state.session.documents.len(), 1);
    }

    #[tokio::test]
    async fn test_attach_and_detach() {
        let backend = Arc::new(MockBackend::new());
        let handle = ready_session(&backend, "abc123").await;

        handle.attach_document(document(7)).await.unwrap();
        let state = wait_for(&handle, |s| s.session.documents.len() == 1).await;
        assert!(state.session.messages[1].content.contains("doc-7.pdf"));

        // Failed delete keeps the document
        backend.queue_delete(Err(ApiError::http(404, "Document not found")));
        handle.detach_document(7).await.unwrap();
        let state = wait_for(&handle, |s| s.error.is_some()).await;
        assert_eq!(state.session.documents.len(), 1);

        backend.queue_delete(Ok(()));
        handle.detach_document(7).await.unwrap();
        wait_for(&handle, |s| s.session.documents.is_empty()).await;
        assert_eq!(*backend.delete_requests.lock().unwrap(), vec![7, 7]);
    }

    #[tokio::test]
    async fn test_upload_attaches_document() {
        let backend = Arc::new(MockBackend::new());
        let handle = ready_session(&backend, "abc123").await;

        backend.queue_upload(UploadReceipt {
            document_id: 42,
            file_name: "terms.txt".to_string(),
            file_type: "text/plain".to_string(),
            total_chunks: 2,
            storage_url: "https://files.example/42".to_string(),
        });
        handle
            .upload_document(UploadFile::new("terms.txt", "text/plain", vec![b'a'; 128]))
            .await
            .unwrap();

        let state = wait_for(&handle, |s| s.session.document(42).is_some()).await;
        let document = state.session.document(42).unwrap();
        assert_eq!(document.file_size, 128);
        assert_eq!(document.chunk_count, Some(2));
        assert_eq!(
            backend.recorded_uploads(),
            vec![("abc123".to_string(), "terms.txt".to_string())]
        );
    }

    #[tokio::test]
    async fn test_invalid_upload_never_reaches_backend() {
        let backend = Arc::new(MockBackend::new());
        let handle = ready_session(&backend, "abc123").await;

        handle
            .upload_document(UploadFile::new("photo.png", "image/png", vec![0; 8]))
            .await
            .unwrap();
        let state = wait_for(&handle, |s| s.error.is_some()).await;
        assert_eq!(
            state.error.as_deref(),
            Some("Invalid file type. Please upload PDF, DOCX, TXT, or Excel files.")
        );
        assert!(backend.recorded_uploads().is_empty());
    }

    #[tokio::test]
    async fn test_phase_notices() {
        let backend = Arc::new(MockBackend::new());
        backend.queue_session("abc123", "Hello");
        let handle = spawn_session(backend.clone());
        let mut notices = handle.subscribe();
        handle.initialize().await.unwrap();

        let mut phases = Vec::new();
        while phases.last() != Some(&SessionPhase::Ready) {
            match tokio::time::timeout(WAIT, notices.recv()).await {
                Ok(Ok(Notice::PhaseChanged(phase))) => phases.push(phase),
                Ok(Ok(_)) => continue,
                _ => break,
            }
        }
        assert_eq!(phases, vec![SessionPhase::Initializing, SessionPhase::Ready]);
    }
}
