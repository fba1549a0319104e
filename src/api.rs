//! Chat backend abstraction
//!
//! The session runtime talks to the backend only through [`ChatBackend`], so
//! it can be driven by the HTTP client in production and by mocks in tests.

mod client;
mod error;
mod types;

pub use client::{HttpChatBackend, USER_ID_HEADER};
pub use error::{ApiError, ApiErrorKind};
pub use types::*;

use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// Operations the backend chat API offers
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Open a new conversational session
    async fn create_session(&self) -> Result<SessionCreated, ApiError>;

    /// Exchange one user message for an assistant reply
    async fn send_message(&self, request: &ChatRequest) -> Result<ChatReply, ApiError>;

    /// Documents already attached to a session
    async fn list_documents(&self, session_id: &str) -> Result<Vec<Document>, ApiError>;

    async fn delete_document(&self, document_id: i64) -> Result<(), ApiError>;

    async fn upload_document(
        &self,
        session_id: &str,
        file: &UploadFile,
    ) -> Result<UploadReceipt, ApiError>;

    /// Server-side transcript of a session, passed through untyped
    async fn session_history(&self, session_id: &str) -> Result<Value, ApiError>;

    async fn health(&self) -> Result<HealthStatus, ApiError>;

    async fn budget(&self) -> Result<BudgetStatus, ApiError>;
}

#[async_trait]
impl<T: ChatBackend + ?Sized> ChatBackend for Arc<T> {
    async fn create_session(&self) -> Result<SessionCreated, ApiError> {
        (**self).create_session().await
    }

    async fn send_message(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
        (**self).send_message(request).await
    }

    async fn list_documents(&self, session_id: &str) -> Result<Vec<Document>, ApiError> {
        (**self).list_documents(session_id).await
    }

    async fn delete_document(&self, document_id: i64) -> Result<(), ApiError> {
        (**self).delete_document(document_id).await
    }

    async fn upload_document(
        &self,
        session_id: &str,
        file: &UploadFile,
    ) -> Result<UploadReceipt, ApiError> {
        (**self).upload_document(session_id, file).await
    }

    async fn session_history(&self, session_id: &str) -> Result<Value, ApiError> {
        (**self).session_history(session_id).await
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        (**self).health().await
    }

    async fn budget(&self) -> Result<BudgetStatus, ApiError> {
        (**self).budget().await
    }
}

/// Logging wrapper for chat backends
pub struct LoggingBackend {
    inner: Arc<dyn ChatBackend>,
}

impl LoggingBackend {
    pub fn new(inner: Arc<dyn ChatBackend>) -> Self {
        Self { inner }
    }

    async fn logged<T, F>(operation: &'static str, call: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>> + Send,
    {
        let start = Instant::now();
        let result = call.await;
        let duration = start.elapsed();

        match &result {
            Ok(_) => {
                tracing::info!(
                    operation,
                    duration_ms = %duration.as_millis(),
                    "Backend request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    operation,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    reached_backend = e.kind.reached_backend(),
                    "Backend request failed"
                );
            }
        }

        result
    }
}

#[async_trait]
impl ChatBackend for LoggingBackend {
    async fn create_session(&self) -> Result<SessionCreated, ApiError> {
        Self::logged("create_session", self.inner.create_session()).await
    }

    async fn send_message(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
        Self::logged("send_message", self.inner.send_message(request)).await
    }

    async fn list_documents(&self, session_id: &str) -> Result<Vec<Document>, ApiError> {
        Self::logged("list_documents", self.inner.list_documents(session_id)).await
    }

    async fn delete_document(&self, document_id: i64) -> Result<(), ApiError> {
        Self::logged("delete_document", self.inner.delete_document(document_id)).await
    }

    async fn upload_document(
        &self,
        session_id: &str,
        file: &UploadFile,
    ) -> Result<UploadReceipt, ApiError> {
        Self::logged(
            "upload_document",
            self.inner.upload_document(session_id, file),
        )
        .await
    }

    async fn session_history(&self, session_id: &str) -> Result<Value, ApiError> {
        Self::logged("session_history", self.inner.session_history(session_id)).await
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        Self::logged("health", self.inner.health()).await
    }

    async fn budget(&self) -> Result<BudgetStatus, ApiError> {
        Self::logged("budget", self.inner.budget()).await
    }
}
