//! HTTP implementation of the chat backend

use super::types::{
    BudgetStatus, ChatReply, ChatRequest, Document, DocumentList, Envelope, HealthStatus,
    RawEnvelope, SessionCreated, UploadFile, UploadReceipt,
};
use super::{ApiError, ChatBackend};
use crate::config::ClientConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Header carrying the fixed user identity on every request
pub const USER_ID_HEADER: &str = "user-id";

/// Chat backend reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpChatBackend {
    client: Client,
    base_url: String,
    upload_timeout: Duration,
}

impl HttpChatBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from(config.user_id));

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::validation(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            upload_timeout: config.upload_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and return the raw body of a 2xx response
    async fn dispatch(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::timeout(format!("Request timeout: {e}"))
            } else if e.is_connect() {
                ApiError::network(format!("Connection failed: {e}"))
            } else {
                ApiError::network(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(classify_error(status, &body));
        }
        Ok(body)
    }

    /// Send a request whose envelope must carry `data`
    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = self.dispatch(request).await?;
        let raw: RawEnvelope<T> = serde_json::from_str(&body)
            .map_err(|e| ApiError::decode(format!("Failed to parse response: {e}")))?;
        match raw.into_envelope() {
            Envelope::Success(data) => Ok(data),
            Envelope::Failure { reason } => Err(ApiError::rejected(reason)),
        }
    }

    /// Send a request whose envelope only reports success
    async fn acknowledge(&self, request: RequestBuilder) -> Result<(), ApiError> {
        let body = self.dispatch(request).await?;
        let raw: RawEnvelope<Value> = serde_json::from_str(&body)
            .map_err(|e| ApiError::decode(format!("Failed to parse response: {e}")))?;
        match raw.into_ack() {
            Envelope::Success(()) => Ok(()),
            Envelope::Failure { reason } => Err(ApiError::rejected(reason)),
        }
    }
}

/// Turn a non-2xx response into an error, preferring the envelope's reason
fn classify_error(status: StatusCode, body: &str) -> ApiError {
    let reason = serde_json::from_str::<RawEnvelope<Value>>(body)
        .ok()
        .and_then(|raw| raw.reason())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                format!("HTTP {status}: {body}")
            }
        });

    match status.as_u16() {
        408 | 504 => ApiError::timeout(reason),
        code => ApiError::http(code, reason),
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn create_session(&self) -> Result<SessionCreated, ApiError> {
        self.fetch(self.client.post(self.url("/api/chatbot/session")))
            .await
    }

    async fn send_message(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
        self.fetch(self.client.post(self.url("/api/chatbot/chat")).json(request))
            .await
    }

    async fn list_documents(&self, session_id: &str) -> Result<Vec<Document>, ApiError> {
        let list: DocumentList = self
            .fetch(
                self.client
                    .get(self.url(&format!("/api/chatbot/session/{session_id}/documents"))),
            )
            .await?;
        Ok(list.documents)
    }

    async fn delete_document(&self, document_id: i64) -> Result<(), ApiError> {
        self.acknowledge(
            self.client
                .delete(self.url(&format!("/api/chatbot/document/{document_id}"))),
        )
        .await
    }

    async fn upload_document(
        &self,
        session_id: &str,
        file: &UploadFile,
    ) -> Result<UploadReceipt, ApiError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| ApiError::validation(format!("Invalid content type: {e}")))?;
        let form = Form::new()
            .part("document", part)
            .text("sessionId", session_id.to_string());

        self.fetch(
            self.client
                .post(self.url("/api/chatbot/upload-document"))
                .timeout(self.upload_timeout)
                .multipart(form),
        )
        .await
    }

    async fn session_history(&self, session_id: &str) -> Result<Value, ApiError> {
        self.fetch(
            self.client
                .get(self.url(&format!("/api/chatbot/session/{session_id}/history"))),
        )
        .await
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.fetch(self.client.get(self.url("/api/chatbot/health")))
            .await
    }

    async fn budget(&self) -> Result<BudgetStatus, ApiError> {
        self.fetch(self.client.get(self.url("/api/chatbot/budget-status")))
            .await
    }
}
