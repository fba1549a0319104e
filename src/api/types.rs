//! Wire types for the chat backend
//!
//! Every response arrives wrapped in `{ success, data?, error?, message? }`.
//! [`RawEnvelope`] is decoded first and immediately turned into the tagged
//! [`Envelope`] so nothing downstream inspects untyped payloads.

use crate::session::upload::MAX_UPLOAD_BYTES;
use crate::session::UploadRejection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// ============================================================================
// Envelope
// ============================================================================

/// Response envelope as it appears on the wire
#[derive(Debug, Deserialize)]
pub struct RawEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub message: Option<String>,
}

/// Envelope after boundary validation
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    Success(T),
    Failure { reason: String },
}

impl<T> RawEnvelope<T> {
    /// Human readable reason carried by a failed envelope
    pub fn reason(&self) -> Option<String> {
        self.message.clone().or_else(|| self.error.clone())
    }

    /// Validate an envelope whose success case must carry `data`
    pub fn into_envelope(self) -> Envelope<T> {
        let reason = self.reason();
        match (self.success, self.data) {
            (true, Some(data)) => Envelope::Success(data),
            (true, None) => Envelope::Failure {
                reason: "Response did not include data".to_string(),
            },
            (false, _) => Envelope::Failure {
                reason: reason.unwrap_or_else(|| "Request failed".to_string()),
            },
        }
    }

    /// Validate a status-only envelope (`data` is ignored)
    pub fn into_ack(self) -> Envelope<()> {
        if self.success {
            Envelope::Success(())
        } else {
            Envelope::Failure {
                reason: self.reason().unwrap_or_else(|| "Request failed".to_string()),
            }
        }
    }
}

// ============================================================================
// Provider preference
// ============================================================================

/// Which backend-hosted model family should answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderPreference {
    #[default]
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
}

impl ProviderPreference {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderPreference::Gemini => "gemini",
            ProviderPreference::OpenAi => "openai",
        }
    }
}

impl fmt::Display for ProviderPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(ProviderPreference::Gemini),
            "openai" => Ok(ProviderPreference::OpenAi),
            other => Err(format!("unknown provider '{other}' (expected gemini or openai)")),
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Payload of a successful session creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub session_id: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub welcome_message: String,
    #[serde(default)]
    pub islamic_principles: Vec<String>,
    #[serde(default)]
    pub platform_features: Vec<String>,
}

// ============================================================================
// Chat
// ============================================================================

/// Body of a chat request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_provider: Option<ProviderPreference>,
}

/// Citation attached to an assistant answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCitation {
    pub title: String,
    pub url: String,
}

/// Payload of a successful chat exchange
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatReply {
    pub response: String,
    pub is_shariah_compliant: Option<bool>,
    pub principles_involved: Vec<String>,
    pub recommended_issuances: Vec<Value>,
    pub suggested_actions: Vec<String>,
    pub quick_suggestions: Vec<String>,
    pub session_id: Option<String>,
    pub timestamp: Option<String>,
    pub personalized: Option<bool>,
    pub model_used: Option<String>,
    pub cost: Option<f64>,
    pub sources: Vec<SourceCitation>,
}

#[cfg(test)]
impl ChatReply {
    /// Plain reply with no annotations
    pub fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            ..Self::default()
        }
    }
}

// ============================================================================
// Documents
// ============================================================================

/// Processing state of an uploaded document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Processing,
    #[default]
    Completed,
    Failed,
}

/// A document attached to a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: i64,
    pub file_name: String,
    pub file_type: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub storage_url: String,
    #[serde(default)]
    pub upload_status: UploadStatus,
    #[serde(default)]
    pub chunk_count: Option<u32>,
    #[serde(default)]
    pub created_at: String,
}

/// Payload of the session document listing
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DocumentList {
    #[serde(default)]
    pub documents: Vec<Document>,
}

/// Payload of a successful upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub document_id: i64,
    pub file_name: String,
    pub file_type: String,
    #[serde(default)]
    pub total_chunks: u32,
    #[serde(default)]
    pub storage_url: String,
}

/// A local file ready to be uploaded
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, typing it by extension. Files over the upload
    /// limit are refused before any bytes are read.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let size = tokio::fs::metadata(path).await?.len();
        if size > MAX_UPLOAD_BYTES {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                UploadRejection::TooLarge { size },
            ));
        }
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "document".to_string(), |n| n.to_string_lossy().to_string());
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

// ============================================================================
// Status
// ============================================================================

/// Backend health
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Model spend budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    pub usage_percentage: f64,
    pub remaining_budget: f64,
    pub recommended_model: String,
}
