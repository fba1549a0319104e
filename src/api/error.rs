//! Backend API error types

use thiserror::Error;

/// Backend error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Timeout, message)
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Http(status), message)
    }

    /// The backend answered with `success: false`
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Rejected, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Decode, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Validation, message)
    }
}

/// Where a backend call went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Connection refused, DNS, reset
    Network,
    /// Transport timeout (30s by default, 60s for uploads)
    Timeout,
    /// Non-2xx status
    Http(u16),
    /// Envelope carried `success: false`
    Rejected,
    /// Body was not the expected JSON
    Decode,
    /// Request could not be built from local input
    Validation,
}

impl ApiErrorKind {
    /// Whether the backend itself was reached
    pub fn reached_backend(self) -> bool {
        matches!(self, Self::Http(_) | Self::Rejected | Self::Decode)
    }
}
