//! Client-side checks run before a document leaves the machine

use crate::api::UploadFile;
use thiserror::Error;

/// Largest accepted upload (10 MiB)
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// MIME types the backend can index: PDF, DOCX, TXT, XLS, XLSX
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("Invalid file type. Please upload PDF, DOCX, TXT, or Excel files.")]
    UnsupportedType { content_type: String },
    #[error("File size exceeds 10MB limit.")]
    TooLarge { size: u64 },
}

pub fn validate_upload(file: &UploadFile) -> Result<(), UploadRejection> {
    let content_type = file.content_type.trim().to_ascii_lowercase();
    if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
        return Err(UploadRejection::UnsupportedType {
            content_type: file.content_type.clone(),
        });
    }
    if file.size() > MAX_UPLOAD_BYTES {
        return Err(UploadRejection::TooLarge { size: file.size() });
    }
    Ok(())
}
