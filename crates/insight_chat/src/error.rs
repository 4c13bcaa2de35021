//! Error types for the document workflow.

use thiserror::Error;

/// Result type alias for workflow operations.
pub type InsightResult<T> = Result<T, InsightError>;

/// Errors that can occur while uploading or chatting about a document.
#[derive(Error, Debug)]
pub enum InsightError {
    #[error("unsupported file type: {name} ({mime_type})")]
    ValidationRejected { name: String, mime_type: String },

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Ask failed: {0}")]
    AskFailed(String),

    #[error("Invalid state for {operation}: current={current}")]
    InvalidState { current: String, operation: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InsightError {
    /// Human-readable reason without the category prefix.
    pub fn reason(&self) -> String {
        match self {
            Self::UploadFailed(reason) | Self::AskFailed(reason) | Self::Config(reason) => {
                reason.clone()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_is_literal() {
        let err = InsightError::ValidationRejected {
            name: "photo.png".to_string(),
            mime_type: "image/png".to_string(),
        };
        assert!(err.to_string().starts_with("unsupported file type"));
    }

    #[test]
    fn test_reason_strips_prefix() {
        let err = InsightError::UploadFailed("File too large".to_string());
        assert_eq!(err.to_string(), "Upload failed: File too large");
        assert_eq!(err.reason(), "File too large");
    }
}
