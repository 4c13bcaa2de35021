//! Core types for the document workflow.

use std::path::Path;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InsightResult;

/// MIME type for PDF documents
pub const MIME_PDF: &str = "application/pdf";
/// MIME type for plain text documents
pub const MIME_TEXT: &str = "text/plain";
/// MIME type for Word (OOXML) documents
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
/// Declared type for files with an unknown extension
pub const MIME_OCTET_STREAM: &str = "application/octet-stream";

/// Document types the backend accepts.
pub const SUPPORTED_MIME_TYPES: [&str; 3] = [MIME_PDF, MIME_TEXT, MIME_DOCX];

/// A single chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Unique message ID (UUID)
    pub id: String,
    /// Message content
    pub content: String,
    /// Whether the user wrote this message
    #[serde(rename = "isUser")]
    pub is_user: bool,
    /// When the message was created
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
            is_user: true,
            timestamp: Utc::now(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
            is_user: false,
            timestamp: Utc::now(),
        }
    }

    /// Local time of day the message was created, as `HH:MM`.
    pub fn time_label(&self) -> String {
        self.timestamp.with_timezone(&Local).format("%H:%M").to_string()
    }
}

/// One line of the extracted document outline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StructureEntry {
    /// Section kind, e.g. "Section" or "Pages"
    #[serde(rename = "struct")]
    pub label: String,
    pub value: String,
}

impl StructureEntry {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// What the backend extracted from an uploaded document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DocumentInsights {
    /// Free-text summary
    pub summary: String,
    /// Comma separated list of topics, as sent by the backend
    #[serde(rename = "keyTopics")]
    pub key_topics: String,
    /// Ordered document outline
    pub structure: Vec<StructureEntry>,
}

impl DocumentInsights {
    /// Individual key topics, trimmed, with empty entries dropped.
    pub fn topics(&self) -> Vec<String> {
        self.key_topics
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Metadata of the uploaded document. Bytes are never retained.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadedFileRef {
    pub name: String,
    /// Size in bytes
    pub size: u64,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

impl UploadedFileRef {
    /// Size in megabytes with two decimals.
    pub fn size_mb(&self) -> String {
        format!("{:.2}", self.size as f64 / 1024.0 / 1024.0)
    }
}

/// A document selected for upload, including its bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub name: String,
    /// Declared MIME type; never sniffed from content
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl DocumentFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, declaring its type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> InsightResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let mime_type = mime_for_extension(path);

        Ok(Self::new(name, mime_type, bytes))
    }

    /// Override the declared MIME type
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Metadata reference that outlives the bytes
    pub fn file_ref(&self) -> UploadedFileRef {
        UploadedFileRef {
            name: self.name.clone(),
            size: self.size(),
            mime_type: self.mime_type.clone(),
        }
    }
}

/// Declared MIME type for a path, based on the picker's accepted extensions.
pub fn mime_for_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => MIME_PDF,
        "txt" => MIME_TEXT,
        "docx" => MIME_DOCX,
        _ => MIME_OCTET_STREAM,
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// `{ "content": ... }` wrapper used by every upload response field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentField {
    pub content: String,
}

/// Success body of `POST /upload`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub summary: ContentField,
    pub key_topics: ContentField,
    /// `content` holds a JSON-encoded array of structure entries
    pub document_structure: ContentField,
}

impl UploadResponse {
    /// Decode the nested structure string and build the insights.
    pub fn into_insights(self) -> Result<DocumentInsights, serde_json::Error> {
        let structure: Vec<StructureEntry> =
            serde_json::from_str(&self.document_structure.content)?;

        Ok(DocumentInsights {
            summary: self.summary.content,
            key_topics: self.key_topics.content,
            structure,
        })
    }
}

/// Body of `POST /ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub query: String,
}

/// Success body of `POST /ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub response: String,
}

/// Optional error body carried by non-2xx responses
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_structure_decodes_from_nested_string() {
        let body = r#"{
            "summary": {"content": "S"},
            "key_topics": {"content": "a,b"},
            "document_structure": {"content": "[{\"struct\":\"Section\",\"value\":\"Intro\"}]"}
        }"#;
        let response: UploadResponse = serde_json::from_str(body).unwrap();
        let insights = response.into_insights().unwrap();

        assert_eq!(insights.structure, vec![StructureEntry::new("Section", "Intro")]);
    }

    #[test]
    fn test_undecodable_structure_is_an_error() {
        let response = UploadResponse {
            summary: ContentField { content: "S".into() },
            key_topics: ContentField { content: "".into() },
            document_structure: ContentField { content: "not json".into() },
        };
        assert!(response.into_insights().is_err());
    }

    #[test]
    fn test_topics_are_trimmed() {
        let insights = DocumentInsights {
            key_topics: "finance, risk ,,  audit".to_string(),
            ..Default::default()
        };
        assert_eq!(insights.topics(), vec!["finance", "risk", "audit"]);
        assert!(DocumentInsights::default().topics().is_empty());
    }

    #[test]
    fn test_time_label_uses_local_time() {
        let mut message = Message::user("hi");
        message.timestamp = DateTime::parse_from_rfc3339("2024-03-01T23:45:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let expected = message.timestamp.with_timezone(&Local).format("%H:%M").to_string();
        assert_eq!(message.time_label(), expected);
        assert_eq!(message.time_label().len(), 5);
    }

    #[test]
    fn test_size_mb() {
        let file = UploadedFileRef {
            name: "a.pdf".into(),
            size: 3 * 1024 * 1024 / 2,
            mime_type: MIME_PDF.into(),
        };
        assert_eq!(file.size_mb(), "1.50");
    }

    #[test]
    fn test_mime_for_extension() {
        assert_eq!(mime_for_extension(Path::new("report.PDF")), MIME_PDF);
        assert_eq!(mime_for_extension(Path::new("notes.txt")), MIME_TEXT);
        assert_eq!(mime_for_extension(Path::new("memo.docx")), MIME_DOCX);
        assert_eq!(mime_for_extension(Path::new("photo.png")), MIME_OCTET_STREAM);
        assert_eq!(mime_for_extension(Path::new("README")), MIME_OCTET_STREAM);
    }

    #[tokio::test]
    async fn test_from_path_reads_bytes() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        let file = DocumentFile::from_path(&path).await.unwrap();
        assert_eq!(file.name, "notes.txt");
        assert_eq!(file.mime_type, MIME_TEXT);
        assert_eq!(file.size(), 5);
        assert_eq!(file.file_ref().size, 5);
    }
}
