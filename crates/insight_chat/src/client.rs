//! HTTP client for the document backend.
//!
//! Two endpoints, one attempt each:
//! - `POST /upload` (multipart field `file`) returns the extracted insights
//! - `POST /ask` (JSON `{ "query": ... }`) returns `{ "response": ... }`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{InsightError, InsightResult};
use crate::types::{
    AskRequest, AskResponse, DocumentFile, DocumentInsights, ErrorBody, UploadResponse,
};

/// Reason used when a failed upload carries no `detail`
pub const DEFAULT_UPLOAD_ERROR: &str = "Failed to upload file";
/// Reason used when a failed question carries no `detail`
pub const DEFAULT_ASK_ERROR: &str = "Failed to get a response";

/// Operations offered by the document backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Upload a document and return what the backend extracted from it
    async fn submit_document(&self, file: &DocumentFile) -> InsightResult<DocumentInsights>;

    /// Ask a question about the most recently uploaded document
    async fn ask(&self, question: &str) -> InsightResult<String>;
}

/// reqwest-backed implementation of [`DocumentApi`]
pub struct DocumentClient {
    config: ClientConfig,
    client: reqwest::Client,
}

impl DocumentClient {
    /// Create a client for the configured backend
    pub fn new(config: ClientConfig) -> InsightResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .cookie_store(config.with_credentials)
            .build()
            .map_err(|e| InsightError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }
}

#[async_trait]
impl DocumentApi for DocumentClient {
    async fn submit_document(&self, file: &DocumentFile) -> InsightResult<DocumentInsights> {
        let url = self.endpoint("/upload");
        debug!(url = %url, name = %file.name, size = file.size(), "Uploading document");

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| InsightError::UploadFailed(format!("Invalid MIME type: {}", e)))?;
        let form = Form::new().part("file", part);

        let response = self.client.post(&url).multipart(form).send().await.map_err(|e| {
            warn!("Upload request failed: {}", e);
            InsightError::UploadFailed(DEFAULT_UPLOAD_ERROR.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let reason = error_detail(response)
                .await
                .unwrap_or_else(|| DEFAULT_UPLOAD_ERROR.to_string());
            warn!(status = %status, "Upload rejected: {}", reason);
            return Err(InsightError::UploadFailed(reason));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| InsightError::UploadFailed(format!("Malformed response: {}", e)))?;

        let insights = body.into_insights().map_err(|e| {
            InsightError::UploadFailed(format!("Malformed document structure: {}", e))
        })?;

        info!(
            name = %file.name,
            sections = insights.structure.len(),
            "Document processed"
        );
        Ok(insights)
    }

    async fn ask(&self, question: &str) -> InsightResult<String> {
        let url = self.endpoint("/ask");
        debug!(url = %url, "Asking question");

        let request = AskRequest {
            query: question.to_string(),
        };

        let response = self.client.post(&url).json(&request).send().await.map_err(|e| {
            warn!("Ask request failed: {}", e);
            InsightError::AskFailed(format!("Network error: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let reason = error_detail(response)
                .await
                .unwrap_or_else(|| DEFAULT_ASK_ERROR.to_string());
            warn!(status = %status, "Ask rejected: {}", reason);
            return Err(InsightError::AskFailed(reason));
        }

        let body: AskResponse = response
            .json()
            .await
            .map_err(|e| InsightError::AskFailed(format!("Malformed response: {}", e)))?;

        Ok(body.response)
    }
}

// Internal: pull `detail` out of an error body, if there is one
async fn error_detail(response: reqwest::Response) -> Option<String> {
    response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.detail)
        .filter(|detail| !detail.trim().is_empty())
}
