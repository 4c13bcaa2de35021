//! Workflow controller.
//!
//! Sequences `Idle -> Uploading -> Processed` and back to `Idle` on reset.
//! Each phase carries exactly the data valid in it, so insights exist only
//! once processed and the file reference only while uploading or processed.
//!
//! Asynchronous results come back with a ticket. Tickets issued before a
//! reset or a newer upload are stale and their results are ignored.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::client::DocumentApi;
use crate::error::{InsightError, InsightResult};
use crate::gate::ValidFile;
use crate::session::{ChatSession, ReplyPolicy, RequestId};
use crate::types::{DocumentInsights, Message, UploadedFileRef};

/// Message surfaced after a failed upload
pub const UPLOAD_ERROR_MESSAGE: &str = "Failed to upload file. Please try again.";

/// Coarse workflow state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Idle,
    Uploading,
    Processed,
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Uploading => write!(f, "uploading"),
            Self::Processed => write!(f, "processed"),
        }
    }
}

#[derive(Debug)]
enum Phase {
    Idle,
    Uploading {
        file: UploadedFileRef,
    },
    Processed {
        file: UploadedFileRef,
        insights: DocumentInsights,
        chat: ChatSession,
    },
}

/// Proof that an upload was started; redeemed by [`WorkflowController::complete_upload`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    generation: u64,
}

/// A chat question bound to the session that asked it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTicket {
    generation: u64,
    pub request_id: RequestId,
    pub question: String,
}

/// Owns the uploaded document, its insights and the chat about it
#[derive(Debug)]
pub struct WorkflowController {
    phase: Phase,
    error: Option<String>,
    generation: u64,
    reply_policy: ReplyPolicy,
}

impl Default for WorkflowController {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowController {
    pub fn new() -> Self {
        Self::with_reply_policy(ReplyPolicy::default())
    }

    /// Controller whose chat sessions use the given reply policy
    pub fn with_reply_policy(reply_policy: ReplyPolicy) -> Self {
        Self {
            phase: Phase::Idle,
            error: None,
            generation: 0,
            reply_policy,
        }
    }

    pub fn state(&self) -> WorkflowState {
        match self.phase {
            Phase::Idle => WorkflowState::Idle,
            Phase::Uploading { .. } => WorkflowState::Uploading,
            Phase::Processed { .. } => WorkflowState::Processed,
        }
    }

    /// Whether an upload is in progress
    pub fn is_processing(&self) -> bool {
        self.state() == WorkflowState::Uploading
    }

    pub fn uploaded_file(&self) -> Option<&UploadedFileRef> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Uploading { file } | Phase::Processed { file, .. } => Some(file),
        }
    }

    pub fn insights(&self) -> Option<&DocumentInsights> {
        match &self.phase {
            Phase::Processed { insights, .. } => Some(insights),
            _ => None,
        }
    }

    pub fn chat(&self) -> Option<&ChatSession> {
        match &self.phase {
            Phase::Processed { chat, .. } => Some(chat),
            _ => None,
        }
    }

    pub fn chat_mut(&mut self) -> Option<&mut ChatSession> {
        match &mut self.phase {
            Phase::Processed { chat, .. } => Some(chat),
            _ => None,
        }
    }

    /// Error surfaced by the last failed upload
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Start uploading a validated file.
    pub fn begin_upload(&mut self, file: &ValidFile) -> InsightResult<UploadTicket> {
        if !matches!(self.phase, Phase::Idle) {
            return Err(self.invalid_state("begin_upload"));
        }

        let file = file.file().file_ref();
        debug!(name = %file.name, size = file.size, "Upload started");

        self.generation += 1;
        self.error = None;
        self.phase = Phase::Uploading { file };

        Ok(UploadTicket {
            generation: self.generation,
        })
    }

    /// Apply the outcome of an upload.
    ///
    /// Returns `false` when the ticket is stale and nothing changed.
    pub fn complete_upload(
        &mut self,
        ticket: &UploadTicket,
        outcome: InsightResult<DocumentInsights>,
    ) -> bool {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "Ignoring stale upload result"
            );
            return false;
        }

        let file = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Uploading { file } => file,
            other => {
                self.phase = other;
                return false;
            }
        };

        match outcome {
            Ok(insights) => {
                info!(name = %file.name, "Document ready for chat");
                let chat = ChatSession::with_policy(Some(&file.name), self.reply_policy);
                self.phase = Phase::Processed {
                    file,
                    insights,
                    chat,
                };
            }
            Err(e) => {
                warn!(name = %file.name, "Upload failed: {}", e);
                self.error = Some(UPLOAD_ERROR_MESSAGE.to_string());
            }
        }
        true
    }

    /// Upload a file through the api and apply the result.
    pub async fn upload<A>(&mut self, api: &A, file: ValidFile) -> InsightResult<&DocumentInsights>
    where
        A: DocumentApi + ?Sized,
    {
        let ticket = self.begin_upload(&file)?;
        let outcome = api.submit_document(file.file()).await;
        drop(file);

        let failure = match &outcome {
            Ok(_) => None,
            Err(e) => Some(InsightError::UploadFailed(e.reason())),
        };

        self.complete_upload(&ticket, outcome);

        match failure {
            Some(e) => Err(e),
            None => self
                .insights()
                .ok_or_else(|| self.invalid_state("upload")),
        }
    }

    /// Return to idle, discarding the document, its insights and the chat.
    pub fn reset(&mut self) {
        if let Some(file) = self.uploaded_file() {
            debug!(name = %file.name, "Resetting workflow");
        }
        self.generation += 1;
        self.error = None;
        self.phase = Phase::Idle;
    }

    /// Submit a question to the active chat session.
    ///
    /// Returns `Ok(None)` for blank text.
    pub fn submit_question(&mut self, text: &str) -> InsightResult<Option<ChatTicket>> {
        let generation = self.generation;
        let Some(chat) = self.chat_mut() else {
            return Err(self.invalid_state("submit_question"));
        };

        Ok(chat.submit(text).map(|pending| ChatTicket {
            generation,
            request_id: pending.request_id,
            question: pending.question,
        }))
    }

    /// Route a reply to the session that asked.
    ///
    /// Replies for a session that has since been discarded are ignored.
    pub fn deliver_reply(&mut self, ticket: &ChatTicket, outcome: InsightResult<String>) -> bool {
        if ticket.generation != self.generation {
            debug!(request_id = ticket.request_id, "Ignoring reply for disposed session");
            return false;
        }

        match self.chat_mut() {
            Some(chat) => chat.resolve(ticket.request_id, outcome),
            None => false,
        }
    }

    /// Ask a question through the api and apply the reply.
    pub async fn ask<A>(&mut self, api: &A, text: &str) -> InsightResult<Option<&Message>>
    where
        A: DocumentApi + ?Sized,
    {
        let Some(ticket) = self.submit_question(text)? else {
            return Ok(None);
        };

        let outcome = api.ask(&ticket.question).await;
        if self.deliver_reply(&ticket, outcome) {
            Ok(self.chat().and_then(|chat| chat.transcript().last()))
        } else {
            Ok(None)
        }
    }

    fn invalid_state(&self, operation: &str) -> InsightError {
        InsightError::InvalidState {
            current: self.state().to_string(),
            operation: operation.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockDocumentApi;
    use crate::gate::UploadGate;
    use crate::notify::TracingNotifier;
    use crate::session::{ChatState, APOLOGY_MESSAGE};
    use crate::types::{DocumentFile, StructureEntry, MIME_PDF};
    use std::sync::Arc;

    fn valid(name: &str) -> ValidFile {
        let gate = UploadGate::new(Arc::new(TracingNotifier));
        gate.validate(DocumentFile::new(name, MIME_PDF, vec![0u8; 2048]))
            .unwrap()
    }

    fn insights() -> DocumentInsights {
        DocumentInsights {
            summary: "S".to_string(),
            key_topics: "a,b,c".to_string(),
            structure: vec![StructureEntry::new("Section", "Intro")],
        }
    }

    fn processed() -> WorkflowController {
        let mut controller = WorkflowController::new();
        let ticket = controller.begin_upload(&valid("report.pdf")).unwrap();
        assert!(controller.complete_upload(&ticket, Ok(insights())));
        controller
    }

    #[test]
    fn test_initial_state() {
        let controller = WorkflowController::new();
        assert_eq!(controller.state(), WorkflowState::Idle);
        assert!(controller.uploaded_file().is_none());
        assert!(controller.insights().is_none());
        assert!(controller.chat().is_none());
    }

    #[test]
    fn test_begin_upload_records_file() {
        let mut controller = WorkflowController::new();
        controller.begin_upload(&valid("report.pdf")).unwrap();

        assert_eq!(controller.state(), WorkflowState::Uploading);
        assert!(controller.is_processing());
        let file = controller.uploaded_file().unwrap();
        assert_eq!(file.name, "report.pdf");
        assert_eq!(file.size, 2048);
        assert!(controller.insights().is_none());
    }

    #[test]
    fn test_begin_upload_requires_idle() {
        let mut controller = processed();
        let err = controller.begin_upload(&valid("other.pdf")).unwrap_err();
        assert!(matches!(err, InsightError::InvalidState { .. }));
        assert_eq!(controller.state(), WorkflowState::Processed);
    }

    #[test]
    fn test_success_activates_chat() {
        let controller = processed();
        assert_eq!(controller.state(), WorkflowState::Processed);
        assert_eq!(controller.insights(), Some(&insights()));

        let chat = controller.chat().unwrap();
        assert_eq!(chat.document_name(), Some("report.pdf"));
        assert_eq!(chat.transcript().len(), 1);
    }

    #[test]
    fn test_failure_returns_to_idle_with_error() {
        let mut controller = WorkflowController::new();
        let ticket = controller.begin_upload(&valid("report.pdf")).unwrap();
        controller.complete_upload(&ticket, Err(InsightError::UploadFailed("nope".into())));

        assert_eq!(controller.state(), WorkflowState::Idle);
        assert!(controller.uploaded_file().is_none());
        assert!(controller.insights().is_none());
        assert_eq!(controller.error(), Some(UPLOAD_ERROR_MESSAGE));

        // a fresh attempt clears the error
        controller.begin_upload(&valid("report.pdf")).unwrap();
        assert!(controller.error().is_none());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut controller = processed();
        controller.reset();

        assert_eq!(controller.state(), WorkflowState::Idle);
        assert!(controller.uploaded_file().is_none());
        assert!(controller.insights().is_none());
        assert!(controller.chat().is_none());
    }

    #[test]
    fn test_upload_result_after_reset_is_ignored() {
        let mut controller = WorkflowController::new();
        let ticket = controller.begin_upload(&valid("report.pdf")).unwrap();
        controller.reset();

        assert!(!controller.complete_upload(&ticket, Ok(insights())));
        assert_eq!(controller.state(), WorkflowState::Idle);
        assert!(controller.insights().is_none());
    }

    #[test]
    fn test_reply_for_disposed_session_is_ignored() {
        let mut controller = processed();
        let ticket = controller.submit_question("Q").unwrap().unwrap();

        controller.reset();
        let upload = controller.begin_upload(&valid("next.pdf")).unwrap();
        controller.complete_upload(&upload, Ok(insights()));

        assert!(!controller.deliver_reply(&ticket, Ok("late answer".into())));
        let chat = controller.chat().unwrap();
        assert_eq!(chat.transcript().len(), 1);
        assert_eq!(chat.state(), ChatState::Idle);
    }

    #[test]
    fn test_submit_question_requires_document() {
        let mut controller = WorkflowController::new();
        match controller.submit_question("Q").unwrap_err() {
            InsightError::InvalidState { current, operation } => {
                assert_eq!(current, "idle");
                assert_eq!(operation, "submit_question");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let mut uploading = WorkflowController::new();
        uploading.begin_upload(&valid("report.pdf")).unwrap();
        let err = uploading.submit_question("Q").unwrap_err();
        assert!(err.to_string().contains("current=uploading"));

        let mut controller = processed();
        assert!(controller.submit_question("   ").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upload_and_ask_through_api() {
        let mut api = MockDocumentApi::new();
        api.expect_submit_document()
            .withf(|file| file.name == "report.pdf")
            .times(1)
            .returning(|_| Ok(insights()));
        api.expect_ask()
            .times(1)
            .returning(|_| Err(InsightError::AskFailed("down".into())));

        let mut controller = WorkflowController::new();
        let result = controller.upload(&api, valid("report.pdf")).await.unwrap();
        assert_eq!(result.topics(), vec!["a", "b", "c"]);

        let reply = controller.ask(&api, "Q").await.unwrap().unwrap();
        assert_eq!(reply.content, APOLOGY_MESSAGE);
        assert_eq!(controller.chat().unwrap().transcript().len(), 3);
    }

    #[tokio::test]
    async fn test_upload_failure_surfaces_reason() {
        let mut api = MockDocumentApi::new();
        api.expect_submit_document()
            .returning(|_| Err(InsightError::UploadFailed("File too large".into())));

        let mut controller = WorkflowController::new();
        let err = controller.upload(&api, valid("big.pdf")).await.unwrap_err();

        assert_eq!(err.reason(), "File too large");
        assert_eq!(controller.state(), WorkflowState::Idle);
        assert_eq!(controller.error(), Some(UPLOAD_ERROR_MESSAGE));
    }
}
