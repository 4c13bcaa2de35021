//! Upload gate.
//!
//! Checks a selected document against the supported types before it may
//! enter the workflow. Only the declared MIME type is checked.

use std::sync::Arc;

use crate::error::{InsightError, InsightResult};
use crate::notify::{Notifier, NotifyVariant};
use crate::types::{DocumentFile, SUPPORTED_MIME_TYPES};

/// Reason attached to every rejected file
pub const REJECTION_REASON: &str = "unsupported file type";

/// A document that passed the gate. Only the gate can construct one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidFile(DocumentFile);

impl ValidFile {
    pub fn file(&self) -> &DocumentFile {
        &self.0
    }

    pub fn into_inner(self) -> DocumentFile {
        self.0
    }
}

/// A document the gate refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedFile {
    pub file: DocumentFile,
    pub reason: &'static str,
}

impl From<RejectedFile> for InsightError {
    fn from(rejected: RejectedFile) -> Self {
        InsightError::ValidationRejected {
            name: rejected.file.name,
            mime_type: rejected.file.mime_type,
        }
    }
}

/// Validates selections and retains the most recent valid one
pub struct UploadGate {
    notifier: Arc<dyn Notifier>,
    selected: Option<ValidFile>,
}

impl UploadGate {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            selected: None,
        }
    }

    /// Whether a MIME type is on the allow-list
    pub fn is_supported(mime_type: &str) -> bool {
        SUPPORTED_MIME_TYPES.contains(&mime_type)
    }

    /// Check a file without touching the retained selection.
    ///
    /// Rejections are reported through the notifier.
    pub fn validate(&self, file: DocumentFile) -> Result<ValidFile, RejectedFile> {
        if Self::is_supported(&file.mime_type) {
            return Ok(ValidFile(file));
        }

        tracing::debug!(name = %file.name, mime_type = %file.mime_type, "Rejected upload");
        self.notifier.notify(
            "Invalid file type",
            &format!("{}. Please upload a PDF, TXT, or DOCX file.", REJECTION_REASON),
            NotifyVariant::Destructive,
        );

        Err(RejectedFile {
            file,
            reason: REJECTION_REASON,
        })
    }

    /// Validate and retain a selection, replacing any earlier valid one.
    ///
    /// An invalid selection leaves the previous one in place.
    pub fn select(&mut self, file: DocumentFile) -> InsightResult<()> {
        let valid = self.validate(file)?;

        self.notifier.notify(
            "File selected",
            &format!("{} has been selected for processing.", valid.file().name),
            NotifyVariant::Default,
        );
        self.selected = Some(valid);
        Ok(())
    }

    /// Currently retained selection
    pub fn selected(&self) -> Option<&ValidFile> {
        self.selected.as_ref()
    }

    /// Hand the retained selection to the workflow.
    pub fn take_selection(&mut self) -> Option<ValidFile> {
        let valid = self.selected.take()?;

        self.notifier.notify(
            "Success!",
            &format!("{} has been uploaded for processing.", valid.file().name),
            NotifyVariant::Default,
        );
        Some(valid)
    }
}
