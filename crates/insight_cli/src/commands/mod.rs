//! CLI command definitions.
//!
//! Each subcommand drives one slice of the upload -> process -> chat workflow.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use insight_chat::{
    ClientConfig, DocumentFile, Notifier, NotifyVariant, UploadedFileRef, WorkflowController,
    ENV_API_URL,
};

pub mod ask;
pub mod chat;
pub mod upload;

/// InsightAI - chat with your documents
#[derive(Parser)]
#[command(name = "insight")]
#[command(version, about = "InsightAI - upload a document and ask questions about it")]
#[command(long_about = r#"
InsightAI sends a document to the document-intelligence backend, shows the
extracted summary, key topics and structure, and lets you ask questions
about it.

WORKFLOWS:
  upload  → Upload a PDF, TXT or DOCX file and print its insights
  ask     → Ask a single question (backends without cookie sessions)
  chat    → Upload a document and chat about it interactively

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Unsupported file type
  4 - Upload failure
  5 - Ask failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Backend base URL
    #[arg(long, global = true, env = ENV_API_URL)]
    pub api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Do not keep cookies between requests
    #[arg(long, global = true)]
    pub no_credentials: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload a document and print its insights
    Upload(upload::UploadArgs),

    /// Ask one standalone question; cookie sessions are not carried over
    Ask(ask::AskArgs),

    /// Upload a document and chat about it
    Chat(chat::ChatArgs),
}

impl Cli {
    /// Resolve the backend configuration: settings file, env, then flags.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let current_dir = std::env::current_dir()?;
        self.client_config_in(&current_dir, |key| std::env::var(key).ok())
    }

    /// Same as [`client_config`](Self::client_config) for an explicit root and environment.
    pub fn client_config_in<F>(&self, workspace_root: &Path, lookup: F) -> Result<ClientConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ClientConfig::load_with(workspace_root, lookup)?;

        if let Some(ref url) = self.api_url {
            config = config.with_base_url(url)?;
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout_secs(timeout);
        }
        if self.no_credentials {
            config = config.with_credentials(false);
        }

        Ok(config)
    }
}

/// Prints notifications to stderr
pub struct ConsoleNotifier {
    quiet: bool,
}

impl ConsoleNotifier {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, title: &str, description: &str, variant: NotifyVariant) {
        match variant {
            NotifyVariant::Destructive => eprintln!("⚠️  {}: {}", title, description),
            NotifyVariant::Default if !self.quiet => eprintln!("✅ {}: {}", title, description),
            NotifyVariant::Default => {}
        }
    }
}

/// Read a document from disk, optionally overriding its declared type.
pub async fn load_document(path: &Path, mime: Option<&str>) -> Result<DocumentFile> {
    let file = DocumentFile::from_path(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    Ok(match mime {
        Some(mime) => file.with_mime_type(mime),
        None => file,
    })
}

/// Render the uploaded document card and its insights.
pub fn render_insights(controller: &WorkflowController) -> String {
    let mut out = String::new();

    if let Some(file) = controller.uploaded_file() {
        out.push_str(&render_file_card(file));
    }

    if let Some(insights) = controller.insights() {
        out.push_str("\n🔑 Key Topics\n");
        let topics = insights.topics();
        if topics.is_empty() {
            out.push_str("   (none)\n");
        } else {
            out.push_str(&format!("   {}\n", topics.join(" · ")));
        }

        out.push_str("\n🗂  Document Structure\n");
        for entry in &insights.structure {
            out.push_str(&format!("   {}: {}\n", entry.label, entry.value));
        }

        out.push_str("\n📝 Summary\n");
        out.push_str(&format!("   {}\n", insights.summary));
    }

    out
}

fn render_file_card(file: &UploadedFileRef) -> String {
    let mime = if file.mime_type.is_empty() {
        "document"
    } else {
        file.mime_type.as_str()
    };
    format!("📄 {}\n   {} MB • {}\n", file.name, file.size_mb(), mime)
}
