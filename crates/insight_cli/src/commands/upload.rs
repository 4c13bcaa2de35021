//! Upload command - Process a document and show its insights.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tracing::info;

use insight_chat::{DocumentApi, UploadGate, WorkflowController};

use super::{load_document, render_insights, Cli, ConsoleNotifier};

#[derive(Args)]
pub struct UploadArgs {
    /// Document to upload (PDF, TXT or DOCX)
    pub path: PathBuf,

    /// Declare the MIME type instead of deriving it from the extension
    #[arg(long)]
    pub mime: Option<String>,
}

pub async fn execute(cli: &Cli, args: &UploadArgs) -> Result<()> {
    let client = insight_chat::DocumentClient::new(cli.client_config()?)?;
    let mut controller = WorkflowController::new();

    upload_document(&client, cli.quiet, &mut controller, &args.path, args.mime.as_deref()).await?;

    println!("{}", render_insights(&controller));
    Ok(())
}

/// Gate a file from disk and run it through the controller.
pub async fn upload_document<A>(
    api: &A,
    quiet: bool,
    controller: &mut WorkflowController,
    path: &Path,
    mime: Option<&str>,
) -> Result<()>
where
    A: DocumentApi + ?Sized,
{
    let mut gate = UploadGate::new(Arc::new(ConsoleNotifier::new(quiet)));
    gate.select(load_document(path, mime).await?)?;

    let Some(file) = gate.take_selection() else {
        anyhow::bail!("No document selected");
    };

    info!("Processing {}...", file.file().name);
    if let Err(e) = controller.upload(api, file).await {
        if let Some(message) = controller.error() {
            eprintln!("{}", message);
        }
        return Err(e.into());
    }

    Ok(())
}
