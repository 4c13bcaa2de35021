//! Chat command - Upload a document and talk about it.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use insight_chat::{DocumentApi, DocumentClient, Message, WorkflowController};

use super::{render_insights, upload::upload_document, Cli};

#[derive(Args)]
pub struct ChatArgs {
    /// Document to upload (PDF, TXT or DOCX)
    pub path: PathBuf,

    /// Declare the MIME type instead of deriving it from the extension
    #[arg(long)]
    pub mime: Option<String>,
}

/// One line of user input
#[derive(Debug, PartialEq, Eq)]
pub enum ChatCommand {
    Quit,
    /// Discard the document ("Upload Another")
    Reset,
    Ask(String),
    Empty,
}

impl ChatCommand {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "" => Self::Empty,
            "/quit" | "/exit" => Self::Quit,
            "/reset" => Self::Reset,
            _ => Self::Ask(line.to_string()),
        }
    }
}

pub async fn execute(cli: &Cli, args: &ChatArgs) -> Result<()> {
    let client = DocumentClient::new(cli.client_config()?)?;
    let mut controller = WorkflowController::new();

    upload_document(&client, cli.quiet, &mut controller, &args.path, args.mime.as_deref()).await?;

    let mut stdout = std::io::stdout();
    if !cli.quiet {
        writeln!(stdout, "{}", render_insights(&controller))?;
        writeln!(stdout, "Type a question, /reset to upload another document, /quit to leave.\n")?;
    }

    let stdin = BufReader::new(tokio::io::stdin());
    run_loop(&client, &mut controller, stdin, &mut stdout).await
}

/// Read questions line by line until EOF, `/quit` or `/reset`.
pub async fn run_loop<A, R, W>(
    api: &A,
    controller: &mut WorkflowController,
    input: R,
    out: &mut W,
) -> Result<()>
where
    A: DocumentApi + ?Sized,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    if let Some(greeting) = controller.chat().and_then(|chat| chat.transcript().first()) {
        write_message(out, greeting)?;
    }

    let mut lines = input.lines();
    prompt(out)?;

    while let Some(line) = lines.next_line().await? {
        match ChatCommand::parse(&line) {
            ChatCommand::Quit => break,
            ChatCommand::Reset => {
                controller.reset();
                writeln!(out, "Document cleared. Run `insight chat <FILE>` to upload another.")?;
                break;
            }
            ChatCommand::Empty => {}
            ChatCommand::Ask(question) => {
                if let Some(reply) = controller.ask(api, &question).await? {
                    write_message(out, reply)?;
                }
            }
        }
        prompt(out)?;
    }

    Ok(())
}

fn write_message<W: Write>(out: &mut W, message: &Message) -> std::io::Result<()> {
    let speaker = if message.is_user { "you" } else { "insight" };
    writeln!(out, "[{}] {}: {}", message.time_label(), speaker, message.content)
}

fn prompt<W: Write>(out: &mut W) -> std::io::Result<()> {
    write!(out, "> ")?;
    out.flush()
}
