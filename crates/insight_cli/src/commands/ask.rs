//! Ask command - One standalone question to the backend.
//!
//! Each invocation starts with an empty cookie store, so a backend that keeps
//! the uploaded document in a cookie session will not see it here. Use `chat`
//! for those backends.

use anyhow::Result;
use clap::Args;

use insight_chat::{DocumentApi, DocumentClient};

use super::Cli;

#[derive(Args)]
pub struct AskArgs {
    /// Question about the uploaded document
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,
}

pub async fn execute(cli: &Cli, args: &AskArgs) -> Result<()> {
    let question = args.question.join(" ");
    if question.trim().is_empty() {
        anyhow::bail!("Question must not be empty");
    }

    let client = DocumentClient::new(cli.client_config()?)?;
    let answer = client.ask(&question).await?;

    println!("{}", answer);
    Ok(())
}
