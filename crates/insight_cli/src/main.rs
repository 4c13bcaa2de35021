//! InsightAI CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Unsupported file type
//! - 4: Upload failure
//! - 5: Ask failure

use std::process::ExitCode;

use clap::Parser;
use insight_chat::InsightError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const UPLOAD_ERROR: u8 = 4;
    pub const ASK_ERROR: u8 = 5;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose {
        "insight=debug,insight_chat=debug,warn"
    } else if cli.quiet {
        "error"
    } else {
        "insight=info,insight_chat=info,warn"
    };
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let result = match cli.command {
        Commands::Upload(ref args) => commands::upload::execute(&cli, args).await,
        Commands::Ask(ref args) => commands::ask::execute(&cli, args).await,
        Commands::Chat(ref args) => commands::chat::execute(&cli, args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<InsightError>() {
        Some(InsightError::ValidationRejected { .. }) => ExitCodes::VALIDATION_FAILURE,
        Some(InsightError::UploadFailed(_)) => ExitCodes::UPLOAD_ERROR,
        Some(InsightError::AskFailed(_)) => ExitCodes::ASK_ERROR,
        Some(InsightError::Config(_)) => ExitCodes::INVALID_ARGS,
        _ => ExitCodes::GENERAL_ERROR,
    }
}
