//! Campus Events
//!
//! Command-line entry point

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, error};

use campus_events::{
    cli::Cli,
    config::Settings,
    handlers::{handle_command, Output},
    state::AppContext,
    utils::logging,
    CampusError,
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<ExitCode> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Load configuration
    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(level) = cli.log_level() {
        settings.logging.level = level.to_string();
    }
    settings.validate().context("Invalid configuration")?;

    // Initialize logging; the guard flushes the log file on exit
    let _guard = logging::init_logging(&settings.logging)?;
    debug!("{} starting", campus_events::info());

    let context = AppContext::from_settings(settings)?;
    let state = context.session().initialize().await;
    debug!(?state, "Session initialized");

    let out = Output { json: cli.json };
    match handle_command(cli.command, &context, out).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => Ok(report_failure(&e)),
    }
}

/// Print a command failure; duplicate actions are notices, not failures
fn report_failure(e: &CampusError) -> ExitCode {
    if e.is_informational() {
        println!("Notice: {}", e.user_message());
        return ExitCode::SUCCESS;
    }

    error!(error = %e, severity = %e.severity(), "Command failed");
    eprintln!("Error: {}", e.user_message());
    if e.is_session_ending() {
        eprintln!("Run `campus login` to sign in.");
    }
    ExitCode::FAILURE
}
