//! Command-line interface for campus-events.
//!
//! This module provides the CLI structure for the `campus` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AttendanceCommand, CollegesCommand, ConfigCommand, EventFilterArgs, EventFormArgs,
    EventTypeArg, EventUpdateArgs, EventsCommand, FeedbackCommand, LoginArgs, RoleArg, SignupArgs,
    UsersCommand,
};

/// campus - Campus event management from the terminal
///
/// Browse and manage campus events, register, check in with QR codes and
/// leave feedback against the campus events API.
#[derive(Debug, Parser)]
#[command(name = "campus")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and remember the session
    Login(LoginArgs),

    /// Create an account and log in
    Signup(SignupArgs),

    /// Forget the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Check that the API is reachable
    Status,

    /// Browse and manage events
    #[command(subcommand)]
    Events(EventsCommand),

    /// List or create colleges
    #[command(subcommand)]
    Colleges(CollegesCommand),

    /// List users (admin)
    #[command(subcommand)]
    Users(UsersCommand),

    /// Check in to events and generate attendance QR codes
    #[command(subcommand)]
    Attendance(AttendanceCommand),

    /// Rate events and read ratings
    #[command(subcommand)]
    Feedback(FeedbackCommand),

    /// Your registrations, attendance and feedback
    My,

    /// Attendance and feedback report (admin)
    Report(EventFilterArgs),

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Log level implied by the verbosity flags, if any
    #[must_use]
    pub fn log_level(&self) -> Option<&'static str> {
        if self.quiet {
            Some("error")
        } else {
            match self.verbose {
                0 => None,
                1 => Some("debug"),
                _ => Some("trace"),
            }
        }
    }
}
