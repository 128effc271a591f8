//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::models::{EventType, UserRole};
use crate::services::stats::EventFilter;

/// Login arguments.
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email
    #[arg(short, long)]
    pub email: String,

    /// Password (prompted when omitted)
    #[arg(short, long, env = "CAMPUS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    Student,
    Admin,
}

impl From<RoleArg> for UserRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Student => UserRole::Student,
            RoleArg::Admin => UserRole::Admin,
        }
    }
}

/// Signup arguments.
#[derive(Debug, Args)]
pub struct SignupArgs {
    #[arg(short, long)]
    pub email: String,

    /// Full name
    #[arg(short = 'n', long = "name")]
    pub full_name: String,

    /// Password (prompted when omitted)
    #[arg(short, long, env = "CAMPUS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[arg(short, long, value_enum, default_value = "student")]
    pub role: RoleArg,

    /// College the account belongs to
    #[arg(long)]
    pub college: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EventTypeArg {
    Workshop,
    Fest,
    Seminar,
    Conference,
    Sports,
    Cultural,
}

impl From<EventTypeArg> for EventType {
    fn from(arg: EventTypeArg) -> Self {
        match arg {
            EventTypeArg::Workshop => EventType::Workshop,
            EventTypeArg::Fest => EventType::Fest,
            EventTypeArg::Seminar => EventType::Seminar,
            EventTypeArg::Conference => EventType::Conference,
            EventTypeArg::Sports => EventType::Sports,
            EventTypeArg::Cultural => EventType::Cultural,
        }
    }
}

/// Filters shared by `events list` and `report`.
#[derive(Debug, Clone, Default, Args)]
pub struct EventFilterArgs {
    /// Match titles containing this text
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only events of this type
    #[arg(short = 't', long = "type", value_enum)]
    pub event_type: Option<EventTypeArg>,

    /// Match college names containing this text
    #[arg(long)]
    pub college: Option<String>,
}

impl From<&EventFilterArgs> for EventFilter {
    fn from(args: &EventFilterArgs) -> Self {
        EventFilter {
            search: args.search.clone(),
            event_type: args.event_type.map(Into::into),
            college: args.college.clone(),
        }
    }
}

/// Fields of a new event.
#[derive(Debug, Args)]
pub struct EventFormArgs {
    #[arg(long)]
    pub title: String,

    #[arg(short = 't', long = "type", value_enum)]
    pub event_type: EventTypeArg,

    /// Start time, e.g. 2024-09-01T14:00 (UTC)
    #[arg(short, long)]
    pub date: String,

    #[arg(long)]
    pub college: i64,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(short, long)]
    pub location: Option<String>,

    /// Capacity
    #[arg(long)]
    pub max_attendees: Option<i32>,
}

/// Fields to change on an existing event.
#[derive(Debug, Args)]
pub struct EventUpdateArgs {
    pub event_id: i64,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(short = 't', long = "type", value_enum)]
    pub event_type: Option<EventTypeArg>,

    #[arg(short, long)]
    pub date: Option<String>,

    #[arg(long)]
    pub college: Option<i64>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(short, long)]
    pub location: Option<String>,

    #[arg(long)]
    pub max_attendees: Option<i32>,
}

/// Event commands.
#[derive(Debug, Subcommand)]
pub enum EventsCommand {
    /// List events with registration and attendance counts
    List(EventFilterArgs),

    /// Show one event with its statistics
    Show { event_id: i64 },

    /// Create an event (admin)
    Create(EventFormArgs),

    /// Update an event (admin)
    Update(EventUpdateArgs),

    /// Delete an event (admin)
    Delete {
        event_id: i64,

        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Register for an event
    Register { event_id: i64 },
}

/// College commands.
#[derive(Debug, Subcommand)]
pub enum CollegesCommand {
    List,
    /// Create a college (admin)
    Create { name: String },
}

/// User commands.
#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List students with their registration and attendance counts
    List,
}

/// Attendance commands.
#[derive(Debug, Subcommand)]
pub enum AttendanceCommand {
    /// Check in to an event you are registered for
    Mark { event_id: i64 },

    /// Check in by scanning a QR code image (PNG or JPEG)
    Scan {
        image: PathBuf,

        /// Admin check-in against this event instead of self check-in
        #[arg(short, long)]
        event: Option<i64>,
    },

    /// Generate the attendance QR code for an event
    Qr {
        event_id: i64,

        /// Write to a .png, .svg or .txt file instead of the terminal
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Feedback commands.
#[derive(Debug, Subcommand)]
pub enum FeedbackCommand {
    /// Rate an event you attended
    Submit {
        event_id: i64,

        /// Rating from 1 to 5
        rating: u8,

        #[arg(short = 'm', long)]
        comment: Option<String>,
    },

    /// List feedback, optionally for one event
    List {
        #[arg(short, long)]
        event: Option<i64>,
    },

    /// Average rating of an event
    Rating { event_id: i64 },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
}
