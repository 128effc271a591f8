//! Command handlers module
//!
//! One handler per CLI command. Handlers print their results and return
//! errors to the caller, which reports them and sets the exit code.

pub mod admin;
pub mod attendance;
pub mod auth;
pub mod config;
pub mod events;
pub mod feedback;
pub mod reports;

use std::io::{BufRead, Write};

use serde::Serialize;

use crate::cli::{
    AttendanceCommand, CollegesCommand, Command, ConfigCommand, EventsCommand, FeedbackCommand,
    UsersCommand,
};
use crate::state::AppContext;
use crate::utils::errors::Result;

/// How results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Output {
    pub json: bool,
}

impl Output {
    /// Print `value` as JSON, or the text produced by `render`
    pub fn emit<T, F>(&self, value: &T, render: F) -> Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce(&T) -> String,
    {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", render(value));
        }
        Ok(())
    }

    /// Plain status line, suppressed in JSON mode
    pub fn notice(&self, message: &str) {
        if !self.json {
            println!("{}", message);
        }
    }
}

/// Main command dispatcher
pub async fn handle_command(command: Command, context: &AppContext, out: Output) -> Result<()> {
    match command {
        Command::Login(args) => auth::handle_login(context, args, out).await,
        Command::Signup(args) => auth::handle_signup(context, args, out).await,
        Command::Logout => auth::handle_logout(context, out).await,
        Command::Whoami => auth::handle_whoami(context, out),
        Command::Status => auth::handle_status(context, out).await,

        Command::Events(cmd) => match cmd {
            EventsCommand::List(filter) => events::handle_list(context, &filter, out).await,
            EventsCommand::Show { event_id } => events::handle_show(context, event_id, out).await,
            EventsCommand::Create(form) => events::handle_create(context, form, out).await,
            EventsCommand::Update(form) => events::handle_update(context, form, out).await,
            EventsCommand::Delete { event_id, yes } => {
                events::handle_delete(context, event_id, yes, out).await
            }
            EventsCommand::Register { event_id } => {
                events::handle_register(context, event_id, out).await
            }
        },

        Command::Colleges(cmd) => match cmd {
            CollegesCommand::List => admin::handle_colleges_list(context, out).await,
            CollegesCommand::Create { name } => {
                admin::handle_college_create(context, &name, out).await
            }
        },
        Command::Users(UsersCommand::List) => admin::handle_users_list(context, out).await,

        Command::Attendance(cmd) => match cmd {
            AttendanceCommand::Mark { event_id } => {
                attendance::handle_mark(context, event_id, out).await
            }
            AttendanceCommand::Scan { image, event } => {
                attendance::handle_scan(context, &image, event, out).await
            }
            AttendanceCommand::Qr { event_id, output } => {
                attendance::handle_qr(context, event_id, output.as_deref(), out).await
            }
        },

        Command::Feedback(cmd) => match cmd {
            FeedbackCommand::Submit {
                event_id,
                rating,
                comment,
            } => feedback::handle_submit(context, event_id, rating, comment, out).await,
            FeedbackCommand::List { event } => feedback::handle_list(context, event, out).await,
            FeedbackCommand::Rating { event_id } => {
                feedback::handle_rating(context, event_id, out).await
            }
        },

        Command::My => reports::handle_my(context, out).await,
        Command::Report(filter) => reports::handle_report(context, &filter, out).await,
        Command::Config(ConfigCommand::Show) => config::handle_show(context, out),
    }
}

/// Read one line from stdin after printing `label`
pub fn prompt(label: &str) -> Result<String> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{}: ", label)?;
    stdout.flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Ask a yes/no question; anything but "y"/"yes" is no
pub fn confirm(question: &str) -> Result<bool> {
    let answer = prompt(&format!("{} [y/N]", question))?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
