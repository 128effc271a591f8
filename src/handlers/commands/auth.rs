//! Login, signup and session commands

use serde::Serialize;
use tracing::debug;

use super::{prompt, Output};
use crate::cli::{LoginArgs, SignupArgs};
use crate::models::User;
use crate::services::session::SignupForm;
use crate::state::AppContext;
use crate::utils::errors::Result;
use crate::utils::helpers::format_timestamp;
use crate::utils::logging;

fn password_or_prompt(password: Option<String>) -> Result<String> {
    match password {
        Some(password) => Ok(password),
        None => prompt("Password"),
    }
}

/// Handle `campus login`
pub async fn handle_login(context: &AppContext, args: LoginArgs, out: Output) -> Result<()> {
    let password = password_or_prompt(args.password)?;
    let user = context.session().login(&args.email, &password).await?;
    logging::log_user_action(Some(user.id), "login", None);
    out.emit(&user, |u| format!("Logged in as {} ({})", u.full_name, u.role))
}

/// Handle `campus signup`
pub async fn handle_signup(context: &AppContext, args: SignupArgs, out: Output) -> Result<()> {
    let password = password_or_prompt(args.password)?;
    let form = SignupForm {
        email: args.email,
        password,
        full_name: args.full_name,
        role: Some(args.role.into()),
        college_id: args.college,
    };

    let user = context.session().register(&form).await?;
    logging::log_user_action(Some(user.id), "signup", None);
    out.emit(&user, |u| format!("Welcome, {}! You are logged in as {}.", u.full_name, u.role))
}

/// Handle `campus logout`
pub async fn handle_logout(context: &AppContext, out: Output) -> Result<()> {
    let user_id = context.session().current_user().map(|u| u.id);
    context.session().logout().await?;
    logging::log_user_action(user_id, "logout", None);
    out.notice("Logged out.");
    Ok(())
}

/// Handle `campus whoami`
pub fn handle_whoami(context: &AppContext, out: Output) -> Result<()> {
    let user = context.session().require_user()?;
    out.emit(&user, render_user)
}

pub fn render_user(user: &User) -> String {
    let mut lines = vec![
        format!("{} <{}>", user.full_name, user.email),
        format!("  id:      {}", user.id),
        format!("  role:    {}", user.role),
    ];
    if let Some(college_id) = user.college_id {
        lines.push(format!("  college: {}", college_id));
    }
    if let Some(created_at) = user.created_at {
        lines.push(format!("  since:   {}", format_timestamp(created_at)));
    }
    if !user.is_active {
        lines.push("  (inactive)".to_string());
    }
    lines.join("\n")
}

#[derive(Debug, Serialize)]
struct StatusView {
    api_url: String,
    api_reachable: bool,
    api_message: Option<String>,
    authenticated: bool,
    user: Option<String>,
    qr_freshness_window_secs: Option<u64>,
}

/// Handle `campus status`
pub async fn handle_status(context: &AppContext, out: Output) -> Result<()> {
    let health = context.services.health_check().await;
    debug!(?health, "Health check finished");

    let view = StatusView {
        api_url: context.api().base_url().to_string(),
        api_reachable: health.api_reachable,
        api_message: health.api_message.clone(),
        authenticated: health.authenticated,
        user: context.session().current_user().map(|u| u.email),
        qr_freshness_window_secs: health.freshness_window_secs,
    };
    out.emit(&view, |v| {
        let api = if v.api_reachable {
            format!("reachable ({})", v.api_message.as_deref().unwrap_or("ok"))
        } else {
            "unreachable".to_string()
        };
        let session = v.user.as_deref().unwrap_or("not logged in");
        format!("API:     {} {}\nSession: {}", v.api_url, api, session)
    })
}
