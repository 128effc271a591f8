//! Configuration commands

use super::Output;
use crate::config::Settings;
use crate::state::AppContext;
use crate::utils::errors::{CampusError, Result};

/// Settings as TOML, with the resolved credentials path filled in
pub fn render_settings(settings: &Settings) -> Result<String> {
    let mut resolved = settings.clone();
    resolved.storage.credentials_path = Some(settings.credentials_path());
    toml::to_string_pretty(&resolved).map_err(|e| CampusError::Config(e.to_string()))
}

/// Handle `campus config show`
pub fn handle_show(context: &AppContext, out: Output) -> Result<()> {
    if out.json {
        return out.emit(&context.settings, |_| String::new());
    }
    println!("{}", render_settings(&context.settings)?);
    Ok(())
}
