//! Pre-flight checks before network-bound operations.
//!
//! Validates that required tools and credentials are available before
//! starting work that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{LecternError, Result};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Fetching a transcript needs yt-dlp.
    Transcript,
    /// AI tasks need yt-dlp and at least one provider credential.
    Generate,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    check_tool(&settings.transcript.ytdlp_path)?;
    if let Operation::Generate = operation {
        check_credentials(settings)?;
    }
    Ok(())
}

/// At least one provider must have a key; which one is needed is decided per request.
fn check_credentials(settings: &Settings) -> Result<()> {
    let providers = &settings.providers;
    if providers.primary.api_key().is_some() || providers.secondary.api_key().is_some() {
        return Ok(());
    }
    Err(LecternError::MissingCredential(format!(
        "neither {} nor {} is set",
        providers.primary.api_key_env, providers.secondary.api_key_env
    )))
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(LecternError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(LecternError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(LecternError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
