//! Doctor command - verify credentials, tools and configuration.

use crate::cli::Output;
use crate::config::{ProviderSettings, Settings};
use crate::provider::ProviderId;
use console::style;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Lectern Doctor");
    println!();
    println!("Checking credentials and external tools...\n");

    let mut checks = Vec::new();

    println!("{}", style("External Tools").bold());
    let ytdlp = check_tool(&settings.transcript.ytdlp_path, install_hint_ytdlp());
    ytdlp.print();
    checks.push(ytdlp);

    println!();

    println!("{}", style("Providers").bold());
    let primary_key = settings.providers.primary.api_key();
    let secondary_key = settings.providers.secondary.api_key();
    let default = settings.providers.default;
    for check in [
        check_credential(
            "Gemini",
            &settings.providers.primary,
            primary_key.as_deref(),
            default == ProviderId::Primary,
        ),
        check_credential(
            "OpenRouter",
            &settings.providers.secondary,
            secondary_key.as_deref(),
            default == ProviderId::Secondary,
        ),
        check_routing(default, primary_key.is_some(), secondary_key.is_some()),
    ] {
        check.print();
        checks.push(check);
    }

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Lectern.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Lectern is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str, hint: &str) -> CheckResult {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();
            CheckResult::ok(name, &version)
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error(name, "not found", hint)
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

/// Report whether a provider key is present, without printing it.
fn check_credential(
    label: &str,
    settings: &ProviderSettings,
    key: Option<&str>,
    required: bool,
) -> CheckResult {
    let name = format!("{} ({})", label, settings.api_key_env);
    let hint = format!("Set with: export {}='...'", settings.api_key_env);
    match key {
        Some(key) => CheckResult::ok(
            &name,
            &format!("configured ({}, model {})", mask(key), settings.model),
        ),
        None if required => CheckResult::error(&name, "not set", &hint),
        None => CheckResult::warning(&name, "not set", &hint),
    }
}

/// Describe which provider is tried first and whether fallback is possible.
fn check_routing(default: ProviderId, primary: bool, secondary: bool) -> CheckResult {
    match (default, primary, secondary) {
        (ProviderId::Primary, true, true) => {
            CheckResult::ok("Routing", "Gemini first, OpenRouter on quota exhaustion")
        }
        (ProviderId::Primary, true, false) => CheckResult::warning(
            "Routing",
            "Gemini only",
            "Configure OpenRouter to survive Gemini quota exhaustion",
        ),
        (ProviderId::Secondary, _, true) => CheckResult::ok("Routing", "OpenRouter by default"),
        _ => CheckResult::error(
            "Routing",
            "the default provider has no credential",
            "Set the key, or change [providers] default in the config file",
        ),
    }
}

fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: lectern config init",
        )
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}
