//! CLI output formatting utilities.

use crate::provider::ProviderId;
use crate::timestamp::format_timestamp;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print one chapter.
    pub fn chapter(timestamp_seconds: u64, title: &str, summary: &str) {
        println!(
            "\n{} {}",
            style(format!("[{}]", format_timestamp(timestamp_seconds as f64))).cyan(),
            style(title).bold()
        );
        if !summary.is_empty() {
            println!("   {}", summary);
        }
    }

    /// Note which provider produced a result.
    pub fn provider(provider: ProviderId) {
        let label = match provider {
            ProviderId::Primary => "Gemini",
            ProviderId::Secondary => "OpenRouter",
        };
        println!("\n{}", style(format!("Generated with {}", label)).dim());
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}
