//! Quiz command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::provider::ProviderId;
use anyhow::Result;
use console::style;

/// Run the quiz command.
pub async fn run_quiz(
    input: &str,
    title: &str,
    provider: Option<ProviderId>,
    json: bool,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Generate, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'lectern doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let spinner = Output::spinner("Writing quiz...");

    let report = match orchestrator.quiz(input, title, provider).await {
        Ok(report) => {
            spinner.finish_and_clear();
            report
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate quiz: {}", e));
            return Err(e.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    Output::header("Quiz");
    for (idx, item) in report.quiz.items.iter().enumerate() {
        println!("\n{} {}", style(format!("{}.", idx + 1)).bold(), item.question);
        for option in &item.options {
            println!("   {}", option);
        }
        Output::kv("Answer", &item.correct_letter.to_string());
    }
    Output::provider(report.provider);

    Ok(())
}
