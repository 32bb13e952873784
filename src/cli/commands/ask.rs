//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::provider::ProviderId;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    input: &str,
    question: &str,
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
    let spinner = Output::spinner("Thinking...");

    match orchestrator.answer(input, title, question, provider).await {
        Ok(report) => {
            spinner.finish_and_clear();
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("\n{}", report.answer.text);
                Output::provider(report.provider);
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
