//! Chapters command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::provider::ProviderId;
use anyhow::Result;

/// Run the chapters command.
pub async fn run_chapters(
    input: &str,
    languages: &[String],
    provider: Option<ProviderId>,
    model: Option<String>,
    json: bool,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Generate, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'lectern doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let spinner = Output::spinner("Reading transcript and generating chapters...");

    let report = match orchestrator.chapters(input, languages, provider, model).await {
        Ok(report) => {
            spinner.finish_and_clear();
            report
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate chapters: {}", e));
            return Err(e.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    Output::header(&format!("Chapters for {}", report.video_id));
    for chapter in &report.chapters.chapters {
        Output::chapter(chapter.timestamp_seconds, &chapter.title, &chapter.summary);
    }
    if report.chapters.chapters.is_empty() {
        Output::warning("The model returned no chapters.");
    }

    if !report.chapters.overall_summary.is_empty() {
        Output::header("Summary");
        println!("{}", report.chapters.overall_summary);
    }
    Output::provider(report.provider);

    Ok(())
}
