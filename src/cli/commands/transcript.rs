//! Transcript command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::timestamp::format_timestamp;
use anyhow::Result;

/// Run the transcript command.
pub async fn run_transcript(
    input: &str,
    languages: &[String],
    json: bool,
    settings: Settings,
) -> Result<()> {
    preflight::check(Operation::Transcript, &settings)?;

    let orchestrator = Orchestrator::new(settings)?;
    let spinner = Output::spinner("Fetching transcript...");
    let result = orchestrator.transcript(input, languages).await;
    spinner.finish_and_clear();

    let report = result.map_err(|e| {
        Output::error(&format!("Failed to fetch transcript: {}", e));
        e
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.transcript)?);
        return Ok(());
    }

    let transcript = &report.transcript;
    Output::header(&format!("Transcript for {}", transcript.video_id));
    Output::kv("Language", &transcript.language_code);
    Output::kv(
        "Captions",
        if transcript.is_auto_generated {
            "auto-generated"
        } else {
            "manual"
        },
    );
    Output::kv("Selected by", &report.tier.to_string());
    Output::kv("Duration", &format_timestamp(transcript.duration_seconds()));
    println!();
    println!("{}", transcript.format_with_timestamps());

    Ok(())
}
