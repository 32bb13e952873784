//! Lectern CLI entry point.

use anyhow::Result;
use clap::Parser;
use lectern::cli::{commands, Cli, Commands};
use lectern::config::Settings;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_ref().map(PathBuf::from);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging; -v overrides the configured level
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("lectern={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Execute command
    match &cli.command {
        Commands::Chapters {
            input,
            languages,
            provider,
            model,
            json,
        } => {
            commands::run_chapters(input, languages, *provider, model.clone(), *json, settings)
                .await?;
        }

        Commands::Ask {
            input,
            question,
            title,
            provider,
            json,
        } => {
            commands::run_ask(input, question, title, *provider, *json, settings).await?;
        }

        Commands::Quiz {
            input,
            title,
            provider,
            json,
        } => {
            commands::run_quiz(input, title, *provider, *json, settings).await?;
        }

        Commands::Transcript {
            input,
            languages,
            json,
        } => {
            commands::run_transcript(input, languages, *json, settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, *port, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, config_path, settings)?;
        }
    }

    Ok(())
}
