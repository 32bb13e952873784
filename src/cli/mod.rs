//! CLI module for Lectern.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::provider::ProviderId;
use clap::{Parser, Subcommand};

/// Lectern - chapters, answers and quizzes for lecture videos
///
/// Reads a YouTube video's captions and asks Gemini (falling back to
/// OpenRouter when Gemini's quota runs out) to structure them.
#[derive(Parser, Debug)]
#[command(name = "lectern")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate chapters and a summary for a video
    Chapters {
        /// YouTube URL or video ID
        input: String,

        /// Preferred caption languages, in order (e.g. -l hi -l en)
        #[arg(short, long = "lang")]
        languages: Vec<String>,

        /// Provider to try first (gemini or openrouter)
        #[arg(short, long)]
        provider: Option<ProviderId>,

        /// Model override for the first provider tried
        #[arg(short, long)]
        model: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ask a question about a video
    Ask {
        /// YouTube URL or video ID
        input: String,

        /// The question to ask
        question: String,

        /// Video title, given to the model as context
        #[arg(short, long, default_value = "")]
        title: String,

        /// Provider to try first (gemini or openrouter)
        #[arg(short, long)]
        provider: Option<ProviderId>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate a multiple-choice quiz for a video
    Quiz {
        /// YouTube URL or video ID
        input: String,

        /// Video title, given to the model as context
        #[arg(short, long, default_value = "")]
        title: String,

        /// Provider to try first (gemini or openrouter)
        #[arg(short, long)]
        provider: Option<ProviderId>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch a video's transcript
    Transcript {
        /// YouTube URL or video ID
        input: String,

        /// Preferred caption languages, in order
        #[arg(short, long = "lang")]
        languages: Vec<String>,

        /// Print segments as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },

    /// Check credentials and external tools
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the current configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
