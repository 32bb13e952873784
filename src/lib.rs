//! Lectern - chapters, answers and quizzes for lecture videos
//!
//! Reads the captions of a YouTube video and asks an AI provider to split it
//! into chapters, answer questions about it, or write a quiz.
//!
//! # Overview
//!
//! - Picks the best caption track (preferred languages, human over
//!   auto-generated, English, then a list of common languages)
//! - Renders provider-agnostic prompts with `[M:SS]` timestamps
//! - Calls Google Gemini first and falls back to OpenRouter only when
//!   Gemini reports quota exhaustion
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `timestamp` - Human-readable timestamp formatting
//! - `transcript` - Caption tracks, track selection, the YouTube source
//! - `task` - Prompt building and response normalization
//! - `provider` - Gemini and OpenRouter clients
//! - `fallback` - The quota-driven fallback state machine
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use lectern::config::Settings;
//! use lectern::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let report = orchestrator.chapters("dQw4w9WgXcQ", &[], None, None).await?;
//!     for chapter in &report.chapters.chapters {
//!         println!("{} {}", chapter.timestamp_seconds, chapter.title);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod fallback;
pub mod orchestrator;
pub mod provider;
pub mod task;
pub mod timestamp;
pub mod transcript;

pub use error::{LecternError, Result};
