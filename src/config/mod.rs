//! Configuration module for Lectern.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{ChapterPrompts, Prompts, QuestionPrompts, QuizPrompts};
pub use settings::{
    ChapterSettings, GeneralSettings, PromptSettings, ProviderSettings, ProvidersSettings,
    QuizSettings, Settings, TranscriptSettings,
};
