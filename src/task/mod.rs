//! AI tasks: what is asked of a provider and what comes back.

mod builder;
mod parse;

pub use builder::TaskPromptBuilder;

use crate::provider::ProviderOutcome;
use serde::Serialize;

/// The three things Lectern asks a provider to do.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum TaskKind {
    /// Segment the transcript into chapters.
    Chapters { duration_seconds: f64 },
    /// Answer a question about the video.
    Question,
    /// Write a multiple-choice quiz.
    Quiz,
}

impl TaskKind {
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::Chapters { .. } => "chapters",
            TaskKind::Question => "question",
            TaskKind::Quiz => "quiz",
        }
    }

    /// Whether the provider should be asked for a JSON response.
    pub fn wants_json(&self) -> bool {
        !matches!(self, TaskKind::Question)
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A rendered prompt, ready for any provider.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskPrompt {
    pub kind: TaskKind,
    /// Literal instruction text.
    pub text: String,
    /// Request a structured JSON response.
    pub structured: bool,
    /// Model override for the provider that receives this prompt first.
    pub model: Option<String>,
}

impl TaskPrompt {
    pub fn new(kind: TaskKind, text: String) -> Self {
        Self {
            kind,
            text,
            structured: kind.wants_json(),
            model: None,
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model.filter(|m| !m.trim().is_empty());
        self
    }

    /// Normalize a provider's raw reply into this task's result shape.
    pub fn parse_response(&self, raw: &str) -> ProviderOutcome {
        parse::parse_response(self.kind, raw)
    }
}

/// A provider result, shaped by task.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AiResult {
    Chapters(ChapterSet),
    Answer(Answer),
    Quiz(Quiz),
}

/// Chapters plus an overall summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterSet {
    pub chapters: Vec<Chapter>,
    pub overall_summary: String,
}

impl ChapterSet {
    /// Clamp every timestamp into `[0, duration_seconds]` and order by time.
    pub fn clamp_to(&mut self, duration_seconds: f64) {
        let max = if duration_seconds.is_finite() && duration_seconds > 0.0 {
            duration_seconds as u64
        } else {
            0
        };
        for chapter in &mut self.chapters {
            chapter.timestamp_seconds = chapter.timestamp_seconds.min(max);
        }
        self.chapters.sort_by_key(|c| c.timestamp_seconds);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chapter {
    pub timestamp_seconds: u64,
    pub title: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quiz {
    pub items: Vec<QuizItem>,
}

/// One multiple-choice question with options A to D.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizItem {
    pub question: String,
    pub options: [String; 4],
    pub correct_letter: char,
}
