//! Renders task prompts from a transcript.

use super::{TaskKind, TaskPrompt};
use crate::config::{Prompts, Settings};
use crate::timestamp::format_timestamp;
use crate::transcript::Transcript;
use std::collections::HashMap;

/// Turns transcripts and task parameters into provider-agnostic prompts.
#[derive(Debug, Clone)]
pub struct TaskPromptBuilder {
    prompts: Prompts,
    min_chapters: u32,
    max_chapters: u32,
    question_count: u32,
    question_context_chars: usize,
    quiz_context_chars: usize,
}

impl TaskPromptBuilder {
    pub fn new(prompts: Prompts, settings: &Settings) -> Self {
        Self {
            prompts,
            min_chapters: settings.chapters.min_chapters,
            max_chapters: settings.chapters.max_chapters,
            question_count: settings.quiz.question_count,
            question_context_chars: settings.transcript.question_context_chars,
            quiz_context_chars: settings.transcript.quiz_context_chars,
        }
    }

    /// Chapter segmentation over the timestamped transcript.
    pub fn chapters(&self, transcript: &Transcript) -> TaskPrompt {
        let duration = transcript.duration_seconds();

        let mut vars = HashMap::new();
        vars.insert(
            "duration_info".to_string(),
            format!(
                "Video Duration: {} (max {} seconds)",
                format_timestamp(duration),
                duration as u64
            ),
        );
        vars.insert("max_seconds".to_string(), (duration as u64).to_string());
        vars.insert("min_chapters".to_string(), self.min_chapters.to_string());
        vars.insert("max_chapters".to_string(), self.max_chapters.to_string());
        vars.insert("transcript".to_string(), transcript.format_with_timestamps());

        let text = self
            .prompts
            .render_with_custom(&self.prompts.chapters.template, &vars);
        TaskPrompt::new(
            TaskKind::Chapters {
                duration_seconds: duration,
            },
            text,
        )
    }

    /// Question answering over the (truncated) plain transcript.
    pub fn question(&self, transcript: &Transcript, title: &str, question: &str) -> TaskPrompt {
        let mut vars = HashMap::new();
        vars.insert("title".to_string(), title.to_string());
        vars.insert(
            "transcript".to_string(),
            transcript.plain_text_truncated(self.question_context_chars),
        );
        vars.insert("question".to_string(), question.to_string());

        let text = self
            .prompts
            .render_with_custom(&self.prompts.question.template, &vars);
        TaskPrompt::new(TaskKind::Question, text)
    }

    /// Multiple-choice quiz over the (truncated) plain transcript.
    pub fn quiz(&self, transcript: &Transcript, title: &str) -> TaskPrompt {
        let mut vars = HashMap::new();
        vars.insert("title".to_string(), title.to_string());
        vars.insert(
            "transcript".to_string(),
            transcript.plain_text_truncated(self.quiz_context_chars),
        );
        vars.insert("question_count".to_string(), self.question_count.to_string());

        let text = self.prompts.render_with_custom(&self.prompts.quiz.template, &vars);
        TaskPrompt::new(TaskKind::Quiz, text)
    }
}
