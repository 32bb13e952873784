//! Prompt templates for Lectern.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.
//! Templates use `{{name}}` placeholders.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub chapters: ChapterPrompts,
    pub question: QuestionPrompts,
    pub quiz: QuizPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompt for chapter segmentation.
///
/// Placeholders: `duration_info`, `max_seconds`, `min_chapters`,
/// `max_chapters`, `transcript`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChapterPrompts {
    pub template: String,
}

impl Default for ChapterPrompts {
    fn default() -> Self {
        Self {
            template: r#"You are a helpful assistant that analyzes YouTube video transcripts and creates structured chapters with summaries.
{{duration_info}}

Given the following video transcript with timestamps in [M:SS] or [H:MM:SS] format, please:
1. Identify major topic changes and create {{min_chapters}}-{{max_chapters}} chapters
2. For each chapter, YOU MUST extract the EXACT timestamp_seconds from the [H:MM:SS] or [M:SS] markers in the transcript
3. Parse the timestamps like this: [0:45] = 45 seconds, [2:30] = 150 seconds, [1:15:20] = 4520 seconds
4. CRITICAL: All timestamp_seconds MUST be between 0 and {{max_seconds}} (the video duration)
5. Use timestamps that actually appear in the transcript - do NOT make up timestamps
6. Provide a descriptive title and brief summary (2-3 sentences) for each chapter
7. Create an overall video summary (3-4 sentences)

Transcript:
{{transcript}}

Please respond in the following JSON format:
{
    "chapters": [
        {
            "timestamp_seconds": 0,
            "title": "Chapter Title",
            "summary": "Brief summary of this chapter"
        }
    ],
    "overall_summary": "Overall video summary"
}"#
            .to_string(),
        }
    }
}

/// Prompt for answering a student question.
///
/// Placeholders: `title`, `transcript`, `question`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionPrompts {
    pub template: String,
}

impl Default for QuestionPrompts {
    fn default() -> Self {
        Self {
            template: r#"You are an educational assistant helping students understand video content.

Video Title: {{title}}

Video Transcript:
{{transcript}}

Student Question: {{question}}

Based on the video transcript above, provide a detailed answer to the student's question. Include:
- Direct references to what was said in the video
- Relevant concepts and definitions from the transcript
- Formulas or steps mentioned (if applicable)
- Examples from the video content
- Clear explanations with headings and bullet points

If the question cannot be answered from the transcript, politely explain that the information is not covered in this video."#
                .to_string(),
        }
    }
}

/// Prompt for multiple-choice quiz generation.
///
/// Placeholders: `title`, `transcript`, `question_count`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizPrompts {
    pub template: String,
}

impl Default for QuizPrompts {
    fn default() -> Self {
        Self {
            template: r#"Based on the following video transcript, generate a quiz with {{question_count}} multiple-choice questions.

Video Title: {{title}}

Video Transcript:
{{transcript}}

Create questions that:
- Test understanding of KEY CONCEPTS actually discussed in the video
- Cover different parts of the video content
- Have 4 options (A, B, C, D) where only one is correct
- Include the correct answer

Return ONLY a JSON array with this exact structure (no additional text):
[
  {
    "question": "What is...",
    "options": ["A) First option", "B) Second option", "C) Third option", "D) Fourth option"],
    "correct": "A"
  }
]"#
            .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let chapters_path = custom_path.join("chapters.toml");
            if chapters_path.exists() {
                let content = std::fs::read_to_string(&chapters_path)?;
                prompts.chapters = toml::from_str(&content)?;
            }

            let question_path = custom_path.join("question.toml");
            if question_path.exists() {
                let content = std::fs::read_to_string(&question_path)?;
                prompts.question = toml::from_str(&content)?;
            }

            let quiz_path = custom_path.join("quiz.toml");
            if quiz_path.exists() {
                let content = std::fs::read_to_string(&quiz_path)?;
                prompts.quiz = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is single-pass, so placeholder-like text inside a value
    /// (a transcript quoting `{{title}}`, say) is left alone.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let key = &after[..end];
                    match vars.get(key) {
                        Some(value) => result.push_str(value),
                        None => {
                            result.push_str("{{");
                            result.push_str(key);
                            result.push_str("}}");
                        }
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    result.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.chapters.template.contains("{{transcript}}"));
        assert!(prompts.question.template.contains("{{question}}"));
        assert!(prompts.quiz.template.contains("{{question_count}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_render_leaves_unknown_and_literal_braces() {
        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), "he said {{title}}".to_string());
        vars.insert("title".to_string(), "Calculus".to_string());

        let result = Prompts::render("{ \"a\": 1 } {{transcript}} {{missing}}", &vars);
        assert_eq!(result, "{ \"a\": 1 } he said {{title}} {{missing}}");
    }

    #[test]
    fn test_custom_variables_are_overridden_by_call_vars() {
        let mut custom = HashMap::new();
        custom.insert("audience".to_string(), "students".to_string());
        custom.insert("title".to_string(), "ignored".to_string());
        let prompts = Prompts::load(None, Some(&custom)).unwrap();

        let mut vars = HashMap::new();
        vars.insert("title".to_string(), "Optics".to_string());
        let out = prompts.render_with_custom("{{title}} for {{audience}}", &vars);
        assert_eq!(out, "Optics for students");
    }

    #[test]
    fn test_load_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("quiz.toml"),
            "template = \"Make {{question_count}} questions\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.quiz.template, "Make {{question_count}} questions");
        assert_eq!(prompts.chapters.template, ChapterPrompts::default().template);
    }
}
