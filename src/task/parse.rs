//! Normalization of raw provider replies into task results.

use super::{AiResult, Answer, Chapter, ChapterSet, Quiz, QuizItem, TaskKind};
use crate::provider::{FailureKind, ProviderFailure, ProviderOutcome};
use serde::Deserialize;
use serde_json::Value;

pub(super) fn parse_response(kind: TaskKind, raw: &str) -> ProviderOutcome {
    match kind {
        TaskKind::Question => Ok(AiResult::Answer(Answer {
            text: raw.trim().to_string(),
        })),
        TaskKind::Chapters { .. } => parse_chapters(raw).map(AiResult::Chapters),
        TaskKind::Quiz => parse_quiz(raw).map(AiResult::Quiz),
    }
}

fn malformed(message: String) -> ProviderFailure {
    ProviderFailure::new(FailureKind::MalformedResponse, message)
}

fn preview(raw: &str) -> &str {
    match raw.char_indices().nth(200) {
        Some((idx, _)) => &raw[..idx],
        None => raw,
    }
}

/// Pull a JSON value out of a reply that may wrap it in prose or code fences.
fn extract_json(raw: &str) -> Result<Value, ProviderFailure> {
    let trimmed = raw.trim();
    let first_error = match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    if let Some(start) = trimmed.find(|c: char| c == '{' || c == '[') {
        let closer = if trimmed[start..].starts_with('{') { '}' } else { ']' };
        if let Some(end) = trimmed.rfind(closer) {
            if end > start {
                if let Ok(value) = serde_json::from_str::<Value>(&trimmed[start..=end]) {
                    return Ok(value);
                }
            }
        }
    }

    Err(malformed(format!(
        "{}. Response was: {}",
        first_error,
        preview(trimmed)
    )))
}

#[derive(Debug, Deserialize)]
struct RawChapterSet {
    #[serde(default)]
    chapters: Vec<RawChapter>,
    #[serde(default, alias = "summary")]
    overall_summary: String,
}

#[derive(Debug, Deserialize)]
struct RawChapter {
    #[serde(default, alias = "timestamp", alias = "start_seconds")]
    timestamp_seconds: Value,
    title: String,
    #[serde(default)]
    summary: String,
}

fn parse_chapters(raw: &str) -> Result<ChapterSet, ProviderFailure> {
    let value = extract_json(raw)?;
    let parsed: RawChapterSet = serde_json::from_value(value)
        .map_err(|e| malformed(format!("unexpected chapter structure: {}", e)))?;

    let chapters = parsed
        .chapters
        .into_iter()
        .map(|c| {
            Ok(Chapter {
                timestamp_seconds: seconds_from_value(&c.timestamp_seconds).ok_or_else(|| {
                    malformed(format!("invalid timestamp_seconds: {}", c.timestamp_seconds))
                })?,
                title: c.title,
                summary: c.summary,
            })
        })
        .collect::<Result<Vec<_>, ProviderFailure>>()?;

    Ok(ChapterSet {
        chapters,
        overall_summary: parsed.overall_summary,
    })
}

/// Accept integer, float, or numeric-string seconds; negatives become zero.
fn seconds_from_value(value: &Value) -> Option<u64> {
    let seconds = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !seconds.is_finite() {
        return None;
    }
    Some(seconds.max(0.0).round() as u64)
}

#[derive(Debug, Deserialize)]
struct RawQuizItem {
    question: String,
    options: Vec<String>,
    #[serde(alias = "correct_answer", alias = "answer")]
    correct: String,
}

fn parse_quiz(raw: &str) -> Result<Quiz, ProviderFailure> {
    let value = extract_json(raw)?;

    // JSON-object response modes wrap the array in an object
    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) => ["quiz", "questions", "items"]
            .iter()
            .find_map(|key| map.get(*key).and_then(|v| v.as_array()).cloned())
            .or_else(|| map.values().find_map(|v| v.as_array()).cloned())
            .ok_or_else(|| malformed("quiz object contains no question array".to_string()))?,
        other => return Err(malformed(format!("unexpected quiz value: {}", other))),
    };

    let items = items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            let raw: RawQuizItem = serde_json::from_value(item)
                .map_err(|e| malformed(format!("quiz item {}: {}", idx + 1, e)))?;
            quiz_item(raw).map_err(|reason| malformed(format!("quiz item {}: {}", idx + 1, reason)))
        })
        .collect::<Result<Vec<_>, ProviderFailure>>()?;

    Ok(Quiz { items })
}

fn quiz_item(raw: RawQuizItem) -> Result<QuizItem, String> {
    let count = raw.options.len();
    let options: [String; 4] = raw
        .options
        .try_into()
        .map_err(|_| format!("expected 4 options, got {}", count))?;

    let correct_letter = raw
        .correct
        .trim()
        .chars()
        .next()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| ('A'..='D').contains(c))
        .ok_or_else(|| format!("correct answer '{}' is not one of A-D", raw.correct))?;

    Ok(QuizItem {
        question: raw.question,
        options,
        correct_letter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAPTERS: TaskKind = TaskKind::Chapters { duration_seconds: 300.0 };

    #[test]
    fn test_parse_chapters() {
        let raw = r#"{
            "chapters": [
                {"timestamp_seconds": 0, "title": "Intro", "summary": "Welcome."},
                {"timestamp_seconds": 125.4, "title": "Deep dive", "summary": "Details."},
                {"timestamp_seconds": "200", "title": "Wrap up"}
            ],
            "overall_summary": "A lecture."
        }"#;

        let AiResult::Chapters(set) = parse_response(CHAPTERS, raw).unwrap() else {
            panic!("expected chapters");
        };
        assert_eq!(set.chapters.len(), 3);
        assert_eq!(set.chapters[1].timestamp_seconds, 125);
        assert_eq!(set.chapters[2].timestamp_seconds, 200);
        assert_eq!(set.chapters[2].summary, "");
        assert_eq!(set.overall_summary, "A lecture.");
    }

    #[test]
    fn test_parse_chapters_in_code_fence() {
        let raw = "Sure! Here you go:\n```json\n{\"chapters\": [], \"overall_summary\": \"Nothing much.\"}\n```";
        let AiResult::Chapters(set) = parse_response(CHAPTERS, raw).unwrap() else {
            panic!("expected chapters");
        };
        assert!(set.chapters.is_empty());
        assert_eq!(set.overall_summary, "Nothing much.");
    }

    #[test]
    fn test_parse_chapters_negative_timestamp() {
        let raw = r#"{"chapters": [{"timestamp_seconds": -4, "title": "Cold open"}]}"#;
        let AiResult::Chapters(set) = parse_response(CHAPTERS, raw).unwrap() else {
            panic!("expected chapters");
        };
        assert_eq!(set.chapters[0].timestamp_seconds, 0);
    }

    #[test]
    fn test_parse_chapters_malformed() {
        let failure = parse_response(CHAPTERS, "I cannot help with that.").unwrap_err();
        assert_eq!(failure.kind, FailureKind::MalformedResponse);

        let failure =
            parse_response(CHAPTERS, r#"{"chapters": [{"timestamp_seconds": 5}]}"#).unwrap_err();
        assert_eq!(failure.kind, FailureKind::MalformedResponse);
    }

    #[test]
    fn test_parse_answer_is_free_text() {
        let result = parse_response(TaskKind::Question, "  ## Newton's laws\n- First law  ").unwrap();
        assert_eq!(
            result,
            AiResult::Answer(Answer {
                text: "## Newton's laws\n- First law".to_string()
            })
        );
    }

    #[test]
    fn test_parse_quiz_array() {
        let raw = r#"[
            {"question": "What is 2+2?", "options": ["A) 3", "B) 4", "C) 5", "D) 22"], "correct": "B"},
            {"question": "Unit of force?", "options": ["A) Newton", "B) Joule", "C) Watt", "D) Pascal"], "correct": "a) Newton"}
        ]"#;

        let AiResult::Quiz(quiz) = parse_response(TaskKind::Quiz, raw).unwrap() else {
            panic!("expected quiz");
        };
        assert_eq!(quiz.items.len(), 2);
        assert_eq!(quiz.items[0].correct_letter, 'B');
        assert_eq!(quiz.items[1].correct_letter, 'A');
        assert_eq!(quiz.items[1].options[3], "D) Pascal");
    }

    #[test]
    fn test_parse_quiz_wrapped_in_object() {
        let raw = r#"{"questions": [
            {"question": "Q?", "options": ["A) a", "B) b", "C) c", "D) d"], "correct_answer": "D"}
        ]}"#;
        let AiResult::Quiz(quiz) = parse_response(TaskKind::Quiz, raw).unwrap() else {
            panic!("expected quiz");
        };
        assert_eq!(quiz.items[0].correct_letter, 'D');
    }

    #[test]
    fn test_parse_quiz_rejects_bad_items() {
        let three_options =
            r#"[{"question": "Q?", "options": ["A) a", "B) b", "C) c"], "correct": "A"}]"#;
        let failure = parse_response(TaskKind::Quiz, three_options).unwrap_err();
        assert_eq!(failure.kind, FailureKind::MalformedResponse);
        assert!(failure.message.contains("expected 4 options"));

        let bad_letter =
            r#"[{"question": "Q?", "options": ["a", "b", "c", "d"], "correct": "E"}]"#;
        let failure = parse_response(TaskKind::Quiz, bad_letter).unwrap_err();
        assert!(failure.message.contains("A-D"));
    }

    #[test]
    fn test_empty_quiz_is_valid() {
        let AiResult::Quiz(quiz) = parse_response(TaskKind::Quiz, "[]").unwrap() else {
            panic!("expected quiz");
        };
        assert!(quiz.items.is_empty());
    }
}
