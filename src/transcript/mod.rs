//! Caption tracks, transcripts, and the sources they come from.

mod selector;
mod youtube;

pub use selector::{select_track, Selection, SelectionTier, TrackSelector};
pub use youtube::{extract_video_id, YoutubeCaptionSource};

use crate::error::Result;
use crate::timestamp::format_timestamp;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One selectable transcript source for a video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionTrack {
    /// Language code as reported by the source (e.g. "en", "pt-BR").
    pub language_code: String,
    /// Human-readable language name.
    pub language_name: String,
    /// Whether the track was produced by speech recognition.
    pub is_auto_generated: bool,
    /// Source-specific locator for the caption payload.
    #[serde(skip)]
    pub url: Option<String>,
}

impl CaptionTrack {
    pub fn new(language_code: &str, language_name: &str, is_auto_generated: bool) -> Self {
        Self {
            language_code: language_code.to_string(),
            language_name: language_name.to_string(),
            is_auto_generated,
            url: None,
        }
    }

    /// Attach the payload locator.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// A single caption line with timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    #[serde(rename = "start")]
    pub start_seconds: f64,
    #[serde(rename = "duration")]
    pub duration_seconds: f64,
}

impl TranscriptSegment {
    pub fn new(text: &str, start_seconds: f64, duration_seconds: f64) -> Self {
        Self {
            text: text.to_string(),
            start_seconds,
            duration_seconds,
        }
    }
}

/// A fetched transcript: the chosen track's segments in start order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub video_id: String,
    pub language_code: String,
    pub is_auto_generated: bool,
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    pub fn new(video_id: &str, track: &CaptionTrack, segments: Vec<TranscriptSegment>) -> Self {
        Self {
            video_id: video_id.to_string(),
            language_code: track.language_code.clone(),
            is_auto_generated: track.is_auto_generated,
            segments,
        }
    }

    /// Approximate video duration: the start of the last segment.
    pub fn duration_seconds(&self) -> f64 {
        self.segments.last().map(|s| s.start_seconds).unwrap_or(0.0)
    }

    /// One `[M:SS] text` line per segment.
    pub fn format_with_timestamps(&self) -> String {
        self.segments
            .iter()
            .map(|s| format!("[{}] {}", format_timestamp(s.start_seconds), s.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Segment texts joined by spaces.
    pub fn plain_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Plain text cut to at most `max_chars` characters, marked with `...` when cut.
    pub fn plain_text_truncated(&self, max_chars: usize) -> String {
        let text = self.plain_text();
        match text.char_indices().nth(max_chars) {
            Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
            None => text,
        }
    }
}

/// Where caption tracks come from.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// List every caption track the video offers.
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>>;

    /// Fetch the segments of one listed track.
    async fn fetch(&self, video_id: &str, track: &CaptionTrack) -> Result<Transcript>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transcript {
        Transcript::new(
            "abc",
            &CaptionTrack::new("en", "English", false),
            vec![
                TranscriptSegment::new("intro", 0.0, 5.0),
                TranscriptSegment::new("deep dive", 125.0, 40.0),
            ],
        )
    }

    #[test]
    fn test_duration_is_last_start() {
        assert_eq!(sample().duration_seconds(), 125.0);
        let empty = Transcript::new("x", &CaptionTrack::new("en", "English", true), vec![]);
        assert_eq!(empty.duration_seconds(), 0.0);
    }

    #[test]
    fn test_format_with_timestamps() {
        assert_eq!(sample().format_with_timestamps(), "[0:00] intro\n[2:05] deep dive");
    }

    #[test]
    fn test_plain_text_truncated() {
        let t = sample();
        assert_eq!(t.plain_text(), "intro deep dive");
        assert_eq!(t.plain_text_truncated(100), "intro deep dive");
        assert_eq!(t.plain_text_truncated(5), "intro...");
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let t = Transcript::new(
            "x",
            &CaptionTrack::new("hi", "Hindi", false),
            vec![TranscriptSegment::new("नमस्ते दुनिया", 0.0, 1.0)],
        );
        let cut = t.plain_text_truncated(3);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 6);
    }

    #[test]
    fn test_segment_serializes_with_short_names() {
        let json = serde_json::to_value(TranscriptSegment::new("hi", 1.5, 2.0)).unwrap();
        assert_eq!(json["start"], 1.5);
        assert_eq!(json["duration"], 2.0);
    }
}
