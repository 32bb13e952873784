//! YouTube caption source.
//!
//! Track discovery goes through `yt-dlp --dump-json`; caption payloads are
//! downloaded in YouTube's `json3` format.

use super::{CaptionTrack, Transcript, TranscriptSegment, TranscriptSource};
use crate::error::{LecternError, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info, instrument};

static VIDEO_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        (?:
            (?:https?://)?
            (?:www\.|m\.)?
            (?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/)
            ([a-zA-Z0-9_-]{11})
        )
        |
        # Bare video ID (11 characters)
        ^([a-zA-Z0-9_-]{11})$
    ",
    )
    .expect("Invalid regex")
});

/// Extract the video ID from a YouTube URL or bare ID.
pub fn extract_video_id(input: &str) -> Result<String> {
    VIDEO_ID_REGEX
        .captures(input.trim())
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| LecternError::InvalidInput(format!("Invalid YouTube URL: {}", input)))
}

/// Caption source backed by yt-dlp and YouTube's timedtext endpoint.
pub struct YoutubeCaptionSource {
    ytdlp_path: String,
    http: reqwest::Client,
}

impl YoutubeCaptionSource {
    pub fn new(ytdlp_path: &str, fetch_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(fetch_timeout).build()?;
        Ok(Self {
            ytdlp_path: ytdlp_path.to_string(),
            http,
        })
    }

    /// Run yt-dlp and return its metadata JSON for the video.
    async fn dump_info(&self, video_id: &str) -> Result<serde_json::Value> {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);

        let output = tokio::process::Command::new(&self.ytdlp_path)
            .args(["--dump-json", "--skip-download", "--no-warnings", &url])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    LecternError::ToolNotFound(self.ytdlp_path.clone())
                } else {
                    LecternError::ToolFailed(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LecternError::VideoNotFound(format!(
                "Video {} not found or unavailable: {}",
                video_id,
                stderr.trim()
            )));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            LecternError::ToolFailed(format!("Failed to parse yt-dlp output: {}", e))
        })
    }
}

#[async_trait]
impl TranscriptSource for YoutubeCaptionSource {
    #[instrument(skip(self))]
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>> {
        let info = self.dump_info(video_id).await?;
        let tracks = tracks_from_info(&info);

        if tracks.is_empty() {
            return Err(LecternError::TranscriptsDisabled(video_id.to_string()));
        }

        debug!("Found {} caption tracks", tracks.len());
        Ok(tracks)
    }

    #[instrument(skip(self, track), fields(language = %track.language_code))]
    async fn fetch(&self, video_id: &str, track: &CaptionTrack) -> Result<Transcript> {
        let url = track.url.as_deref().ok_or_else(|| {
            LecternError::NoTranscriptAvailable(format!(
                "no downloadable '{}' captions for {}",
                track.language_code, video_id
            ))
        })?;

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if status.as_u16() == 403 || status.as_u16() == 404 || status.as_u16() == 410 {
            return Err(LecternError::NoTranscriptAvailable(format!(
                "caption download for {} returned {}",
                video_id, status
            )));
        }
        let body = response.error_for_status()?.text().await?;

        let segments = parse_json3(&body)?;
        if segments.is_empty() {
            return Err(LecternError::NoTranscriptAvailable(format!(
                "'{}' captions for {} are empty",
                track.language_code, video_id
            )));
        }

        info!("Fetched {} transcript segments", segments.len());
        Ok(Transcript::new(video_id, track, segments))
    }
}

#[derive(Debug, Deserialize)]
struct CaptionFormat {
    #[serde(default)]
    ext: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    name: Option<String>,
}

/// Build tracks from yt-dlp's `subtitles` (human) and `automatic_captions` maps.
///
/// Tracks keep yt-dlp's listing order within each map (`serde_json` is built
/// with `preserve_order`), human tracks first.
///
/// Machine translations of the recognized track carry a `tlang` parameter
/// and are skipped, as is the `-orig` suffix yt-dlp adds to the source track.
fn tracks_from_info(info: &serde_json::Value) -> Vec<CaptionTrack> {
    let mut tracks = Vec::new();

    for (field, auto) in [("subtitles", false), ("automatic_captions", true)] {
        let Some(map) = info.get(field).and_then(|v| v.as_object()) else {
            continue;
        };

        for (code, formats) in map {
            // yt-dlp lists the live chat replay as a subtitle track
            if code == "live_chat" {
                continue;
            }

            let formats: Vec<CaptionFormat> =
                serde_json::from_value(formats.clone()).unwrap_or_default();
            if formats.is_empty() || (auto && formats.iter().all(|f| f.url.contains("tlang="))) {
                continue;
            }

            let code = code.strip_suffix("-orig").unwrap_or(code);
            if tracks
                .iter()
                .any(|t: &CaptionTrack| t.is_auto_generated == auto && t.language_code == code)
            {
                continue;
            }

            let name = formats
                .iter()
                .find_map(|f| f.name.clone())
                .unwrap_or_else(|| code.to_string());
            let mut track = CaptionTrack::new(code, &name, auto);
            track.url = formats
                .iter()
                .find(|f| f.ext == "json3" && !f.url.contains("tlang="))
                .map(|f| f.url.clone());

            tracks.push(track);
        }
    }

    tracks
}

#[derive(Debug, Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: f64,
    #[serde(default)]
    d_duration_ms: f64,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Convert a json3 caption payload into segments sorted by start time.
fn parse_json3(body: &str) -> Result<Vec<TranscriptSegment>> {
    let parsed: Json3 = serde_json::from_str(body)?;

    let mut segments: Vec<TranscriptSegment> = parsed
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = text.replace('\n', " ");
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            Some(TranscriptSegment::new(
                text,
                event.t_start_ms / 1000.0,
                event.d_duration_ms / 1000.0,
            ))
        })
        .collect();

    segments.sort_by(|a, b| {
        a.start_seconds
            .partial_cmp(&b.start_seconds)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(segments)
}
