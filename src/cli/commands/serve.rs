//! HTTP API server.
//!
//! Exposes chapter generation, question answering and quiz generation for
//! browser and mobile clients.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::LecternError;
use crate::orchestrator::Orchestrator;
use crate::provider::ProviderId;
use crate::task::QuizItem;
use crate::timestamp::format_timestamp;
use crate::transcript::TranscriptSegment;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(settings)?;
    let app = router(orchestrator);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Lectern API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Chapters", "POST /analyze");
    Output::kv("Transcript", "GET  /transcript/{video_id}");
    Output::kv("Question", "POST /ai-question");
    Output::kv("Quiz", "POST /generate-quiz");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(orchestrator: Orchestrator) -> Router {
    let state = Arc::new(AppState { orchestrator });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .route("/transcript/{video_id}", get(transcript))
        .route("/ai-question", post(ai_question))
        .route("/generate-quiz", post(generate_quiz))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct AnalyzeRequest {
    video_url: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    languages: Option<Vec<String>>,
    /// "gemini" or "openrouter"; the configured default when absent
    #[serde(default)]
    api_provider: Option<String>,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    video_id: String,
    transcript: Vec<TranscriptSegment>,
    chapters: Vec<ChapterInfo>,
    summary: String,
    provider: ProviderId,
}

#[derive(Serialize)]
struct ChapterInfo {
    timestamp: String,
    timestamp_seconds: u64,
    title: String,
    summary: String,
}

#[derive(Serialize)]
struct TranscriptResponse {
    video_id: String,
    language_code: String,
    is_auto_generated: bool,
    transcript: Vec<TranscriptSegment>,
}

#[derive(Deserialize)]
struct QuestionRequest {
    video_url: String,
    #[serde(default)]
    video_title: String,
    question: String,
    #[serde(default)]
    api_provider: Option<String>,
}

#[derive(Serialize)]
struct QuestionResponse {
    answer: String,
    provider: ProviderId,
}

#[derive(Deserialize)]
struct QuizRequest {
    video_url: String,
    #[serde(default)]
    video_title: String,
    #[serde(default)]
    api_provider: Option<String>,
}

#[derive(Serialize)]
struct QuizResponse {
    quiz: Vec<QuizQuestion>,
    provider: ProviderId,
}

#[derive(Serialize)]
struct QuizQuestion {
    question: String,
    options: [String; 4],
    correct: String,
}

impl From<QuizItem> for QuizQuestion {
    fn from(item: QuizItem) -> Self {
        Self {
            question: item.question,
            options: item.options,
            correct: item.correct_letter.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

/// Maps a pipeline error onto its HTTP status.
struct ApiError(LecternError);

impl From<LecternError> for ApiError {
    fn from(err: LecternError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %self.0, "Request failed");
        }
        (
            status,
            Json(ErrorResponse {
                detail: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

fn parse_provider(raw: Option<&str>) -> Result<Option<ProviderId>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => Ok(Some(name.parse()?)),
        None => Ok(None),
    }
}

// === Handlers ===

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Lectern: chapters, answers and quizzes for YouTube lectures",
        "endpoints": {
            "POST /analyze": "Fetch a transcript and generate chapters",
            "GET /transcript/{video_id}": "Get the transcript only",
            "POST /ai-question": "Answer a question about a video",
            "POST /generate-quiz": "Generate a multiple-choice quiz",
        }
    }))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let provider = parse_provider(req.api_provider.as_deref())?;
    let languages = req.languages.unwrap_or_default();

    let report = state
        .orchestrator
        .chapters(&req.video_url, &languages, provider, req.model)
        .await?;

    Ok(Json(AnalyzeResponse {
        video_id: report.video_id,
        transcript: report.transcript.segments,
        chapters: report
            .chapters
            .chapters
            .into_iter()
            .map(|c| ChapterInfo {
                timestamp: format_timestamp(c.timestamp_seconds as f64),
                timestamp_seconds: c.timestamp_seconds,
                title: c.title,
                summary: c.summary,
            })
            .collect(),
        summary: report.chapters.overall_summary,
        provider: report.provider,
    }))
}

async fn transcript(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> Result<Json<TranscriptResponse>, ApiError> {
    let report = state.orchestrator.transcript(&video_id, &[]).await?;
    let transcript = report.transcript;

    Ok(Json(TranscriptResponse {
        video_id: transcript.video_id,
        language_code: transcript.language_code,
        is_auto_generated: transcript.is_auto_generated,
        transcript: transcript.segments,
    }))
}

async fn ai_question(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QuestionRequest>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let provider = parse_provider(req.api_provider.as_deref())?;

    let report = state
        .orchestrator
        .answer(&req.video_url, &req.video_title, &req.question, provider)
        .await?;

    Ok(Json(QuestionResponse {
        answer: report.answer.text,
        provider: report.provider,
    }))
}

async fn generate_quiz(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QuizRequest>,
) -> Result<Json<QuizResponse>, ApiError> {
    let provider = parse_provider(req.api_provider.as_deref())?;

    let report = state
        .orchestrator
        .quiz(&req.video_url, &req.video_title, provider)
        .await?;

    Ok(Json(QuizResponse {
        quiz: report.quiz.items.into_iter().map(QuizQuestion::from).collect(),
        provider: report.provider,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Prompts;
    use crate::fallback::mock::MockProvider;
    use crate::provider::{FailureKind, ProviderFailure};
    use crate::task::{AiResult, Answer, Chapter, ChapterSet};
    use crate::transcript::{CaptionTrack, Transcript, TranscriptSource};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct FixedSource {
        tracks: Vec<CaptionTrack>,
    }

    #[async_trait]
    impl TranscriptSource for FixedSource {
        async fn list_tracks(&self, _video_id: &str) -> crate::Result<Vec<CaptionTrack>> {
            Ok(self.tracks.clone())
        }

        async fn fetch(&self, video_id: &str, track: &CaptionTrack) -> crate::Result<Transcript> {
            Ok(Transcript::new(
                video_id,
                track,
                vec![
                    TranscriptSegment::new("intro", 0.0, 5.0),
                    TranscriptSegment::new("deep dive", 125.0, 40.0),
                ],
            ))
        }
    }

    async fn spawn(
        tracks: Vec<CaptionTrack>,
        primary: Arc<MockProvider>,
        secondary: Arc<MockProvider>,
    ) -> String {
        let orchestrator = Orchestrator::with_components(
            Settings::default(),
            Prompts::default(),
            Arc::new(FixedSource { tracks }),
            primary,
            secondary,
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(orchestrator)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn english() -> Vec<CaptionTrack> {
        vec![CaptionTrack::new("en", "English", false)]
    }

    #[tokio::test]
    async fn test_analyze_returns_formatted_chapters() {
        let chapters = AiResult::Chapters(ChapterSet {
            chapters: vec![Chapter {
                timestamp_seconds: 125,
                title: "Deep dive".into(),
                summary: "Details.".into(),
            }],
            overall_summary: "A lecture.".into(),
        });
        let primary = MockProvider::new(ProviderId::Primary, Ok(chapters));
        let secondary = MockProvider::new(ProviderId::Secondary, Ok(AiResult::Answer(Answer { text: String::new() })));
        let base = spawn(english(), primary, secondary).await;

        let response = reqwest::Client::new()
            .post(format!("{}/analyze", base))
            .json(&json!({"video_url": "https://www.youtube.com/watch?v=abc123def45"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["video_id"], "abc123def45");
        assert_eq!(body["chapters"][0]["timestamp"], "2:05");
        assert_eq!(body["summary"], "A lecture.");
        assert_eq!(body["provider"], "primary");
        assert_eq!(body["transcript"][1]["start"], 125.0);
    }

    #[tokio::test]
    async fn test_question_falls_back_and_reports_provider() {
        let primary = MockProvider::new(
            ProviderId::Primary,
            Err(ProviderFailure::new(FailureKind::QuotaExceeded, "429")),
        );
        let secondary = MockProvider::new(
            ProviderId::Secondary,
            Ok(AiResult::Answer(Answer { text: "Disorder.".into() })),
        );
        let base = spawn(english(), primary, secondary).await;

        let body: Value = reqwest::Client::new()
            .post(format!("{}/ai-question", base))
            .json(&json!({
                "video_url": "abc123def45",
                "video_title": "Thermo",
                "question": "What is entropy?"
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["answer"], "Disorder.");
        assert_eq!(body["provider"], "secondary");
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let primary = MockProvider::new(
            ProviderId::Primary,
            Err(ProviderFailure::new(FailureKind::QuotaExceeded, "429")),
        );
        let secondary = MockProvider::unconfigured(ProviderId::Secondary);
        let base = spawn(english(), primary, secondary).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/generate-quiz", base))
            .json(&json!({"video_url": "abc123def45", "video_title": "Optics"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 503);
        let body: Value = response.json().await.unwrap();
        assert!(body["detail"].as_str().unwrap().contains("quota"));

        let response = client
            .post(format!("{}/analyze", base))
            .json(&json!({"video_url": "not a url"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);

        let response = client
            .post(format!("{}/analyze", base))
            .json(&json!({"video_url": "abc123def45", "api_provider": "claude"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn test_transcript_not_found() {
        let primary = MockProvider::new(ProviderId::Primary, Ok(AiResult::Answer(Answer { text: String::new() })));
        let secondary = MockProvider::new(ProviderId::Secondary, Ok(AiResult::Answer(Answer { text: String::new() })));
        let base = spawn(vec![], primary, secondary).await;

        let response = reqwest::get(format!("{}/transcript/abc123def45", base)).await.unwrap();
        assert_eq!(response.status(), 404);

        let response = reqwest::get(format!("{}/health", base)).await.unwrap();
        assert_eq!(response.status(), 200);
    }
}
