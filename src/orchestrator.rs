//! Pipeline orchestrator for Lectern.
//!
//! Coordinates transcript lookup, prompt rendering and the provider fallback
//! for each of the three AI tasks.

use crate::config::{Prompts, Settings};
use crate::error::{LecternError, Result};
use crate::fallback::FallbackOrchestrator;
use crate::provider::{build_providers, ProviderClient, ProviderId};
use crate::task::{AiResult, Answer, ChapterSet, Quiz, TaskPrompt, TaskPromptBuilder};
use crate::transcript::{
    extract_video_id, SelectionTier, TrackSelector, Transcript, TranscriptSource,
    YoutubeCaptionSource,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument};

/// A fetched transcript and how its track was chosen.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptReport {
    pub transcript: Transcript,
    pub tier: SelectionTier,
}

/// Chapters for a video, with the transcript they were built from.
#[derive(Debug, Clone, Serialize)]
pub struct ChapterReport {
    pub video_id: String,
    pub transcript: Transcript,
    pub chapters: ChapterSet,
    pub provider: ProviderId,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerReport {
    pub video_id: String,
    pub answer: Answer,
    pub provider: ProviderId,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizReport {
    pub video_id: String,
    pub quiz: Quiz,
    pub provider: ProviderId,
}

/// The main orchestrator for the Lectern pipeline.
pub struct Orchestrator {
    settings: Settings,
    source: Arc<dyn TranscriptSource>,
    selector: TrackSelector,
    builder: TaskPromptBuilder,
    fallback: FallbackOrchestrator,
}

impl Orchestrator {
    /// Create an orchestrator backed by YouTube captions and both configured providers.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let source: Arc<dyn TranscriptSource> = Arc::new(YoutubeCaptionSource::new(
            &settings.transcript.ytdlp_path,
            Duration::from_secs(settings.transcript.fetch_timeout_seconds),
        )?);

        let (primary, secondary) = build_providers(&settings.providers)?;
        info!(
            primary_configured = primary.is_configured(),
            secondary_configured = secondary.is_configured(),
            "Providers ready"
        );

        Ok(Self::with_components(settings, prompts, source, primary, secondary))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        source: Arc<dyn TranscriptSource>,
        primary: Arc<dyn ProviderClient>,
        secondary: Arc<dyn ProviderClient>,
    ) -> Self {
        let selector = TrackSelector::new(settings.transcript.common_languages.clone());
        let builder = TaskPromptBuilder::new(prompts, &settings);
        Self {
            settings,
            source,
            selector,
            builder,
            fallback: FallbackOrchestrator::new(primary, secondary),
        }
    }

    /// Fetch the best transcript for a video URL or ID.
    #[instrument(skip(self, languages), fields(input = %input))]
    pub async fn transcript(&self, input: &str, languages: &[String]) -> Result<TranscriptReport> {
        let video_id = extract_video_id(input)?;

        let tracks = self.source.list_tracks(&video_id).await?;
        let selection = self.selector.select(&tracks, languages)?;
        let tier = selection.tier;
        let track = selection.track.clone();

        let transcript = self.source.fetch(&video_id, &track).await?;
        Ok(TranscriptReport { transcript, tier })
    }

    /// Generate chapters and an overall summary.
    #[instrument(skip(self, languages, model), fields(input = %input))]
    pub async fn chapters(
        &self,
        input: &str,
        languages: &[String],
        preference: Option<ProviderId>,
        model: Option<String>,
    ) -> Result<ChapterReport> {
        let TranscriptReport { transcript, .. } = self.transcript(input, languages).await?;

        let prompt = self.builder.chapters(&transcript).with_model(model);
        let (result, provider) = self.run(&prompt, preference).await?;
        let AiResult::Chapters(mut chapters) = result else {
            return Err(unexpected_shape("chapters"));
        };

        if self.settings.chapters.clamp_timestamps {
            chapters.clamp_to(transcript.duration_seconds());
        }

        Ok(ChapterReport {
            video_id: transcript.video_id.clone(),
            transcript,
            chapters,
            provider,
        })
    }

    /// Answer a question about a video.
    #[instrument(skip(self, question), fields(input = %input))]
    pub async fn answer(
        &self,
        input: &str,
        title: &str,
        question: &str,
        preference: Option<ProviderId>,
    ) -> Result<AnswerReport> {
        if question.trim().is_empty() {
            return Err(LecternError::InvalidInput("question must not be empty".to_string()));
        }
        let TranscriptReport { transcript, .. } = self.transcript(input, &[]).await?;

        let prompt = self.builder.question(&transcript, title, question);
        let (result, provider) = self.run(&prompt, preference).await?;
        let AiResult::Answer(answer) = result else {
            return Err(unexpected_shape("answer"));
        };

        Ok(AnswerReport {
            video_id: transcript.video_id,
            answer,
            provider,
        })
    }

    /// Generate a multiple-choice quiz for a video.
    #[instrument(skip(self), fields(input = %input))]
    pub async fn quiz(
        &self,
        input: &str,
        title: &str,
        preference: Option<ProviderId>,
    ) -> Result<QuizReport> {
        let TranscriptReport { transcript, .. } = self.transcript(input, &[]).await?;

        let prompt = self.builder.quiz(&transcript, title);
        let (result, provider) = self.run(&prompt, preference).await?;
        let AiResult::Quiz(quiz) = result else {
            return Err(unexpected_shape("quiz"));
        };

        Ok(QuizReport {
            video_id: transcript.video_id,
            quiz,
            provider,
        })
    }

    /// Run one prompt through the fallback and log the decision.
    async fn run(
        &self,
        prompt: &TaskPrompt,
        preference: Option<ProviderId>,
    ) -> Result<(AiResult, ProviderId)> {
        let preference = preference.unwrap_or(self.settings.providers.default);

        let started = Instant::now();
        let decision = self.fallback.execute(prompt, preference).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        let failure = decision.failure_label();
        info!(
            task = %prompt.kind,
            provider = %decision.provider_used,
            failure = failure.as_deref().unwrap_or("none"),
            latency_ms,
            "Provider decision"
        );

        let provider = decision.provider_used;
        decision
            .outcome
            .map(|result| (result, provider))
            .map_err(LecternError::from)
    }
}

fn unexpected_shape(expected: &str) -> LecternError {
    LecternError::MalformedResponse(format!("provider result was not {}", expected))
}
