//! Google Gemini client (primary provider).

use super::{
    http_client, mentions_quota, missing_credential, preview, transport_failure, FailureKind,
    ProviderClient, ProviderFailure, ProviderId, ProviderOutcome,
};
use crate::config::ProviderSettings;
use crate::error::Result;
use crate::task::TaskPrompt;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument};

const NAME: &str = "Gemini";

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    api_key_env: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client, reading the API key from the configured variable.
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        Self::with_api_key(settings, settings.api_key())
    }

    pub fn with_api_key(settings: &ProviderSettings, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            http: http_client(Duration::from_secs(settings.timeout_seconds))?,
            api_key,
            api_key_env: settings.api_key_env.clone(),
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request_body(prompt: &TaskPrompt) -> Value {
        let mut body = json!({
            "contents": [{ "parts": [{ "text": prompt.text }] }]
        });
        if prompt.structured {
            body["generationConfig"] = json!({ "responseMimeType": "application/json" });
        }
        body
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default, rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(default, rename = "blockReason")]
    block_reason: Option<String>,
}

/// Classify a non-success reply.
///
/// Gemini reports quota exhaustion as HTTP 429 with `error.status` set to
/// `RESOURCE_EXHAUSTED`. The message text is only consulted when neither
/// signal is present.
fn classify_error(status: StatusCode, body: &str) -> ProviderFailure {
    let error = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").cloned());

    let code = error
        .as_ref()
        .and_then(|e| e.get("status"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let message = error
        .as_ref()
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| preview(body).to_string());

    let kind = if status == StatusCode::TOO_MANY_REQUESTS
        || code == "RESOURCE_EXHAUSTED"
        || mentions_quota(&message)
    {
        FailureKind::QuotaExceeded
    } else {
        FailureKind::UpstreamError
    };

    ProviderFailure::new(
        kind,
        format!("{} API error ({}): {}", NAME, status.as_u16(), message),
    )
}

fn response_text(body: &str) -> std::result::Result<String, ProviderFailure> {
    let parsed: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
        ProviderFailure::new(
            FailureKind::MalformedResponse,
            format!("{} returned unreadable JSON: {}", NAME, e),
        )
    })?;

    let Some(candidate) = parsed.candidates.into_iter().next() else {
        let reason = parsed
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(ProviderFailure::new(
            FailureKind::UpstreamError,
            format!("{} returned no content: {}", NAME, reason),
        ));
    };

    Ok(candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default())
}

#[async_trait]
impl ProviderClient for GeminiClient {
    fn id(&self) -> ProviderId {
        ProviderId::Primary
    }

    fn name(&self) -> &str {
        NAME
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    #[instrument(skip(self, prompt), fields(task = %prompt.kind))]
    async fn generate(&self, prompt: &TaskPrompt) -> ProviderOutcome {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(missing_credential(NAME, &self.api_key_env));
        };

        let model = prompt.model.as_deref().unwrap_or(&self.model);
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        debug!(model, "Calling Gemini");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&Self::request_body(prompt))
            .send()
            .await
            .map_err(|e| transport_failure(NAME, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_failure(NAME, &e))?;

        if !status.is_success() {
            return Err(classify_error(status, &body));
        }

        let text = response_text(&body)?;
        prompt.parse_response(&text)
    }
}
