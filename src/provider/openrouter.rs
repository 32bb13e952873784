//! OpenRouter client (secondary provider), using the chat completions API.

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

const NAME: &str = "OpenRouter";

pub struct OpenRouterClient {
    http: reqwest::Client,
    api_key: Option<String>,
    api_key_env: String,
    model: String,
    base_url: String,
    referer: Option<String>,
}

impl OpenRouterClient {
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
            referer: settings.referer.clone(),
        })
    }

    fn request_body(&self, prompt: &TaskPrompt) -> Value {
        let mut body = json!({
            "model": prompt.model.as_deref().unwrap_or(&self.model),
            "messages": [{ "role": "user", "content": prompt.text }],
        });
        if prompt.structured {
            body["response_format"] = json!({ "type": "json_object" });
        }
        body
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

/// Classify an error object, which OpenRouter may send with any status.
///
/// `error.code` carries the upstream HTTP code as a number; 429 and 402
/// (credits exhausted) count as quota. Message text is the last resort.
fn classify_error(status: StatusCode, body: &str) -> ProviderFailure {
    let error = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").cloned());

    let code = error.as_ref().and_then(|e| e.get("code")).and_then(|c| {
        c.as_u64()
            .or_else(|| c.as_str().and_then(|s| s.parse().ok()))
    });
    let message = error
        .as_ref()
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| preview(body).to_string());

    let quota = status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::PAYMENT_REQUIRED
        || matches!(code, Some(429) | Some(402))
        || mentions_quota(&message);

    let kind = if quota {
        FailureKind::QuotaExceeded
    } else {
        FailureKind::UpstreamError
    };
    let shown = code
        .and_then(|c| u16::try_from(c).ok())
        .unwrap_or(status.as_u16());
    ProviderFailure::new(kind, format!("{} API error ({}): {}", NAME, shown, message))
}

fn response_text(status: StatusCode, body: &str) -> std::result::Result<String, ProviderFailure> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        ProviderFailure::new(
            FailureKind::MalformedResponse,
            format!("{} returned unreadable JSON: {}", NAME, e),
        )
    })?;

    if value.get("error").is_some() {
        return Err(classify_error(status, body));
    }

    let completion: ChatCompletion = serde_json::from_value(value).map_err(|e| {
        ProviderFailure::new(
            FailureKind::MalformedResponse,
            format!("{} returned an unexpected completion shape: {}", NAME, e),
        )
    })?;

    completion
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content.unwrap_or_default())
        .ok_or_else(|| {
            ProviderFailure::new(
                FailureKind::UpstreamError,
                format!("{} returned no choices", NAME),
            )
        })
}

#[async_trait]
impl ProviderClient for OpenRouterClient {
    fn id(&self) -> ProviderId {
        ProviderId::Secondary
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

        let body = self.request_body(prompt);
        debug!(model = %body["model"], "Calling OpenRouter");

        let mut request = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body);
        if let Some(referer) = &self.referer {
            request = request.header("HTTP-Referer", referer);
        }

        let response = request
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

        let text = response_text(status, &body)?;
        prompt.parse_response(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::test_server;
    use crate::task::{AiResult, TaskKind};

    fn settings(base_url: &str) -> ProviderSettings {
        ProviderSettings {
            base_url: base_url.to_string(),
            ..ProviderSettings::openrouter()
        }
    }

    fn completion(content: &str) -> Value {
        json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
    }

    #[test]
    fn test_classify_error_codes() {
        let failure = classify_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error": {"code": 429, "message": "Rate limit exceeded"}}"#,
        );
        assert_eq!(failure.kind, FailureKind::QuotaExceeded);

        let failure = classify_error(
            StatusCode::PAYMENT_REQUIRED,
            r#"{"error": {"code": 402, "message": "Insufficient credits"}}"#,
        );
        assert_eq!(failure.kind, FailureKind::QuotaExceeded);

        let failure = classify_error(
            StatusCode::UNAUTHORIZED,
            r#"{"error": {"code": 401, "message": "No auth credentials found"}}"#,
        );
        assert_eq!(failure.kind, FailureKind::UpstreamError);
        assert!(failure.message.contains("401"));
    }

    #[test]
    fn test_error_object_in_success_body() {
        let body = r#"{"error": {"code": "429", "message": "Provider returned error"}}"#;
        let failure = response_text(StatusCode::OK, body).unwrap_err();
        assert_eq!(failure.kind, FailureKind::QuotaExceeded);
    }

    #[test]
    fn test_response_text_no_choices() {
        let failure = response_text(StatusCode::OK, r#"{"choices": []}"#).unwrap_err();
        assert_eq!(failure.kind, FailureKind::UpstreamError);
    }

    #[test]
    fn test_model_override_and_json_mode() {
        let client = OpenRouterClient::with_api_key(&settings("http://x"), None).unwrap();

        let prompt = TaskPrompt::new(TaskKind::Quiz, "quiz me".into());
        let body = client.request_body(&prompt);
        assert_eq!(body["model"], "anthropic/claude-3-haiku");
        assert_eq!(body["response_format"]["type"], "json_object");

        let prompt = TaskPrompt::new(TaskKind::Question, "why?".into())
            .with_model(Some("openai/gpt-4o".into()));
        let body = client.request_body(&prompt);
        assert_eq!(body["model"], "openai/gpt-4o");
        assert!(body.get("response_format").is_none());
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_call() {
        let server = test_server::spawn(200, completion("hi")).await;
        let client = OpenRouterClient::with_api_key(&settings(&server.base_url), None).unwrap();

        let prompt = TaskPrompt::new(TaskKind::Question, "why?".into());
        let failure = client.generate(&prompt).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::MissingCredential);
        assert!(failure.message.contains("OPENROUTER_API_KEY"));
        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn test_generate_answer() {
        let server = test_server::spawn(200, completion("  Entropy measures disorder.  ")).await;
        let client =
            OpenRouterClient::with_api_key(&settings(&server.base_url), Some("sk-or".into()))
                .unwrap();

        let prompt = TaskPrompt::new(TaskKind::Question, "What is entropy?".into());
        let result = client.generate(&prompt).await.unwrap();
        let AiResult::Answer(answer) = result else {
            panic!("expected answer");
        };
        assert_eq!(answer.text, "Entropy measures disorder.");

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/chat/completions");
        assert_eq!(requests[0].headers["authorization"], "Bearer sk-or");
        assert_eq!(requests[0].headers["http-referer"], "http://localhost:8000");
        assert_eq!(requests[0].body["messages"][0]["content"], "What is entropy?");
    }

    #[tokio::test]
    async fn test_generate_quiz_from_wrapped_object() {
        let content = r#"{"quiz": [{"question": "Q?", "options": ["A) a", "B) b", "C) c", "D) d"], "correct": "C"}]}"#;
        let server = test_server::spawn(200, completion(content)).await;
        let client =
            OpenRouterClient::with_api_key(&settings(&server.base_url), Some("k".into())).unwrap();

        let result = client
            .generate(&TaskPrompt::new(TaskKind::Quiz, "quiz".into()))
            .await
            .unwrap();
        let AiResult::Quiz(quiz) = result else {
            panic!("expected quiz");
        };
        assert_eq!(quiz.items[0].correct_letter, 'C');
    }

    #[tokio::test]
    async fn test_server_error_is_upstream() {
        let server = test_server::spawn(500, json!({"error": {"code": 500, "message": "boom"}})).await;
        let client =
            OpenRouterClient::with_api_key(&settings(&server.base_url), Some("k".into())).unwrap();

        let failure = client
            .generate(&TaskPrompt::new(TaskKind::Question, "q".into()))
            .await
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::UpstreamError);
    }

    #[test]
    fn test_out_of_range_code_shows_http_status() {
        let failure = classify_error(
            StatusCode::BAD_GATEWAY,
            r#"{"error": {"code": 70000, "message": "provider hiccup"}}"#,
        );
        assert_eq!(failure.kind, FailureKind::UpstreamError);
        assert_eq!(
            failure.message,
            "OpenRouter API error (502): provider hiccup"
        );
    }

    #[tokio::test]
    async fn test_slow_reply_times_out_as_transport_error() {
        let server = test_server::spawn_delayed(
            200,
            completion("too late"),
            std::time::Duration::from_secs(3),
        )
        .await;
        let settings = ProviderSettings {
            timeout_seconds: 1,
            ..settings(&server.base_url)
        };
        let client = OpenRouterClient::with_api_key(&settings, Some("k".into())).unwrap();

        let failure = client
            .generate(&TaskPrompt::new(TaskKind::Question, "q".into()))
            .await
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::TransportError);
        assert!(failure.message.contains("timed out"), "{}", failure.message);
    }
}
