//! AI provider clients.
//!
//! Each client performs one outbound call per `generate` and hands every
//! failure back as data. Choosing whether to try another provider is the
//! job of [`crate::fallback::FallbackOrchestrator`].

mod gemini;
mod openrouter;

pub use gemini::GeminiClient;
pub use openrouter::OpenRouterClient;

use crate::config::ProvidersSettings;
use crate::error::{LecternError, Result};
use crate::task::{AiResult, TaskPrompt};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Which of the two configured providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Google Gemini.
    #[default]
    Primary,
    /// OpenRouter.
    Secondary,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Primary => "primary",
            ProviderId::Secondary => "secondary",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = LecternError;

    /// Accepts role names as well as the backend names used by HTTP clients.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "primary" | "gemini" => Ok(ProviderId::Primary),
            "secondary" | "openrouter" => Ok(ProviderId::Secondary),
            other => Err(LecternError::InvalidInput(format!(
                "Unknown provider '{}' (expected gemini or openrouter)",
                other
            ))),
        }
    }
}

/// Classification of a failed provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    MissingCredential,
    QuotaExceeded,
    TransportError,
    MalformedResponse,
    UpstreamError,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureKind::MissingCredential => "missing credential",
            FailureKind::QuotaExceeded => "quota exceeded",
            FailureKind::TransportError => "transport error",
            FailureKind::MalformedResponse => "malformed response",
            FailureKind::UpstreamError => "upstream error",
        };
        f.write_str(name)
    }
}

/// A classified provider failure with a human-readable message.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}")]
pub struct ProviderFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ProviderFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<ProviderFailure> for LecternError {
    fn from(failure: ProviderFailure) -> Self {
        match failure.kind {
            FailureKind::MissingCredential => LecternError::MissingCredential(failure.message),
            FailureKind::QuotaExceeded => LecternError::QuotaExceeded(failure.message),
            FailureKind::TransportError => LecternError::Transport(failure.message),
            FailureKind::MalformedResponse => LecternError::MalformedResponse(failure.message),
            FailureKind::UpstreamError => LecternError::Upstream(failure.message),
        }
    }
}

/// Result of a single provider call.
pub type ProviderOutcome = std::result::Result<AiResult, ProviderFailure>;

/// A backend that can answer a [`TaskPrompt`].
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Role of this provider.
    fn id(&self) -> ProviderId;

    /// Display name used in messages and logs.
    fn name(&self) -> &str;

    /// Whether a credential is present.
    fn is_configured(&self) -> bool;

    /// Make exactly one call to the backend and classify the result.
    async fn generate(&self, prompt: &TaskPrompt) -> ProviderOutcome;
}

/// Build both provider clients, reading credentials once.
pub fn build_providers(
    settings: &ProvidersSettings,
) -> Result<(Arc<dyn ProviderClient>, Arc<dyn ProviderClient>)> {
    let primary: Arc<dyn ProviderClient> = Arc::new(GeminiClient::new(&settings.primary)?);
    let secondary: Arc<dyn ProviderClient> =
        Arc::new(OpenRouterClient::new(&settings.secondary)?);
    Ok((primary, secondary))
}

/// HTTP client with a per-provider request timeout.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LecternError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Best-effort textual quota detection for error payloads without a usable code.
pub(crate) fn mentions_quota(text: &str) -> bool {
    let normalized = text.to_lowercase().replace(['_', '-'], " ");
    ["quota", "resource exhausted", "rate limit"]
        .iter()
        .any(|needle| normalized.contains(needle))
}

pub(crate) fn missing_credential(name: &str, env_var: &str) -> ProviderFailure {
    ProviderFailure::new(
        FailureKind::MissingCredential,
        format!("{} API key not configured (set {})", name, env_var),
    )
}

/// Connection errors and timeouts.
pub(crate) fn transport_failure(name: &str, error: &reqwest::Error) -> ProviderFailure {
    let reason = if error.is_timeout() {
        "request timed out".to_string()
    } else {
        error.to_string()
    };
    ProviderFailure::new(
        FailureKind::TransportError,
        format!("{} request failed: {}", name, reason),
    )
}

pub(crate) fn preview(text: &str) -> &str {
    match text.char_indices().nth(300) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    //! A throwaway HTTP server that answers every request with a fixed reply.

    use axum::http::{HeaderMap, StatusCode, Uri};
    use axum::{Json, Router};
    use serde_json::Value;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Debug, Clone)]
    pub struct Recorded {
        pub path: String,
        pub headers: HeaderMap,
        pub body: Value,
    }

    pub struct TestServer {
        pub base_url: String,
        requests: Arc<Mutex<Vec<Recorded>>>,
    }

    impl TestServer {
        pub fn requests(&self) -> Vec<Recorded> {
            self.requests.lock().unwrap().clone()
        }
    }

    pub async fn spawn(status: u16, reply: Value) -> TestServer {
        spawn_delayed(status, reply, Duration::ZERO).await
    }

    /// Like [`spawn`], but holds every reply back for `delay`.
    pub async fn spawn_delayed(status: u16, reply: Value, delay: Duration) -> TestServer {
        let status = StatusCode::from_u16(status).unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = requests.clone();

        let app = Router::new().fallback(
            move |uri: Uri, headers: HeaderMap, Json(body): Json<Value>| {
                let reply = reply.clone();
                let log = log.clone();
                async move {
                    log.lock().unwrap().push(Recorded {
                        path: uri.path().to_string(),
                        headers,
                        body,
                    });
                    tokio::time::sleep(delay).await;
                    (status, Json(reply))
                }
            },
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestServer {
            base_url: format!("http://{}", addr),
            requests,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_provider_id_parsing() {
        assert_eq!(assert_ok!("gemini".parse::<ProviderId>()), ProviderId::Primary);
        assert_eq!(assert_ok!("OpenRouter".parse::<ProviderId>()), ProviderId::Secondary);
        assert_eq!(assert_ok!(" secondary ".parse::<ProviderId>()), ProviderId::Secondary);
        let err = assert_err!("claude".parse::<ProviderId>());
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_mentions_quota() {
        assert!(mentions_quota("You exceeded your current QUOTA"));
        assert!(mentions_quota("RESOURCE_EXHAUSTED"));
        assert!(mentions_quota("Rate-limit reached for model"));
        assert!(!mentions_quota("Invalid API key"));
        assert!(!mentions_quota(""));
    }

    #[test]
    fn test_failure_maps_to_error() {
        let err: LecternError =
            ProviderFailure::new(FailureKind::QuotaExceeded, "Gemini quota").into();
        assert!(matches!(err, LecternError::QuotaExceeded(ref m) if m == "Gemini quota"));

        let err: LecternError =
            ProviderFailure::new(FailureKind::MissingCredential, "no key").into();
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_failure_display() {
        let failure = ProviderFailure::new(FailureKind::TransportError, "timed out");
        assert_eq!(failure.to_string(), "transport error: timed out");
    }
}
