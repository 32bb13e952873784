//! Quota-driven fallback between the primary and secondary providers.
//!
//! The orchestrator walks a three-state machine:
//!
//! ```text
//! TryPrimary --success / non-quota failure--> Done
//! TryPrimary --QuotaExceeded, secondary configured--> TrySecondary --> Done
//! TryPrimary --QuotaExceeded, no secondary--> Done (ServiceUnavailable)
//! ```
//!
//! An explicit `secondary` preference starts in `TrySecondary`. At most two
//! provider calls are made, strictly one after the other.

use crate::error::LecternError;
use crate::provider::{FailureKind, ProviderClient, ProviderFailure, ProviderId};
use crate::task::{AiResult, TaskPrompt};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Final failure of a fallback run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FallbackError {
    /// A provider failure reported as-is.
    #[error(transparent)]
    Provider(ProviderFailure),

    /// Quota exhausted and the fallback could not help.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<FallbackError> for LecternError {
    fn from(err: FallbackError) -> Self {
        match err {
            FallbackError::Provider(failure) => failure.into(),
            FallbackError::ServiceUnavailable(message) => LecternError::ServiceUnavailable(message),
        }
    }
}

/// The single outcome of [`FallbackOrchestrator::execute`].
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackDecision {
    /// The provider whose answer (or failure) is reported.
    pub provider_used: ProviderId,
    pub outcome: Result<AiResult, FallbackError>,
}

impl FallbackDecision {
    /// Failure kind for logging, if the decision is a failure.
    pub fn failure_label(&self) -> Option<String> {
        match &self.outcome {
            Ok(_) => None,
            Err(FallbackError::Provider(f)) => Some(f.kind.to_string()),
            Err(FallbackError::ServiceUnavailable(_)) => Some("service unavailable".to_string()),
        }
    }
}

enum State {
    TryPrimary,
    TrySecondary { after_quota: Option<ProviderFailure> },
    Done(FallbackDecision),
}

/// Runs a task against the preferred provider, falling back on quota exhaustion.
#[derive(Clone)]
pub struct FallbackOrchestrator {
    primary: Arc<dyn ProviderClient>,
    secondary: Arc<dyn ProviderClient>,
}

impl FallbackOrchestrator {
    pub fn new(primary: Arc<dyn ProviderClient>, secondary: Arc<dyn ProviderClient>) -> Self {
        Self { primary, secondary }
    }

    /// Run `prompt` and return exactly one decision.
    pub async fn execute(&self, prompt: &TaskPrompt, preference: ProviderId) -> FallbackDecision {
        let mut state = match preference {
            ProviderId::Primary => State::TryPrimary,
            ProviderId::Secondary => State::TrySecondary { after_quota: None },
        };

        loop {
            state = match state {
                State::TryPrimary => self.try_primary(prompt).await,
                State::TrySecondary { after_quota } => {
                    self.try_secondary(prompt, after_quota).await
                }
                State::Done(decision) => return decision,
            };
        }
    }

    async fn try_primary(&self, prompt: &TaskPrompt) -> State {
        match self.primary.generate(prompt).await {
            Err(failure) if failure.kind == FailureKind::QuotaExceeded => {
                if !self.secondary.is_configured() {
                    return State::Done(FallbackDecision {
                        provider_used: self.primary.id(),
                        outcome: Err(FallbackError::ServiceUnavailable(format!(
                            "{} quota exhausted and no {} fallback is configured ({})",
                            self.primary.name(),
                            self.secondary.name(),
                            failure.message
                        ))),
                    });
                }
                warn!(
                    from = %self.primary.name(),
                    to = %self.secondary.name(),
                    reason = %failure.message,
                    "Quota exhausted, falling back"
                );
                State::TrySecondary {
                    after_quota: Some(failure),
                }
            }
            outcome => State::Done(FallbackDecision {
                provider_used: self.primary.id(),
                outcome: outcome.map_err(FallbackError::Provider),
            }),
        }
    }

    async fn try_secondary(&self, prompt: &TaskPrompt, after_quota: Option<ProviderFailure>) -> State {
        let outcome = match &after_quota {
            // The override named a primary model; the fallback uses its own.
            Some(_) if prompt.model.is_some() => {
                let mut fallback_prompt = prompt.clone();
                fallback_prompt.model = None;
                self.secondary.generate(&fallback_prompt).await
            }
            _ => self.secondary.generate(prompt).await,
        };

        let outcome = match (outcome, after_quota) {
            (Ok(result), _) => Ok(result),
            (Err(failure), None) => Err(FallbackError::Provider(failure)),
            (Err(failure), Some(quota)) => Err(FallbackError::ServiceUnavailable(format!(
                "{} quota exhausted ({}); {} fallback failed: {}",
                self.primary.name(),
                quota.message,
                self.secondary.name(),
                failure
            ))),
        };

        State::Done(FallbackDecision {
            provider_used: self.secondary.id(),
            outcome,
        })
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use crate::provider::ProviderOutcome;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted provider that counts calls and records the prompts it saw.
    pub struct MockProvider {
        id: ProviderId,
        configured: bool,
        outcome: ProviderOutcome,
        calls: AtomicUsize,
        seen: Mutex<Vec<TaskPrompt>>,
    }

    impl MockProvider {
        pub fn new(id: ProviderId, outcome: ProviderOutcome) -> Arc<Self> {
            Arc::new(Self {
                id,
                configured: true,
                outcome,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }

        pub fn unconfigured(id: ProviderId) -> Arc<Self> {
            Arc::new(Self {
                id,
                configured: false,
                outcome: Err(ProviderFailure::new(FailureKind::MissingCredential, "no key")),
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn prompts(&self) -> Vec<TaskPrompt> {
            self.seen.lock().unwrap().clone()
        }

        pub fn models(&self) -> Vec<Option<String>> {
            self.prompts().into_iter().map(|p| p.model).collect()
        }
    }

    #[async_trait]
    impl ProviderClient for MockProvider {
        fn id(&self) -> ProviderId {
            self.id
        }

        fn name(&self) -> &str {
            match self.id {
                ProviderId::Primary => "MockPrimary",
                ProviderId::Secondary => "MockSecondary",
            }
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn generate(&self, prompt: &TaskPrompt) -> ProviderOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(prompt.clone());
            self.outcome.clone()
        }
    }
}
