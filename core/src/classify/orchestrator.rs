//! Public entry point: signals, prompt, model call, parse, and the
//! fallback that guarantees an answer on every path.

use super::fallback::{classify_fallback, FallbackMode};
use super::parse::{parse_response, ParseError};
use super::patterns::PatternRegistry;
use super::prompt::{build_prompt, PromptSpec};
use super::signals::{extract_signals, SignalSet};
use super::{Category, ClassificationResult, Priority, Source};
use crate::ai::{GeminiClient, ModelCallConfig, ModelClient, ModelError, NoModel};
use crate::config::Settings;
use log::{debug, error, warn};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Attached to every fallback result caused by something other than a
/// missing credential.
pub const DEGRADED_WARNING: &str = "LLM unavailable, used keyword analysis";

/// Why the model path did not produce the answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// No credential: heuristic-only is the expected steady state.
    ConfigMissing,
    Model(ModelError),
    Parse(ParseError),
    /// The classification task itself died (batch mode only).
    Aborted(String),
}

impl FallbackReason {
    pub fn warning(&self) -> Option<&'static str> {
        match self {
            Self::ConfigMissing | Self::Model(ModelError::ConfigMissing) => None,
            Self::Model(_) | Self::Parse(_) | Self::Aborted(_) => Some(DEGRADED_WARNING),
        }
    }
}

impl From<ModelError> for FallbackReason {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::ConfigMissing => Self::ConfigMissing,
            other => Self::Model(other),
        }
    }
}

impl From<ParseError> for FallbackReason {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success {
        result: ClassificationResult,
    },
    FallbackUsed {
        result: ClassificationResult,
        reason: FallbackReason,
    },
}

impl Outcome {
    pub fn result(&self) -> &ClassificationResult {
        match self {
            Self::Success { result } | Self::FallbackUsed { result, .. } => result,
        }
    }

    pub fn into_result(self) -> ClassificationResult {
        match self {
            Self::Success { result } | Self::FallbackUsed { result, .. } => result,
        }
    }

    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match self {
            Self::Success { .. } => None,
            Self::FallbackUsed { reason, .. } => Some(reason),
        }
    }
}

/// Ticket classifier. Stateless between calls; share it behind an `Arc`.
pub struct Classifier<M> {
    registry: &'static PatternRegistry,
    prompt_spec: &'static PromptSpec,
    client: M,
    fallback_mode: FallbackMode,
}

impl Classifier<GeminiClient> {
    pub fn from_settings(settings: &Settings) -> Self {
        Classifier::new(GeminiClient::from_settings(settings))
            .with_fallback_mode(settings.fallback_mode)
    }
}

impl Classifier<NoModel> {
    /// Heuristic-only classifier.
    pub fn offline() -> Self {
        Classifier::new(NoModel)
    }
}

impl<M: ModelClient> Classifier<M> {
    pub fn new(client: M) -> Self {
        Self {
            registry: PatternRegistry::global(),
            prompt_spec: PromptSpec::builtin(),
            client,
            fallback_mode: FallbackMode::default(),
        }
    }

    #[must_use]
    pub fn with_fallback_mode(mut self, mode: FallbackMode) -> Self {
        self.fallback_mode = mode;
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: &'static PatternRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn client(&self) -> &M {
        &self.client
    }

    pub fn signals(&self, description: &str) -> SignalSet {
        extract_signals(self.registry, description)
    }

    pub fn prompt(&self, description: &str) -> String {
        build_prompt(self.prompt_spec, &self.signals(description), description)
    }

    /// Classify one description. Never fails; the model path is bounded by
    /// [`ModelCallConfig::FIXED`]'s timeout and dropping the future cancels
    /// any in-flight request.
    pub async fn classify(&self, description: &str) -> Outcome {
        let signals = self.signals(description);

        if !self.client.is_configured() {
            warn!("[Classifier::classify] No model API key set, using keyword heuristic");
            return self.fallback(&signals, FallbackReason::ConfigMissing);
        }

        match self.classify_with_model(&signals, description).await {
            Ok((category, priority)) => Outcome::Success {
                result: ClassificationResult {
                    category,
                    priority,
                    source: Source::Model,
                    warning: None,
                },
            },
            Err(reason) => {
                error!("[Classifier::classify] Model classification failed: {reason:?}");
                self.fallback(&signals, reason)
            }
        }
    }

    async fn classify_with_model(
        &self,
        signals: &SignalSet,
        description: &str,
    ) -> Result<(Category, Priority), FallbackReason> {
        let config = ModelCallConfig::FIXED;
        let prompt = build_prompt(self.prompt_spec, signals, description);

        let raw = tokio::time::timeout(config.timeout, self.client.call(&prompt, &config))
            .await
            .map_err(|_| ModelError::Timeout)??;

        debug!(
            "[Classifier::classify_with_model] raw response: {}",
            raw.chars().take(200).collect::<String>()
        );

        parse_response(&raw).map_err(|e| {
            warn!("[Classifier::classify_with_model] {e}");
            FallbackReason::from(e)
        })
    }

    fn fallback(&self, signals: &SignalSet, reason: FallbackReason) -> Outcome {
        let (category, priority) = classify_fallback(self.registry, signals, self.fallback_mode);
        Outcome::FallbackUsed {
            result: ClassificationResult {
                category,
                priority,
                source: Source::Fallback,
                warning: reason.warning().map(str::to_owned),
            },
            reason,
        }
    }
}

impl<M: ModelClient + 'static> Classifier<M> {
    /// Classify independent descriptions concurrently, at most
    /// `max_concurrent` at a time. Results come back in input order.
    pub async fn classify_many(
        self: Arc<Self>,
        descriptions: Vec<String>,
        max_concurrent: usize,
    ) -> Vec<Outcome> {
        if descriptions.is_empty() {
            return Vec::new();
        }

        let permits = max_concurrent.clamp(1, Semaphore::MAX_PERMITS);
        let semaphore = Arc::new(Semaphore::new(permits));

        debug!(
            "[Classifier::classify_many] Processing {} descriptions (max_concurrent={})",
            descriptions.len(),
            permits
        );

        // Dropping the set aborts every task still waiting on the model.
        let mut tasks = JoinSet::new();
        for (index, description) in descriptions.iter().cloned().enumerate() {
            let sem = Arc::clone(&semaphore);
            let classifier = Arc::clone(&self);
            tasks.spawn(async move {
                let _permit = sem.acquire_owned().await;
                (index, classifier.classify(&description).await)
            });
        }

        let mut slots: Vec<Option<Outcome>> = descriptions.iter().map(|_| None).collect();
        let mut join_failure = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => {
                    error!("[Classifier::classify_many] Task join error: {e}");
                    join_failure = Some(e.to_string());
                }
            }
        }

        slots
            .into_iter()
            .zip(&descriptions)
            .map(|(slot, description)| {
                slot.unwrap_or_else(|| {
                    self.fallback(
                        &self.signals(description),
                        FallbackReason::Aborted(join_failure.clone().unwrap_or_default()),
                    )
                })
            })
            .collect()
    }
}
