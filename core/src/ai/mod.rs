pub mod gemini;

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

pub use gemini::GeminiClient;

/// Sampling and time budget for one model call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelCallConfig {
    pub timeout: Duration,
    pub temperature: f32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl ModelCallConfig {
    /// The only configuration the classifier uses: low temperature and a
    /// small output budget (room for one sentence of analysis plus JSON).
    pub const FIXED: Self = Self {
        timeout: Duration::from_secs(10),
        temperature: 0.05,
        top_p: 0.9,
        max_output_tokens: 200,
    };
}

impl Default for ModelCallConfig {
    fn default() -> Self {
        Self::FIXED
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("No model API key configured")]
    ConfigMissing,
    #[error("Model call timed out")]
    Timeout,
    #[error("Model service rate limited the request")]
    RateLimited,
    #[error("Network error: {0}")]
    Network(String),
    #[error("Model service error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Service { status: Option<u16>, message: String },
}

impl ModelError {
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            status: None,
            message: message.into(),
        }
    }
}

/// A single-shot text completion backend.
///
/// Implementations make at most one attempt per `call` and must return
/// [`ModelError::ConfigMissing`] without any I/O when no credential is set.
pub trait ModelClient: Send + Sync {
    /// Whether a credential is available.
    fn is_configured(&self) -> bool;

    fn call(
        &self,
        prompt: &str,
        config: &ModelCallConfig,
    ) -> impl Future<Output = Result<String, ModelError>> + Send;
}

/// Placeholder client for hosts running without any model backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoModel;

impl ModelClient for NoModel {
    fn is_configured(&self) -> bool {
        false
    }

    async fn call(&self, _prompt: &str, _config: &ModelCallConfig) -> Result<String, ModelError> {
        Err(ModelError::ConfigMissing)
    }
}
