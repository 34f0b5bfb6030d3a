//! Google Gemini `generateContent` client.
//!
//! One non-streaming POST per call, bounded by the call's timeout. The API
//! key is checked before any request is built.

use super::{ModelCallConfig, ModelClient, ModelError};
use crate::config::Settings;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Deserialize)]
struct GoogleError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_key)
    }

    /// Use a caller-supplied HTTP client (connection pooling, proxies, tests).
    pub fn with_client(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: DEFAULT_MODEL.to_owned(),
            base_url: GEMINI_API_BASE.to_owned(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.api_key.clone())
            .with_model(&settings.model)
            .with_base_url(&settings.base_url)
    }

    #[must_use]
    pub fn with_model(mut self, model: &str) -> Self {
        model.clone_into(&mut self.model);
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model)
    }

    fn build_request_body(prompt: &str, config: &ModelCallConfig) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "temperature": config.temperature,
                "topP": config.top_p,
                "maxOutputTokens": config.max_output_tokens
            }
        })
    }
}

fn map_transport_error(err: &reqwest::Error) -> ModelError {
    if err.is_timeout() {
        ModelError::Timeout
    } else if err.is_connect() || err.is_request() {
        ModelError::Network(err.to_string())
    } else {
        ModelError::service(err.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &str) -> ModelError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return ModelError::RateLimited;
    }
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());
    ModelError::Service {
        status: Some(status.as_u16()),
        message,
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(response: GenerateResponse) -> Result<String, ModelError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ModelError::service(format!("Prompt blocked: {reason}")));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ModelError::service("Response had no candidates"))?;

    if candidate.finish_reason.as_deref() == Some("SAFETY") {
        return Err(ModelError::service("Response blocked due to safety filters"));
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ModelError::service("Empty response from model"));
    }
    Ok(text)
}

impl ModelClient for GeminiClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn call(&self, prompt: &str, config: &ModelCallConfig) -> Result<String, ModelError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ModelError::ConfigMissing);
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            API_KEY_HEADER,
            HeaderValue::from_str(api_key)
                .map_err(|_| ModelError::service("API key is not a valid header value"))?,
        );

        debug!(
            "[GeminiClient::call] model={} prompt_chars={}",
            self.model,
            prompt.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .headers(headers)
            .timeout(config.timeout)
            .json(&Self::build_request_body(prompt, config))
            .send()
            .await
            .map_err(|e| map_transport_error(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| map_transport_error(&e))?;

        if !status.is_success() {
            return Err(map_status_error(status, &body));
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| ModelError::service(format!("Unexpected response body: {e}")))?;
        extract_text(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_carries_sampling_config() {
        let body = GeminiClient::build_request_body("hello", &ModelCallConfig::FIXED);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 200);
        assert!(body["generationConfig"]["temperature"].as_f64().unwrap() < 0.1);
        assert!(body["generationConfig"]["topP"].as_f64().unwrap() > 0.8);
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        assert!(!GeminiClient::new(Some("  ".to_owned())).is_configured());
        assert!(!GeminiClient::new(None).is_configured());
        assert!(GeminiClient::new(Some("k".to_owned())).is_configured());
    }

    #[test]
    fn test_endpoint_uses_model_and_base() {
        let client = GeminiClient::new(None)
            .with_base_url("http://localhost:9/v1beta/models/")
            .with_model("gemini-test");
        assert_eq!(
            client.endpoint(),
            "http://localhost:9/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            map_status_error(StatusCode::TOO_MANY_REQUESTS, ""),
            ModelError::RateLimited
        );
        assert_eq!(
            map_status_error(
                StatusCode::BAD_REQUEST,
                r#"{"error": {"code": 400, "message": "API key not valid"}}"#
            ),
            ModelError::Service {
                status: Some(400),
                message: "API key not valid".to_owned()
            }
        );
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "Analysis: ok.\n"}, {"text": "{}"}]}, "finishReason": "STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "Analysis: ok.\n{}");
    }

    #[test]
    fn test_extract_text_rejects_empty_and_blocked() {
        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(extract_text(empty).is_err());

        let blocked: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap();
        assert!(matches!(
            extract_text(blocked),
            Err(ModelError::Service { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_key_short_circuits() {
        let client = GeminiClient::new(None).with_base_url("http://127.0.0.1:1");
        assert_eq!(
            client.call("prompt", &ModelCallConfig::FIXED).await,
            Err(ModelError::ConfigMissing)
        );
    }
}
