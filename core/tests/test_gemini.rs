//! Gemini client and classifier against a local mock of the
//! `generateContent` endpoint.

use std::time::Duration;

use serde_json::json;
use triage::ai::{GeminiClient, ModelCallConfig, ModelClient, ModelError};
use triage::classify::{FallbackReason, DEGRADED_WARNING};
use triage::{Category, Classifier, Priority, Source};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/gemini-1.5-flash:generateContent";

fn client_for(server: &MockServer) -> GeminiClient {
    GeminiClient::new(Some("test-key".to_owned())).with_base_url(&server.uri())
}

fn completion(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

async fn mount(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_call_returns_candidate_text() {
    let server = MockServer::start().await;
    mount(
        &server,
        ResponseTemplate::new(200).set_body_json(completion("hello from gemini")),
    )
    .await;

    let text = client_for(&server)
        .call("ping", &ModelCallConfig::FIXED)
        .await
        .unwrap();
    assert_eq!(text, "hello from gemini");
}

#[tokio::test]
async fn test_rate_limit_maps_to_rate_limited() {
    let server = MockServer::start().await;
    mount(&server, ResponseTemplate::new(429).set_body_string("slow down")).await;

    let err = client_for(&server)
        .call("ping", &ModelCallConfig::FIXED)
        .await
        .unwrap_err();
    assert_eq!(err, ModelError::RateLimited);
}

#[tokio::test]
async fn test_server_error_keeps_status_and_message() {
    let server = MockServer::start().await;
    mount(
        &server,
        ResponseTemplate::new(500).set_body_json(json!({
            "error": { "code": 500, "message": "backend exploded" }
        })),
    )
    .await;

    let err = client_for(&server)
        .call("ping", &ModelCallConfig::FIXED)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ModelError::Service {
            status: Some(500),
            message: "backend exploded".to_owned(),
        }
    );
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    mount(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(completion("too late"))
            .set_delay(Duration::from_secs(5)),
    )
    .await;

    let config = ModelCallConfig {
        timeout: Duration::from_millis(200),
        ..ModelCallConfig::FIXED
    };
    let err = client_for(&server).call("ping", &config).await.unwrap_err();
    assert_eq!(err, ModelError::Timeout);
}

/// Base URL of a local port with nothing listening on it.
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

#[tokio::test]
async fn test_connection_refused_maps_to_network() {
    let client = GeminiClient::new(Some("test-key".to_owned())).with_base_url(&closed_port_url());
    let err = client
        .call("ping", &ModelCallConfig::FIXED)
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn test_classifier_falls_back_when_unreachable() {
    let client = GeminiClient::new(Some("test-key".to_owned())).with_base_url(&closed_port_url());
    let outcome = Classifier::new(client)
        .classify("I was charged twice for my subscription")
        .await;
    assert!(matches!(
        outcome.fallback_reason(),
        Some(FallbackReason::Model(ModelError::Network(_)))
    ));
    let result = outcome.result();
    assert_eq!(result.source, Source::Fallback);
    assert_eq!(result.category, Category::Billing);
    assert_eq!(result.warning.as_deref(), Some(DEGRADED_WARNING));
}

#[tokio::test]
async fn test_missing_key_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let client = GeminiClient::new(Some("   ".to_owned())).with_base_url(&server.uri());
    assert!(!client.is_configured());
    let err = client
        .call("ping", &ModelCallConfig::FIXED)
        .await
        .unwrap_err();
    assert_eq!(err, ModelError::ConfigMissing);
}

#[tokio::test]
async fn test_classifier_uses_model_verdict() {
    let server = MockServer::start().await;
    let reply = "Analysis: the customer was charged twice.\n```json\n{\"suggested_category\": \"billing\", \"suggested_priority\": \"high\"}\n```";
    mount(
        &server,
        ResponseTemplate::new(200).set_body_json(completion(reply)),
    )
    .await;

    let outcome = Classifier::new(client_for(&server))
        .classify("I was charged twice for my subscription this month")
        .await;
    let result = outcome.result();
    assert_eq!(result.category, Category::Billing);
    assert_eq!(result.priority, Priority::High);
    assert_eq!(result.source, Source::Model);
    assert!(result.warning.is_none());
}

#[tokio::test]
async fn test_classifier_falls_back_on_server_error() {
    let server = MockServer::start().await;
    mount(&server, ResponseTemplate::new(500).set_body_string("oops")).await;

    let outcome = Classifier::new(client_for(&server))
        .classify("Production is down and customers cannot log in!")
        .await;
    assert!(matches!(
        outcome.fallback_reason(),
        Some(FallbackReason::Model(ModelError::Service {
            status: Some(500),
            ..
        }))
    ));
    let result = outcome.result();
    assert_eq!(result.source, Source::Fallback);
    assert_eq!(result.priority, Priority::Critical);
    assert_eq!(result.warning.as_deref(), Some(DEGRADED_WARNING));
}

#[tokio::test]
async fn test_classifier_falls_back_on_unparseable_reply() {
    let server = MockServer::start().await;
    mount(
        &server,
        ResponseTemplate::new(200).set_body_json(completion("I think this is about money.")),
    )
    .await;

    let outcome = Classifier::new(client_for(&server))
        .classify("Please refund my last invoice")
        .await;
    assert!(matches!(
        outcome.fallback_reason(),
        Some(FallbackReason::Parse(_))
    ));
    assert_eq!(outcome.result().category, Category::Billing);
    assert_eq!(outcome.result().source, Source::Fallback);
}
