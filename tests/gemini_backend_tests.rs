//! End-to-end tests of `Client` against a mocked Gemini endpoint.

mod common;

use common::valid_invention;
use contraption_rs::{BackendError, Client, ForgeError, HazardLevel, RetryPolicy};
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-api-key";
const GENERATE_PATH: &str = "/v1beta/models/gemini-3-flash-preview:generateContent";

/// Retry quickly so tests against a real socket stay fast.
fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::default()
        .with_max_attempts(max_attempts)
        .with_base_delay(Duration::from_millis(1))
        .with_max_jitter(Duration::ZERO)
}

fn client_for(server: &MockServer, max_attempts: u32) -> Client {
    Client::builder(API_KEY.to_string())
        .base_url(server.uri())
        .retry_policy(fast_policy(max_attempts))
        .build()
        .expect("client should build")
}

fn envelope_with_text(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"parts": [{"text": text}], "role": "model"},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 80, "totalTokenCount": 200}
    })
}

fn quota_error() -> ResponseTemplate {
    ResponseTemplate::new(429).set_body_json(json!({
        "error": {
            "code": 429,
            "message": "Resource has been exhausted (e.g. check quota).",
            "status": "RESOURCE_EXHAUSTED"
        }
    }))
}

#[tokio::test]
async fn test_generate_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("X-Goog-Api-Key", API_KEY))
        .and(body_partial_json(json!({
            "generationConfig": {"responseMimeType": "application/json"}
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope_with_text(&valid_invention().to_string())),
        )
        .expect(1)
        .mount(&server)
        .await;

    let invention = client_for(&server, 5)
        .generate(Some("bakery"), false)
        .await
        .expect("generation should succeed");

    assert_eq!(invention.name(), "The Hog-Powered Toaster Cannon");
    assert_eq!(invention.hazard_level(), HazardLevel::Extreme);
}

#[tokio::test]
async fn test_request_wire_format() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope_with_text(&valid_invention().to_string())),
        )
        .mount(&server)
        .await;

    client_for(&server, 1)
        .generate(Some("submarine"), true)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(
        !requests[0].url.as_str().contains("key="),
        "API key must travel in a header"
    );

    let sent: Value = requests[0].body_json().unwrap();
    let prompt = sent["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("Specific Theme: submarine"));
    assert!(prompt.contains("gold plating"));

    let schema = &sent["generationConfig"]["responseSchema"];
    assert_eq!(schema["type"], "OBJECT");
    assert_eq!(schema["properties"]["rarity"]["enum"], json!(["Royal Gold", "Legendary"]));
    assert_eq!(
        schema["required"],
        json!(["name", "description", "components", "hazardLevel", "blueprintCode"])
    );
}

#[tokio::test]
async fn test_rate_limit_then_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(quota_error())
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope_with_text(&valid_invention().to_string())),
        )
        .mount(&server)
        .await;

    let invention = client_for(&server, 5).generate(None, false).await.unwrap();

    assert_eq!(invention.code(), "OINK-42-B");
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_embedded_quota_code_is_retried() {
    let server = MockServer::start().await;

    // Gateway answers 503 but forwards Google's envelope with code 429
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": {"code": 429, "message": "Quota exceeded for model"}
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope_with_text(&valid_invention().to_string())),
        )
        .mount(&server)
        .await;

    let invention = client_for(&server, 5).generate(None, false).await.unwrap();

    assert_eq!(invention.code(), "OINK-42-B");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_embedded_quota_code_exhausted() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": {"code": 429, "message": "Quota exceeded for model"}
        })))
        .expect(2)
        .mount(&server)
        .await;

    let err = client_for(&server, 2)
        .generate(None, false)
        .await
        .unwrap_err();

    match err {
        ForgeError::TransientBackendFailure {
            attempts,
            source: BackendError::Api {
                status_code, code, ..
            },
        } => {
            assert_eq!(attempts, 2);
            assert_eq!(status_code, 503);
            assert_eq!(code, Some(429));
        }
        other => panic!("Expected TransientBackendFailure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limit_exhausted() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(quota_error())
        .expect(3)
        .mount(&server)
        .await;

    let err = client_for(&server, 3)
        .generate(None, false)
        .await
        .unwrap_err();

    match err {
        ForgeError::TransientBackendFailure { attempts, source } => {
            assert_eq!(attempts, 3);
            match source {
                BackendError::Api {
                    status_code,
                    status,
                    message,
                    ..
                } => {
                    assert_eq!(status_code, 429);
                    assert_eq!(status.as_deref(), Some("RESOURCE_EXHAUSTED"));
                    assert!(message.contains("exhausted"));
                }
                other => panic!("Expected Api error, got {other:?}"),
            }
        }
        other => panic!("Expected TransientBackendFailure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_permission_denied_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-goog-request-id", "req-abc-123")
                .set_body_json(json!({
                    "error": {
                        "code": 403,
                        "message": "API key not valid. Please pass a valid API key.",
                        "status": "PERMISSION_DENIED"
                    }
                })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server, 5)
        .generate(None, false)
        .await
        .unwrap_err();

    assert!(!err.is_user_retryable());
    match err {
        ForgeError::FatalBackendFailure(BackendError::Api {
            status_code,
            status,
            request_id,
            ..
        }) => {
            assert_eq!(status_code, 403);
            assert_eq!(status.as_deref(), Some("PERMISSION_DENIED"));
            assert_eq!(request_id.as_deref(), Some("req-abc-123"));
        }
        other => panic!("Expected FatalBackendFailure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_no_candidates_is_empty_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server, 5)
        .generate(None, false)
        .await
        .unwrap_err();

    assert!(matches!(err, ForgeError::EmptyResponse));
}

#[tokio::test]
async fn test_invalid_invention_is_schema_violation() {
    let server = MockServer::start().await;
    let mut invention = valid_invention();
    invention["hazardLevel"] = json!("Mild");

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope_with_text(&invention.to_string())),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server, 5)
        .generate(None, false)
        .await
        .unwrap_err();

    assert!(matches!(err, ForgeError::SchemaViolation(_)));
}

#[tokio::test]
async fn test_garbled_envelope_is_fatal_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server, 5)
        .generate(None, false)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ForgeError::FatalBackendFailure(BackendError::Decode(_))
    ));
}

#[tokio::test]
async fn test_timeout_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(2))
                .set_body_json(envelope_with_text(&valid_invention().to_string())),
        )
        .mount(&server)
        .await;

    let client = Client::builder(API_KEY.to_string())
        .base_url(server.uri())
        .timeout(Duration::from_millis(100))
        .retry_policy(fast_policy(5))
        .build()
        .unwrap();

    let err = client.generate(None, false).await.unwrap_err();

    assert!(
        matches!(
            err,
            ForgeError::FatalBackendFailure(BackendError::Timeout(t)) if t == Duration::from_millis(100)
        ),
        "got {err:?}"
    );
    assert!(err.is_user_retryable());
}

#[tokio::test]
async fn test_custom_model_path() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope_with_text(&valid_invention().to_string())),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::builder(API_KEY.to_string())
        .base_url(server.uri())
        .model("gemini-2.5-flash")
        .build()
        .unwrap();

    assert!(client.generate(None, false).await.is_ok());
}
