//! Backend client integration tests against mocked engines

#[path = "../common/mod.rs"]
mod common;

use pantry_lens::backend::{
    credentials::{self, StaticToken},
    Detector, HttpDetector, TextRecognizer, VisionOcrClient,
};
use pantry_lens::config::{DetectorConfig, LlmConfig, OcrConfig};
use pantry_lens::recipes::RecipeAdvisor;
use pantry_lens::AppError;
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn detector_config(endpoint: &str) -> DetectorConfig {
    DetectorConfig {
        endpoint: endpoint.to_string(),
        model: "yolov8s.pt".to_string(),
        timeout_ms: 2000,
        confidence: Some(0.25),
    }
}

fn ocr_config(endpoint: &str) -> OcrConfig {
    OcrConfig {
        endpoint: endpoint.to_string(),
        timeout_ms: 2000,
    }
}

fn llm_config(base_url: &str) -> LlmConfig {
    LlmConfig {
        api_key: Some("sk-test".to_string()),
        base_url: base_url.to_string(),
        timeout_ms: 2000,
        ..LlmConfig::default()
    }
}

fn ingredients() -> Vec<String> {
    vec!["Egg".to_string(), "Spinach".to_string()]
}

#[tokio::test]
async fn test_detector_sends_model_and_confidence() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .and(body_partial_json(json!({"model": "yolov8s.pt", "conf": 0.25})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predictions": [common::prediction("broccoli", 0.66)]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let detector = HttpDetector::new(&detector_config(&format!("{}/", server.uri()))).unwrap();
    let detections = detector.detect(&common::png_bytes(4, 4)).await.unwrap();

    assert_eq!(detector.model(), "yolov8s.pt");
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].label, "broccoli");
    assert_eq!(detections[0].bbox, [1.0, 2.0, 30.0, 40.0]);
}

#[tokio::test]
async fn test_detector_unreachable() {
    let detector = HttpDetector::new(&detector_config(common::DEAD_ENDPOINT)).unwrap();
    let err = detector.detect(b"bytes").await.unwrap_err();
    assert!(matches!(err, AppError::Detector(_)));
}

#[tokio::test]
async fn test_detector_malformed_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let detector = HttpDetector::new(&detector_config(&server.uri())).unwrap();
    let err = detector.detect(b"bytes").await.unwrap_err();
    assert!(err.to_string().contains("Failed to parse response"));
}

#[tokio::test]
async fn test_vision_client_parses_annotation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/images:annotate"))
        .and(header("authorization", "Bearer static-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responses": [{
                "fullTextAnnotation": {
                    "text": "SALT\n",
                    "pages": [{"blocks": [{"confidence": 0.9, "paragraphs": [{"words": [
                        {"symbols": [{"text": "S"}, {"text": "ALT"}]}
                    ]}]}]}]
                }
            }]
        })))
        .mount(&server)
        .await;

    let client =
        VisionOcrClient::new(&ocr_config(&server.uri()), Arc::new(StaticToken::new("static-token")))
            .unwrap();
    let result = client.recognize(b"image").await.unwrap();

    assert_eq!(result.text, "SALT\n");
    assert_eq!(result.blocks.len(), 1);
    assert_eq!(result.blocks[0].text, "SALT");
}

#[tokio::test]
async fn test_vision_client_empty_response_is_empty_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/images:annotate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"responses": [{}]})))
        .mount(&server)
        .await;

    let client =
        VisionOcrClient::new(&ocr_config(&server.uri()), Arc::new(StaticToken::new("t"))).unwrap();
    let result = client.recognize(b"image").await.unwrap();

    assert_eq!(result.text, "");
    assert!(result.blocks.is_empty());
}

#[tokio::test]
async fn test_vision_client_engine_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/images:annotate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responses": [{"error": {"code": 3, "message": "Bad image data."}}]
        })))
        .mount(&server)
        .await;

    let client =
        VisionOcrClient::new(&ocr_config(&server.uri()), Arc::new(StaticToken::new("t"))).unwrap();
    let err = client.recognize(b"image").await.unwrap_err();

    assert!(matches!(err, AppError::EngineError(ref m) if m == "Bad image data."));
}

#[tokio::test]
async fn test_user_credentials_exchange_is_cached() {
    let token_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=rt-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.fresh",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&token_server)
        .await;

    let vision = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/images:annotate"))
        .and(header("authorization", "Bearer ya29.fresh"))
        .and(header("x-goog-user-project", "pantry-dev"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"responses": [{}]})))
        .expect(2)
        .mount(&vision)
        .await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"type": "authorized_user", "client_id": "cid", "client_secret": "secret",
            "refresh_token": "rt-123", "quota_project_id": "pantry-dev",
            "token_uri": "{}/token"}}"#,
        token_server.uri()
    )
    .unwrap();

    let source = credentials::from_file(file.path(), reqwest::Client::new()).unwrap();
    let client = VisionOcrClient::new(&ocr_config(&vision.uri()), source).unwrap();

    client.recognize(b"first").await.unwrap();
    client.recognize(b"second").await.unwrap();
}

#[tokio::test]
async fn test_rejected_refresh_token_is_unavailable() {
    let token_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Token has been expired or revoked."
        })))
        .mount(&token_server)
        .await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"type": "authorized_user", "client_id": "cid", "client_secret": "secret",
            "refresh_token": "rt", "token_uri": "{}/token"}}"#,
        token_server.uri()
    )
    .unwrap();

    let source = credentials::from_file(file.path(), reqwest::Client::new()).unwrap();
    let client = VisionOcrClient::new(&ocr_config(common::DEAD_ENDPOINT), source).unwrap();
    let err = client.recognize(b"image").await.unwrap_err();

    match err {
        AppError::EngineUnavailable { details, .. } => assert!(details.contains("invalid_grant")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_advisor_parses_fenced_content() {
    let server = MockServer::start().await;
    let content = "Here you go:\n```json\n{\"recipes\": [{\"name\": \"Green Omelette\", \"description\": \"Eggs and greens\", \"cooking_time\": 12, \"instructions\": [\"Whisk\", \"Cook\"]}]}\n```";
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "mistralai/mistral-small-3.2-24b-instruct:free"
        })))
        .and(body_string_contains("outputs only valid JSON"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::completion(content)))
        .mount(&server)
        .await;

    let advisor = RecipeAdvisor::new(&llm_config(&server.uri())).unwrap();
    let recipes = advisor.suggest(&ingredients()).await;

    assert!(advisor.is_enabled());
    assert_eq!(recipes.len(), 1);
    assert_eq!(recipes[0].name, "Green Omelette");
    assert_eq!(recipes[0].cooking_time, "12 min");
}

#[tokio::test]
async fn test_advisor_swallows_failures() {
    let failing = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream error"))
        .mount(&failing)
        .await;

    let malformed = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::completion("I think you could bake")),
        )
        .mount(&malformed)
        .await;

    for base_url in [failing.uri(), malformed.uri(), common::DEAD_ENDPOINT.to_string()] {
        let advisor = RecipeAdvisor::new(&llm_config(&base_url)).unwrap();
        assert!(advisor.suggest(&ingredients()).await.is_empty(), "{}", base_url);
    }
}

#[tokio::test]
async fn test_advisor_without_key_is_disabled() {
    let mut config = llm_config(common::DEAD_ENDPOINT);
    config.api_key = Some("   ".to_string());

    let advisor = RecipeAdvisor::new(&config).unwrap();

    assert!(!advisor.is_enabled());
    assert!(advisor.suggest(&ingredients()).await.is_empty());
}
