//! Shared helpers for integration tests
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use pantry_lens::{
    api::routes::create_router,
    backend::{HttpDetector, OcrHandle, OcrUnavailable},
    config::Settings,
    recipes::RecipeAdvisor,
    AppState,
};
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;

/// Port nothing listens on
pub const DEAD_ENDPOINT: &str = "http://127.0.0.1:9";

/// A blank PNG of the given size
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height))
        .write_to(&mut Cursor::new(&mut buf), image::ImageOutputFormat::Png)
        .unwrap();
    buf
}

pub fn png_base64(width: u32, height: u32) -> String {
    STANDARD.encode(png_bytes(width, height))
}

pub fn png_data_url(width: u32, height: u32) -> String {
    format!("data:image/png;base64,{}", png_base64(width, height))
}

pub fn test_settings(detector_url: &str, llm_url: Option<&str>) -> Settings {
    let mut settings = Settings::default();
    settings.detector.endpoint = detector_url.to_string();
    settings.detector.timeout_ms = 2000;
    if let Some(url) = llm_url {
        settings.llm.api_key = Some("sk-test".to_string());
        settings.llm.base_url = url.to_string();
        settings.llm.timeout_ms = 2000;
    }
    settings
}

pub fn ocr_unconfigured() -> OcrHandle {
    Err(OcrUnavailable {
        reason: "could not find default credentials".to_string(),
    })
}

pub fn build_state(settings: Settings, ocr: OcrHandle) -> Arc<AppState> {
    let detector = Arc::new(HttpDetector::new(&settings.detector).unwrap());
    let recipes = Arc::new(RecipeAdvisor::new(&settings.llm).unwrap());

    Arc::new(AppState {
        settings: Arc::new(settings),
        detector,
        ocr,
        recipes,
    })
}

pub fn build_router(settings: Settings, ocr: OcrHandle) -> Router {
    create_router(build_state(settings, ocr))
}

pub fn json_request(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn raw_request(uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

pub fn multipart_request(uri: &str, field: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "pantry-lens-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"photo.png\"\r\n",
            field
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Drive one request through the router and decode the JSON body
pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Ultralytics-style prediction entry
pub fn prediction(name: &str, confidence: f64) -> Value {
    serde_json::json!({
        "name": name,
        "class": 0,
        "confidence": confidence,
        "box": {"x1": 1.0, "y1": 2.0, "x2": 30.0, "y2": 40.0}
    })
}

/// OpenRouter chat completion body with the given assistant content
pub fn completion(content: &str) -> Value {
    serde_json::json!({
        "id": "gen-1",
        "model": "test-model",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}
