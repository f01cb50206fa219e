//! Object detection backend
//!
//! Talks to a YOLO inference server that answers with the Ultralytics
//! results JSON (`[{name, class, confidence, box: {x1, y1, x2, y2}}]`).

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};
use utoipa::ToSchema;

use crate::config::DetectorConfig;
use crate::error::{AppError, Result};

/// One predicted object instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    /// Corners as `[x1, y1, x2, y2]` in pixels
    #[serde(rename = "box")]
    #[schema(value_type = Vec<f32>)]
    pub bbox: [f32; 4],
}

/// Trait for object detectors
#[async_trait]
pub trait Detector: Send + Sync {
    /// Model identifier in use
    fn model(&self) -> &str;

    /// Run detection over encoded image bytes
    async fn detect(&self, image: &[u8]) -> Result<Vec<Detection>>;
}

/// Request body understood by the inference server
#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    model: &'a str,
    image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    conf: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// One entry of the Ultralytics results JSON
#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    class: Option<i64>,
    confidence: f32,
    #[serde(rename = "box")]
    bbox: BoundingBox,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PredictResponse {
    Bare(Vec<Prediction>),
    Wrapped { predictions: Vec<Prediction> },
}

impl From<Prediction> for Detection {
    fn from(p: Prediction) -> Self {
        let label = match p.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => p.class.map(|c| c.to_string()).unwrap_or_default(),
        };

        Detection {
            label,
            confidence: p.confidence,
            bbox: [p.bbox.x1, p.bbox.y1, p.bbox.x2, p.bbox.y2],
        }
    }
}

/// Detector backed by an HTTP inference server
pub struct HttpDetector {
    client: Client,
    endpoint: String,
    model: String,
    confidence: Option<f32>,
}

impl HttpDetector {
    /// Create a new detector client
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            confidence: config.confidence,
        })
    }
}

#[async_trait]
impl Detector for HttpDetector {
    fn model(&self) -> &str {
        &self.model
    }

    async fn detect(&self, image: &[u8]) -> Result<Vec<Detection>> {
        let url = format!("{}/predict", self.endpoint);
        debug!(url = %url, model = %self.model, bytes = image.len(), "Sending detection request");

        let request = PredictRequest {
            model: &self.model,
            image: STANDARD.encode(image),
            conf: self.confidence,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Detector(format!("Detector unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Detector(format!(
                "Detector returned {}: {}",
                status, body
            )));
        }

        let parsed = response.json::<PredictResponse>().await.map_err(|e| {
            error!(error = %e, "Failed to parse detector response");
            AppError::Detector(format!("Failed to parse response: {}", e))
        })?;

        let predictions = match parsed {
            PredictResponse::Bare(p) => p,
            PredictResponse::Wrapped { predictions } => predictions,
        };

        Ok(predictions.into_iter().map(Detection::from).collect())
    }
}
