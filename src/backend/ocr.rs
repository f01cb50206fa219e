//! OCR backend using the Cloud Vision `images:annotate` REST API

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::backend::credentials::{self, CredentialsError, TokenSource};
use crate::config::OcrConfig;
use crate::error::{AppError, Result};

const NOT_CONFIGURED: &str = "Vision client not configured. Set GOOGLE_APPLICATION_CREDENTIALS or run 'gcloud auth application-default login'";

/// A block of recognized text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OcrBlock {
    pub text: String,
    pub confidence: Option<f32>,
}

/// Recognized text for one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OcrResult {
    pub text: String,
    pub blocks: Vec<OcrBlock>,
}

/// Trait for text recognition engines
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image: &[u8]) -> Result<OcrResult>;
}

/// The OCR engine could not be set up at startup
#[derive(Debug, Clone)]
pub struct OcrUnavailable {
    pub reason: String,
}

impl From<CredentialsError> for OcrUnavailable {
    fn from(e: CredentialsError) -> Self {
        Self {
            reason: e.to_string(),
        }
    }
}

impl From<&OcrUnavailable> for AppError {
    fn from(e: &OcrUnavailable) -> Self {
        AppError::EngineUnavailable {
            message: NOT_CONFIGURED.to_string(),
            details: e.reason.clone(),
        }
    }
}

/// Engine handle held by the application state
pub type OcrHandle = std::result::Result<Arc<dyn TextRecognizer>, OcrUnavailable>;

// --- Vision API wire types -------------------------------------------------

#[derive(Serialize)]
struct AnnotateRequest<'a> {
    requests: [AnnotateImageRequest<'a>; 1],
}

#[derive(Serialize)]
struct AnnotateImageRequest<'a> {
    image: ImageContent,
    features: [Feature<'a>; 1],
}

#[derive(Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Serialize)]
struct Feature<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    full_text_annotation: Option<TextAnnotation>,
    #[serde(default)]
    error: Option<Status>,
}

#[derive(Debug, Default, Deserialize)]
struct Status {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Status,
}

#[derive(Debug, Default, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    text: String,
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Default, Deserialize)]
struct Page {
    #[serde(default)]
    blocks: Vec<Block>,
}

#[derive(Debug, Default, Deserialize)]
struct Block {
    #[serde(default)]
    paragraphs: Vec<Paragraph>,
    #[serde(default)]
    confidence: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct Paragraph {
    #[serde(default)]
    words: Vec<Word>,
}

#[derive(Debug, Default, Deserialize)]
struct Word {
    #[serde(default)]
    symbols: Vec<Symbol>,
}

#[derive(Debug, Default, Deserialize)]
struct Symbol {
    #[serde(default)]
    text: String,
}

impl Block {
    /// Words joined by spaces, each word the concatenation of its symbols
    fn joined_text(&self) -> String {
        self.paragraphs
            .iter()
            .flat_map(|p| p.words.iter())
            .map(|w| w.symbols.iter().map(|s| s.text.as_str()).collect::<String>())
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<Option<TextAnnotation>> for OcrResult {
    fn from(annotation: Option<TextAnnotation>) -> Self {
        let Some(annotation) = annotation else {
            return OcrResult {
                text: String::new(),
                blocks: Vec::new(),
            };
        };

        let blocks = annotation
            .pages
            .iter()
            .flat_map(|page| page.blocks.iter())
            .map(|block| OcrBlock {
                text: block.joined_text(),
                confidence: block.confidence,
            })
            .collect();

        OcrResult {
            text: annotation.text,
            blocks,
        }
    }
}

// --- Client ----------------------------------------------------------------

/// Cloud Vision text detection client
pub struct VisionOcrClient {
    client: Client,
    endpoint: String,
    credentials: Arc<dyn TokenSource>,
}

impl VisionOcrClient {
    pub fn new(config: &OcrConfig, credentials: Arc<dyn TokenSource>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Discover credentials and build the engine handle once at startup
    pub async fn initialize(config: &OcrConfig) -> OcrHandle {
        let token_client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| OcrUnavailable {
                reason: e.to_string(),
            })?;

        let credentials = credentials::discover(token_client).await?;
        debug!(kind = credentials.kind(), "Resolved OCR credentials");

        let client = Self::new(config, credentials).map_err(|e| OcrUnavailable {
            reason: e.to_string(),
        })?;
        Ok(Arc::new(client))
    }
}

#[async_trait]
impl TextRecognizer for VisionOcrClient {
    async fn recognize(&self, image: &[u8]) -> Result<OcrResult> {
        let token = self.credentials.access_token().await.map_err(|e| {
            warn!(error = %e, "Failed to obtain OCR access token");
            AppError::EngineUnavailable {
                message: NOT_CONFIGURED.to_string(),
                details: e.to_string(),
            }
        })?;

        let body = AnnotateRequest {
            requests: [AnnotateImageRequest {
                image: ImageContent {
                    content: STANDARD.encode(image),
                },
                features: [Feature {
                    kind: "TEXT_DETECTION",
                }],
            }],
        };

        let url = format!("{}/images:annotate", self.endpoint);
        let mut request = self.client.post(&url).bearer_auth(token).json(&body);
        if let Some(project) = self.credentials.quota_project() {
            request = request.header("x-goog-user-project", project);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::EngineError(format!("Vision API unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .ok()
                .map(|e| e.error.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("Vision API returned {}: {}", status, text));
            return Err(AppError::EngineError(message));
        }

        let parsed = response
            .json::<AnnotateResponse>()
            .await
            .map_err(|e| AppError::EngineError(format!("Failed to parse Vision response: {}", e)))?;

        let first = parsed.responses.into_iter().next().unwrap_or_default();
        if let Some(error) = first.error.filter(|e| !e.message.is_empty()) {
            return Err(AppError::EngineError(error.message));
        }

        Ok(OcrResult::from(first.full_text_annotation))
    }
}
