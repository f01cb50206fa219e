//! Backend module - clients for the external engines (detector, OCR, LLM)

pub mod credentials;
pub mod detector;
pub mod ocr;
pub mod text_backend;

pub use credentials::{CredentialsError, DiscoveryPaths, TokenSource};
pub use detector::{BoundingBox, Detection, Detector, HttpDetector};
pub use ocr::{OcrBlock, OcrHandle, OcrResult, OcrUnavailable, TextRecognizer, VisionOcrClient};
pub use text_backend::{
    ChatChoice, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, OpenRouterBackend,
};
