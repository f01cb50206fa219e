//! Pantry Lens
//!
//! An image understanding backend: detects food ingredients in photos,
//! estimates their shelf life, asks a hosted LLM for recipe ideas and
//! extracts text through a cloud OCR engine.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod pantry;
pub mod recipes;

pub use error::{AppError, Result};

use std::sync::Arc;

use backend::{Detector, HttpDetector, OcrHandle, VisionOcrClient};
use recipes::RecipeAdvisor;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<config::Settings>,
    pub detector: Arc<dyn Detector>,
    /// OCR engine, or the reason it could not be set up
    pub ocr: OcrHandle,
    pub recipes: Arc<RecipeAdvisor>,
}

impl AppState {
    /// Construct every engine from settings. OCR setup failure is kept as a
    /// value so that only `/ocr` reports it.
    pub async fn from_settings(settings: config::Settings) -> Result<Self> {
        let detector: Arc<dyn Detector> = Arc::new(HttpDetector::new(&settings.detector)?);
        let recipes = Arc::new(RecipeAdvisor::new(&settings.llm)?);
        let ocr = VisionOcrClient::initialize(&settings.ocr).await;

        if let Err(unavailable) = &ocr {
            tracing::warn!(reason = %unavailable.reason, "OCR engine unavailable");
        }

        Ok(Self {
            settings: Arc::new(settings),
            detector,
            ocr,
            recipes,
        })
    }
}
