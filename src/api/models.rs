//! API request and response models

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::backend::Detection;
use crate::recipes::Recipe;

/// Body carrying one image as base64 or a data URL
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct ImageRequest {
    /// Base64 image, optionally prefixed `data:image/...;base64,`
    #[serde(default)]
    pub image: Option<String>,
}

impl ImageRequest {
    /// The image string when present and non-empty
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref().filter(|s| !s.is_empty())
    }
}

/// Direct recipe request
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct RecipesRequest {
    /// Ingredient names; trimmed, title-cased and deduplicated server side
    #[serde(default)]
    pub ingredients: Option<Vec<String>>,
}

/// Detection response
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct DetectResponse {
    pub detections: Vec<Detection>,
    pub width: u32,
    pub height: u32,
}

/// Recipe suggestions response
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RecipesResponse {
    pub recipes: Vec<Recipe>,
}

/// Health check response
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}
