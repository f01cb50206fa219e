//! Composition of detection, shelf life and recipe suggestions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;
use utoipa::ToSchema;

use crate::backend::Detector;
use crate::error::Result;
use crate::pantry::{ingredients, shelf_life, ShelfLife};
use crate::recipes::{self, Recipe, RecipeAdvisor};

/// Ingredients found in an image with their shelf life and recipe ideas
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Analysis {
    pub ingredients: Vec<String>,
    pub shelf_life: BTreeMap<String, ShelfLife>,
    pub recipes: Vec<Recipe>,
}

/// Detect ingredients in `image` and compose the analysis.
///
/// Detector failures propagate; recipe generation never fails and falls
/// back to a synthesized recipe when ingredients exist.
pub async fn analyze_image(
    detector: &dyn Detector,
    advisor: &RecipeAdvisor,
    image: &[u8],
) -> Result<Analysis> {
    let detections = detector.detect(image).await?;
    let ingredients = ingredients::normalize(detections.iter().map(|d| d.label.as_str()));
    let shelf_life = shelf_life::annotate(&ingredients);

    info!(
        detections = detections.len(),
        ingredients = ingredients.len(),
        "Derived ingredients from detections"
    );

    let recipes = if ingredients.is_empty() {
        Vec::new()
    } else {
        let suggested = advisor.suggest(&ingredients).await;
        if suggested.is_empty() {
            vec![recipes::detected_fallback(&ingredients)]
        } else {
            suggested
        }
    };

    Ok(Analysis {
        ingredients,
        shelf_life,
        recipes,
    })
}

/// Recipes for an already normalized, non-empty ingredient list
pub async fn suggest_for_ingredients(advisor: &RecipeAdvisor, ingredients: &[String]) -> Vec<Recipe> {
    let suggested = advisor.suggest(ingredients).await;
    if suggested.is_empty() {
        vec![recipes::pantry_fallback()]
    } else {
        suggested
    }
}
