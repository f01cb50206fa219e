//! Recipe suggestions from the hosted LLM, with deterministic fallbacks

pub mod fence;
pub mod prompt;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::backend::{ChatCompletionRequest, OpenRouterBackend};
use crate::config::LlmConfig;
use crate::error::{AppError, Result};
use crate::pantry::ingredients::title_case;

/// A recipe idea
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Recipe {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub cooking_time: String,
    #[serde(default)]
    pub instructions: Vec<String>,
}

/// Models sometimes answer `"cooking_time": 30`
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => format!("{} min", n),
        Raw::Null(()) => String::new(),
    })
}

/// Top-level shapes accepted from the model
#[derive(Deserialize)]
#[serde(untagged)]
enum RecipePayload {
    Object { recipes: Vec<serde_json::Value> },
    List(Vec<serde_json::Value>),
}

/// Parse model output into recipes. Fences are stripped first; entries that
/// are not recipes or have no name are dropped.
pub fn parse_recipes(content: &str) -> std::result::Result<Vec<Recipe>, serde_json::Error> {
    let payload = fence::extract_payload(content);
    let entries = match serde_json::from_str::<RecipePayload>(payload)? {
        RecipePayload::Object { recipes } => recipes,
        RecipePayload::List(recipes) => recipes,
    };

    Ok(entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<Recipe>(entry).ok())
        .filter(|r| !r.name.trim().is_empty())
        .collect())
}

/// Fallback when recipes are requested for detected ingredients
pub fn detected_fallback(ingredients: &[String]) -> Recipe {
    let lead = ingredients.iter().take(2).cloned().collect::<Vec<_>>().join(" ");
    let listed = ingredients.iter().take(3).cloned().collect::<Vec<_>>().join(", ");

    Recipe {
        name: format!("Fresh {} Dish", title_case(&lead)),
        description: format!("A simple dish using {} and common pantry items.", listed),
        cooking_time: "15 min".to_string(),
        instructions: vec![
            "Wash and prep ingredients.".to_string(),
            "Combine in a pan with oil and seasonings.".to_string(),
            "Cook until done and serve.".to_string(),
        ],
    }
}

/// Fallback when recipes are requested for a supplied ingredient list
pub fn pantry_fallback() -> Recipe {
    Recipe {
        name: "Pantry-Friendly Mix".to_string(),
        description: "A simple dish using provided ingredients and common pantry items."
            .to_string(),
        cooking_time: "15 min".to_string(),
        instructions: vec![
            "Prep all ingredients.".to_string(),
            "Season and combine in a pan.".to_string(),
            "Cook until flavors meld and serve.".to_string(),
        ],
    }
}

/// Asks the LLM for recipe ideas. Every failure yields an empty list.
pub struct RecipeAdvisor {
    backend: Option<OpenRouterBackend>,
}

impl RecipeAdvisor {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let backend = OpenRouterBackend::new(config)?;
        match &backend {
            Some(b) => info!(model = %b.model(), "Recipe generation enabled"),
            None => info!("OPENROUTER_API_KEY not set, recipe generation disabled"),
        }
        Ok(Self { backend })
    }

    /// Advisor that never calls out
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Recipe ideas for `ingredients`, or an empty list on any failure
    pub async fn suggest(&self, ingredients: &[String]) -> Vec<Recipe> {
        let Some(backend) = &self.backend else {
            debug!("Recipe generation disabled, skipping LLM call");
            return Vec::new();
        };

        match Self::request(backend, ingredients).await {
            Ok(recipes) => {
                info!(count = recipes.len(), "Received recipe suggestions");
                recipes
            }
            Err(e) => {
                warn!(error = %e, "Recipe generation failed");
                Vec::new()
            }
        }
    }

    async fn request(backend: &OpenRouterBackend, ingredients: &[String]) -> Result<Vec<Recipe>> {
        let request = ChatCompletionRequest {
            model: backend.model().to_string(),
            messages: prompt::recipe_messages(ingredients),
            temperature: Some(backend.temperature()),
        };

        let response = backend.chat_completion(request).await?;
        parse_recipes(response.first_content())
            .map_err(|e| AppError::EngineError(format!("Model returned invalid JSON: {}", e)))
    }
}
