//! Prompt construction for recipe generation

use crate::backend::ChatMessage;

pub const SYSTEM_PROMPT: &str = "You are a helpful recipe assistant that outputs only valid JSON.";

/// Number of recipes requested from the model
pub const RECIPE_COUNT: usize = 2;

/// User prompt asking for strict JSON recipes built from `ingredients`
pub fn recipe_prompt(ingredients: &[String]) -> String {
    format!(
        "Create {} short recipe ideas that can be made using ONLY these ingredients if possible, \
         or mostly them with common pantry items: {}. \
         Return STRICT JSON with key 'recipes' only, where each recipe has: \
         name (string), description (string), cooking_time (string, e.g., '30 min'), \
         and instructions (array of strings). No markdown, just plain JSON.",
        RECIPE_COUNT,
        ingredients.join(", ")
    )
}

pub fn recipe_messages(ingredients: &[String]) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(recipe_prompt(ingredients)),
    ]
}
