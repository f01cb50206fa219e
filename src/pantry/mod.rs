//! Pantry domain: ingredient normalization, shelf life and image analysis

pub mod analysis;
pub mod ingredients;
pub mod shelf_life;

pub use analysis::{analyze_image, suggest_for_ingredients, Analysis};
pub use shelf_life::ShelfLife;
