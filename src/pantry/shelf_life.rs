//! Static shelf-life table for common ingredients

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Estimated freshness window and recommended storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ShelfLife {
    pub days: u32,
    pub storage: String,
}

const REFRIGERATOR: &str = "Refrigerator";
const ROOM_TEMPERATURE: &str = "Room temperature";
const COOL_DARK: &str = "Cool, dark place";

/// Applied to anything the table does not know
pub const DEFAULT_DAYS: u32 = 7;
pub const DEFAULT_STORAGE: &str = REFRIGERATOR;

const TABLE: &[(&str, u32, &str)] = &[
    // Fruits
    ("Apple", 30, REFRIGERATOR),
    ("Banana", 5, ROOM_TEMPERATURE),
    ("Orange", 14, REFRIGERATOR),
    ("Tomato", 7, ROOM_TEMPERATURE),
    ("Strawberry", 3, REFRIGERATOR),
    ("Lemon", 14, REFRIGERATOR),
    ("Avocado", 5, ROOM_TEMPERATURE),
    ("Grapes", 7, REFRIGERATOR),
    ("Mango", 5, ROOM_TEMPERATURE),
    ("Pineapple", 5, REFRIGERATOR),
    // Vegetables
    ("Carrot", 21, REFRIGERATOR),
    ("Broccoli", 7, REFRIGERATOR),
    ("Spinach", 5, REFRIGERATOR),
    ("Potato", 60, COOL_DARK),
    ("Onion", 30, COOL_DARK),
    ("Garlic", 90, COOL_DARK),
    ("Bell Pepper", 7, REFRIGERATOR),
    ("Cucumber", 7, REFRIGERATOR),
    ("Lettuce", 7, REFRIGERATOR),
    ("Mushroom", 5, REFRIGERATOR),
    // Dairy & eggs
    ("Milk", 7, REFRIGERATOR),
    ("Cheese", 14, REFRIGERATOR),
    ("Yogurt", 14, REFRIGERATOR),
    ("Butter", 30, REFRIGERATOR),
    ("Egg", 28, REFRIGERATOR),
    // Meats
    ("Chicken", 2, REFRIGERATOR),
    ("Beef", 3, REFRIGERATOR),
    ("Pork", 3, REFRIGERATOR),
    ("Fish", 2, REFRIGERATOR),
    ("Shrimp", 2, REFRIGERATOR),
    // Herbs
    ("Basil", 5, REFRIGERATOR),
    ("Cilantro", 7, REFRIGERATOR),
    ("Parsley", 7, REFRIGERATOR),
    ("Mint", 7, REFRIGERATOR),
    ("Thyme", 10, REFRIGERATOR),
];

impl ShelfLife {
    fn new(days: u32, storage: &str) -> Self {
        Self {
            days,
            storage: storage.to_string(),
        }
    }
}

impl Default for ShelfLife {
    fn default() -> Self {
        Self::new(DEFAULT_DAYS, DEFAULT_STORAGE)
    }
}

/// Exact match first, then case-insensitive, then the default.
pub fn lookup(name: &str) -> ShelfLife {
    TABLE
        .iter()
        .find(|(key, _, _)| *key == name)
        .or_else(|| {
            TABLE
                .iter()
                .find(|(key, _, _)| key.to_lowercase() == name.to_lowercase())
        })
        .map(|(_, days, storage)| ShelfLife::new(*days, storage))
        .unwrap_or_default()
}

/// Shelf life for every ingredient, keyed by name
pub fn annotate(ingredients: &[String]) -> BTreeMap<String, ShelfLife> {
    ingredients
        .iter()
        .map(|name| (name.clone(), lookup(name)))
        .collect()
}
