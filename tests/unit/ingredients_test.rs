//! Ingredient, shelf-life and recipe parsing tests

use pantry_lens::pantry::{ingredients, shelf_life, ShelfLife};
use pantry_lens::recipes::{self, fence, prompt};

#[test]
fn test_detector_labels_become_sorted_unique_names() {
    let labels = ["cell phone", "apple", "Apple", " orange ", "apple", "", "ORANGE"];
    assert_eq!(
        ingredients::normalize(labels),
        vec!["Apple", "Cell Phone", "Orange"]
    );
}

#[test]
fn test_normalize_is_idempotent() {
    let once = ingredients::normalize(["hot dog", "broccoli", "Hot Dog"]);
    let twice = ingredients::normalize(&once);
    assert_eq!(once, twice);
}

#[test]
fn test_title_case_matches_word_boundaries() {
    assert_eq!(ingredients::title_case("wine glass"), "Wine Glass");
    assert_eq!(ingredients::title_case("o'brien's eggs"), "O'Brien'S Eggs");
    assert_eq!(ingredients::title_case("crème fraîche"), "Crème Fraîche");
}

#[test]
fn test_shelf_life_for_each_storage_kind() {
    assert_eq!(
        shelf_life::lookup("Potato"),
        ShelfLife {
            days: 60,
            storage: "Cool, dark place".to_string()
        }
    );
    assert_eq!(shelf_life::lookup("Chicken").days, 2);
    assert_eq!(shelf_life::lookup("Avocado").storage, "Room temperature");
    assert_eq!(shelf_life::lookup("Sandwich"), ShelfLife::default());
}

#[test]
fn test_annotate_covers_every_ingredient() {
    let names = ingredients::normalize(["egg", "pizza"]);
    let annotated = shelf_life::annotate(&names);

    assert_eq!(annotated.len(), 2);
    assert_eq!(annotated["Egg"].days, 28);
    assert_eq!(annotated["Pizza"], ShelfLife::default());
}

#[test]
fn test_fence_prose_around_block() {
    let text = "Sure! Here are recipes:\n```json\n{\"recipes\": []}\n```\nEnjoy!";
    assert_eq!(fence::extract_payload(text), "{\"recipes\": []}");
}

#[test]
fn test_fence_unterminated_runs_to_end() {
    let text = "```\n[{\"name\": \"Stew\"}]\n";
    assert_eq!(fence::extract_payload(text), "[{\"name\": \"Stew\"}]");
}

#[test]
fn test_parse_recipes_from_fenced_object() {
    let content = "```json\n{\"recipes\": [{\"name\": \"Banana Bread\", \"description\": \"Moist\", \"cooking_time\": \"60 min\", \"instructions\": [\"Mash\", \"Bake\"]}]}\n```";
    let parsed = recipes::parse_recipes(content).unwrap();

    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].name, "Banana Bread");
    assert_eq!(parsed[0].cooking_time, "60 min");
    assert_eq!(parsed[0].instructions.len(), 2);
}

#[test]
fn test_parse_recipes_rejects_truncated_json() {
    assert!(recipes::parse_recipes("{\"recipes\": [{\"name\": \"Soup\",").is_err());
}

#[test]
fn test_detected_fallback_uses_leading_ingredients() {
    let names = ingredients::normalize(["tomato", "basil", "cheese", "olive"]);
    let recipe = recipes::detected_fallback(&names);

    assert_eq!(recipe.name, "Fresh Basil Cheese Dish");
    assert_eq!(
        recipe.description,
        "A simple dish using Basil, Cheese, Olive and common pantry items."
    );
    assert_eq!(recipe.instructions.len(), 3);
}

#[test]
fn test_single_ingredient_fallback() {
    let recipe = recipes::detected_fallback(&["Egg".to_string()]);
    assert_eq!(recipe.name, "Fresh Egg Dish");
    assert_eq!(
        recipe.description,
        "A simple dish using Egg and common pantry items."
    );
}

#[test]
fn test_pantry_fallback_is_fixed() {
    let recipe = recipes::pantry_fallback();
    assert_eq!(recipe.name, "Pantry-Friendly Mix");
    assert_eq!(recipe.cooking_time, "15 min");
}

#[test]
fn test_prompt_requests_two_recipes() {
    let prompt = prompt::recipe_prompt(&ingredients::normalize(["rice"]));
    assert!(prompt.starts_with(&format!("Create {} short recipe ideas", prompt::RECIPE_COUNT)));
    assert!(prompt.contains(": Rice."));
}
