//! Turns a free-text model answer into a [`MealEstimate`].
//!
//! Models wrap JSON in markdown fences, add prose around it, spell numbers
//! out ("twenty"), attach units ("350 kcal") or return one object per
//! detected food item. All of these are normalised here.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::nutrition::entities::{MealEstimate, NutritionFacts};

pub const COMPOSITE_MEAL_NAME: &str = "Composite Meal";

const MAX_NAMED_ITEMS: usize = 3;
const ITEM_LIST_KEYS: [&str; 2] = ["items", "foods"];
const NUTRIENT_KEYS: [&str; 4] = ["calories", "protein", "carbs", "fats"];

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)\s*```").expect("valid fence regex"));

// Thousands-separated numbers first so "1,200" is not read as 1.
static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-?\d{1,3}(?:,\d{3})+(?:\.\d+)?|-?\d+(?:\.\d+)?").expect("valid number regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no JSON payload found in model response")]
    NoJson,

    #[error("invalid JSON in model response: {0}")]
    InvalidJson(String),

    #[error("unexpected JSON shape in model response: expected an object or an array")]
    UnexpectedShape,
}

pub fn parse_nutrition_response(raw: &str) -> Result<MealEstimate, ParseError> {
    match extract_json(raw)? {
        Value::Object(map) => Ok(estimate_from_object(&map)),
        Value::Array(items) => Ok(aggregate_items(&items)),
        _ => Err(ParseError::UnexpectedShape),
    }
}

fn extract_json(raw: &str) -> Result<Value, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::NoJson);
    }

    let candidate = FENCED_BLOCK
        .captures(trimmed)
        .and_then(|captures| captures.get(1))
        .map(|body| body.as_str())
        .unwrap_or(trimmed);

    match serde_json::from_str::<Value>(candidate) {
        Ok(value) => Ok(value),
        Err(_) => first_embedded_value(candidate),
    }
}

/// Scans every opening bracket and returns the first JSON object, or array of
/// objects, that parses from there. Trailing prose after it is ignored.
fn first_embedded_value(text: &str) -> Result<Value, ParseError> {
    let mut first_error: Option<String> = None;

    for (start, _) in text.match_indices(['{', '[']) {
        let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();

        match values.next() {
            Some(Ok(value @ Value::Object(_))) => return Ok(value),
            Some(Ok(Value::Array(items))) if items.iter().any(Value::is_object) => {
                return Ok(Value::Array(items));
            }
            Some(Ok(_)) | None => {}
            Some(Err(e)) => {
                first_error.get_or_insert_with(|| e.to_string());
            }
        }
    }

    Err(first_error.map_or(ParseError::NoJson, ParseError::InvalidJson))
}

fn estimate_from_object(map: &Map<String, Value>) -> MealEstimate {
    let has_nutrients = NUTRIENT_KEYS.iter().any(|key| map.contains_key(*key));

    if !has_nutrients
        && let Some(items) = ITEM_LIST_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
    {
        let mut estimate = aggregate_items(items);
        if let Some(name) = meal_name(map) {
            estimate.meal_name = Some(name);
        }
        return estimate;
    }

    MealEstimate {
        meal_name: meal_name(map),
        facts: facts_from_object(map),
    }
}

fn aggregate_items(items: &[Value]) -> MealEstimate {
    let mut facts = NutritionFacts::zero();
    let mut names = Vec::new();

    for item in items.iter().filter_map(Value::as_object) {
        if let Some(name) = meal_name(item) {
            names.push(name);
        }
        facts = facts.saturating_add(facts_from_object(item));
    }

    let meal_name = if names.is_empty() {
        COMPOSITE_MEAL_NAME.to_string()
    } else {
        let mut display = names
            .iter()
            .take(MAX_NAMED_ITEMS)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" + ");
        if names.len() > MAX_NAMED_ITEMS {
            display.push_str(" + ...");
        }
        display
    };

    MealEstimate {
        meal_name: Some(meal_name),
        facts,
    }
}

fn meal_name(map: &Map<String, Value>) -> Option<String> {
    map.get("meal_name")
        .or_else(|| map.get("name"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn facts_from_object(map: &Map<String, Value>) -> NutritionFacts {
    let field = |key: &str| map.get(key).map(coerce_nutrient).unwrap_or(0);

    NutritionFacts {
        calories: field("calories"),
        protein: field("protein"),
        carbs: field("carbs"),
        fats: field("fats"),
    }
}

/// Reads a nutrient amount out of whatever the model put in the field.
///
/// Numbers are rounded, strings yield their first number or spelled-out
/// English number, anything else is 0. Negative amounts clamp to 0.
pub fn coerce_nutrient(value: &Value) -> u32 {
    let amount = match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(text) => number_in_text(text)
            .or_else(|| words_to_number(text))
            .unwrap_or(0.0),
        _ => 0.0,
    };

    clamp_to_u32(amount)
}

fn clamp_to_u32(amount: f64) -> u32 {
    if !amount.is_finite() || amount <= 0.0 {
        0
    } else if amount >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        amount.round() as u32
    }
}

fn number_in_text(text: &str) -> Option<f64> {
    NUMBER
        .find(text)
        .and_then(|m| m.as_str().replace(',', "").parse::<f64>().ok())
}

fn words_to_number(text: &str) -> Option<f64> {
    let lowered = text.to_lowercase();
    let mut total: u64 = 0;
    let mut current: u64 = 0;
    let mut found = false;

    for word in lowered
        .split(|c: char| !c.is_ascii_alphabetic())
        .filter(|word| !word.is_empty())
    {
        let Some(value) = word_value(word) else {
            continue;
        };
        found = true;

        match value {
            100 => current = current.max(1).saturating_mul(100),
            1000 => {
                total = total.saturating_add(current.max(1).saturating_mul(1000));
                current = 0;
            }
            _ => current = current.saturating_add(value),
        }
    }

    found.then(|| total.saturating_add(current) as f64)
}

fn word_value(word: &str) -> Option<u64> {
    let value = match word {
        "zero" => 0,
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "thirteen" => 13,
        "fourteen" => 14,
        "fifteen" => 15,
        "sixteen" => 16,
        "seventeen" => 17,
        "eighteen" => 18,
        "nineteen" => 19,
        "twenty" => 20,
        "thirty" => 30,
        "forty" => 40,
        "fifty" => 50,
        "sixty" => 60,
        "seventy" => 70,
        "eighty" => 80,
        "ninety" => 90,
        "hundred" => 100,
        "thousand" => 1000,
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn facts(calories: u32, protein: u32, carbs: u32, fats: u32) -> NutritionFacts {
        NutritionFacts {
            calories,
            protein,
            carbs,
            fats,
        }
    }

    #[test]
    fn test_parse_plain_object() {
        let estimate =
            parse_nutrition_response(r#"{"calories": 520, "protein": 35, "carbs": 48, "fats": 18}"#)
                .unwrap();

        assert_eq!(estimate.facts, facts(520, 35, 48, 18));
        assert_eq!(estimate.meal_name, None);
    }

    #[test]
    fn test_parse_fenced_json_with_prose() {
        let raw = "Sure! Here is the estimate:\n```json\n{\"calories\": 410, \"protein\": 22, \"carbs\": 40, \"fats\": 15}\n```\nLet me know if you need more.";

        let estimate = parse_nutrition_response(raw).unwrap();
        assert_eq!(estimate.facts, facts(410, 22, 40, 15));
    }

    #[test]
    fn test_parse_fence_without_language_tag() {
        let raw = "```\n{\"calories\": 100, \"protein\": 1, \"carbs\": 2, \"fats\": 3}\n```";

        let estimate = parse_nutrition_response(raw).unwrap();
        assert_eq!(estimate.facts, facts(100, 1, 2, 3));
    }

    #[test]
    fn test_parse_object_embedded_in_prose() {
        let raw = "Estimated values: {\"calories\": 300, \"protein\": 10, \"carbs\": 50, \"fats\": 8} (approximate)";

        let estimate = parse_nutrition_response(raw).unwrap();
        assert_eq!(estimate.facts, facts(300, 10, 50, 8));
    }

    #[test]
    fn test_parse_object_after_bracketed_prose() {
        let raw = "Estimate [approximate]: {\"calories\": 300, \"protein\": 10, \"carbs\": 50, \"fats\": 8}";

        let estimate = parse_nutrition_response(raw).unwrap();
        assert_eq!(estimate.facts, facts(300, 10, 50, 8));
    }

    #[test]
    fn test_parse_object_followed_by_braces_in_prose() {
        let raw = "{\"calories\": 420, \"protein\": 18, \"carbs\": 60, \"fats\": 12} (use {portion} to scale)";

        let estimate = parse_nutrition_response(raw).unwrap();
        assert_eq!(estimate.facts, facts(420, 18, 60, 12));
    }

    #[test]
    fn test_parse_item_list_after_numeric_array() {
        let raw = "Scores [1, 2]. Items: [{\"meal_name\": \"Toast\", \"calories\": 80}]";

        let estimate = parse_nutrition_response(raw).unwrap();
        assert_eq!(estimate.meal_name.as_deref(), Some("Toast"));
        assert_eq!(estimate.facts, facts(80, 0, 0, 0));
    }

    #[test]
    fn test_parse_prose_numbers_and_units() {
        let raw = r#"{"meal_name": "Oatmeal", "calories": "about 350 kcal", "protein": "twenty", "carbs": "one hundred twenty-five", "fats": "1,200"}"#;

        let estimate = parse_nutrition_response(raw).unwrap();
        assert_eq!(estimate.meal_name.as_deref(), Some("Oatmeal"));
        assert_eq!(estimate.facts, facts(350, 20, 125, 1200));
    }

    #[test]
    fn test_parse_missing_fields_default_to_zero() {
        let estimate = parse_nutrition_response(r#"{"calories": 250}"#).unwrap();
        assert_eq!(estimate.facts, facts(250, 0, 0, 0));
    }

    #[test]
    fn test_parse_sums_item_list() {
        let raw = r#"[
            {"meal_name": "Rice", "calories": 200, "protein": 4, "carbs": 45, "fats": 0.4},
            {"meal_name": "Chicken", "calories": "250", "protein": 31, "carbs": 0, "fats": 13},
            "stray text",
            {"calories": 50, "protein": 2, "carbs": 10, "fats": 0}
        ]"#;

        let estimate = parse_nutrition_response(raw).unwrap();
        assert_eq!(estimate.facts, facts(500, 37, 55, 13));
        assert_eq!(estimate.meal_name.as_deref(), Some("Rice + Chicken"));
    }

    #[test]
    fn test_parse_item_list_names_are_capped() {
        let raw = r#"[{"meal_name": "A"}, {"meal_name": "B"}, {"meal_name": "C"}, {"meal_name": "D"}]"#;

        let estimate = parse_nutrition_response(raw).unwrap();
        assert_eq!(estimate.meal_name.as_deref(), Some("A + B + C + ..."));
    }

    #[test]
    fn test_parse_unnamed_item_list() {
        let estimate = parse_nutrition_response(r#"[{"calories": 10}]"#).unwrap();
        assert_eq!(estimate.meal_name.as_deref(), Some(COMPOSITE_MEAL_NAME));
    }

    #[test]
    fn test_parse_object_wrapping_items() {
        let raw = r#"{"meal_name": "Lunch", "items": [{"calories": 100, "protein": 5}, {"calories": 150, "fats": 9}]}"#;

        let estimate = parse_nutrition_response(raw).unwrap();
        assert_eq!(estimate.meal_name.as_deref(), Some("Lunch"));
        assert_eq!(estimate.facts, facts(250, 5, 0, 9));
    }

    #[test]
    fn test_parse_object_wrapping_foods() {
        let raw = r#"{"foods": [{"name": "Egg", "calories": 78, "protein": 6}, {"name": "Toast", "calories": 80, "carbs": 15}]}"#;

        let estimate = parse_nutrition_response(raw).unwrap();
        assert_eq!(estimate.meal_name.as_deref(), Some("Egg + Toast"));
        assert_eq!(estimate.facts, facts(158, 6, 15, 0));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_nutrition_response("   "), Err(ParseError::NoJson));
        assert_eq!(
            parse_nutrition_response("I cannot identify this food."),
            Err(ParseError::NoJson)
        );
        assert!(matches!(
            parse_nutrition_response("{\"calories\": 12,"),
            Err(ParseError::InvalidJson(_))
        ));
        assert_eq!(
            parse_nutrition_response("42"),
            Err(ParseError::UnexpectedShape)
        );
    }

    #[test]
    fn test_coerce_nutrient_edge_values() {
        assert_eq!(coerce_nutrient(&json!(12.5)), 13);
        assert_eq!(coerce_nutrient(&json!(-40)), 0);
        assert_eq!(coerce_nutrient(&json!("-3 g")), 0);
        assert_eq!(coerce_nutrient(&json!(null)), 0);
        assert_eq!(coerce_nutrient(&json!(true)), 0);
        assert_eq!(coerce_nutrient(&json!("unknown")), 0);
        assert_eq!(coerce_nutrient(&json!("a hundred")), 100);
        assert_eq!(coerce_nutrient(&json!("two thousand")), 2000);
        assert_eq!(coerce_nutrient(&json!(1e12)), u32::MAX);
    }
}
