//! Nutrition extraction: upstream product record → [`ProductDetails`].
//!
//! Pure and synchronous. Errors are returned to the caller untouched.

use serde_json::Value;

use crate::coercion::{as_number, as_text};
use crate::errors::AppError;
use crate::models::ProductDetails;

/// Required record keys and the names used for them in error messages.
const REQUIRED_PRODUCT_FIELDS: [(&str, &str); 3] = [
    ("code", "barcode"),
    ("product_name", "product name"),
    ("nutriments", "nutritional information"),
];

/// Validates a raw product record and normalizes it into [`ProductDetails`].
///
/// Missing `sugars_100g` / `sodium_100g` default to 0. Negative or
/// non-numeric values are rejected with a single error kind.
///
/// # Errors
///
/// * `AppError::Validation` - empty record, missing required keys, or bad nutrient values.
pub fn extract_product_details(product: &Value) -> Result<ProductDetails, AppError> {
    let record = match product {
        Value::Object(map) if !map.is_empty() => map,
        Value::Object(_) | Value::Null => {
            return Err(AppError::Validation(
                "Product data cannot be empty".to_string(),
            ))
        }
        _ => {
            return Err(AppError::Validation(
                "Product data must be an object".to_string(),
            ))
        }
    };

    let missing: Vec<&str> = REQUIRED_PRODUCT_FIELDS
        .iter()
        .filter(|(key, _)| !record.contains_key(*key))
        .map(|(_, label)| *label)
        .collect();
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "Missing required product fields: {}",
            missing.join(", ")
        )));
    }

    let nutriments = record["nutriments"].as_object().ok_or_else(|| {
        AppError::Validation("Invalid numerical values in nutritional data".to_string())
    })?;

    let sugar = nutrient_value(nutriments.get("sugars_100g"))?;
    let sodium = nutrient_value(nutriments.get("sodium_100g"))?;

    let ingredients = match record.get("ingredients_text") {
        Some(Value::String(text)) => text.clone(),
        _ => String::new(),
    };

    Ok(ProductDetails {
        barcode: as_text(&record["code"]),
        name: as_text(&record["product_name"]),
        sugar,
        sodium,
        ingredients,
    })
}

/// Absent → 0; present must be a non-negative number.
fn nutrient_value(raw: Option<&Value>) -> Result<f64, AppError> {
    let Some(raw) = raw else {
        return Ok(0.0);
    };

    match as_number(raw) {
        Some(v) if v >= 0.0 => Ok(v),
        _ => Err(AppError::Validation(
            "Invalid numerical values in nutritional data".to_string(),
        )),
    }
}
