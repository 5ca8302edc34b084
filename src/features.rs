//! Feature composition: user profile + product details → [`FeatureVector`].
//!
//! This is the training/serving contract. Every transformation here must match
//! what produced the training columns, so nothing in this module is allowed to
//! depend on configuration or clock state.

use serde_json::Value;

use crate::coercion::{as_number, is_truthy};
use crate::errors::AppError;
use crate::models::{FeatureVector, ProductDetails, UserProfile};

/// Profile keys that must be present, in the order reported when missing.
pub const REQUIRED_USER_FIELDS: [&str; 6] = [
    "age",
    "weight",
    "height",
    "sugar_level",
    "diabetes",
    "hypertension",
];

/// Ingredient phrases counted as harmful additives.
///
/// Matched as case-insensitive substrings, so "diaspartame" counts as "aspartame".
pub const HARMFUL_PRESERVATIVES: [&str; 6] = [
    "sodium nitrate",
    "aspartame",
    "high fructose corn syrup",
    "sodium benzoate",
    "potassium sorbate",
    "sodium propionate",
];

const INVALID_USER_NUMBERS: &str = "Invalid numerical values in user data";

impl UserProfile {
    /// Validates a raw profile mapping.
    ///
    /// # Errors
    ///
    /// * `AppError::Validation` - empty input, missing keys, non-numeric values,
    ///   or age/weight/height outside (0, 150] / [20, 500] / [50, 250].
    pub fn from_value(raw: &Value) -> Result<Self, AppError> {
        let map = match raw.as_object() {
            Some(map) if !map.is_empty() => map,
            _ => {
                return Err(AppError::Validation(
                    "Both user data and product details are required".to_string(),
                ))
            }
        };

        let missing: Vec<&str> = REQUIRED_USER_FIELDS
            .iter()
            .copied()
            .filter(|field| !map.contains_key(*field))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "Missing required user fields: {}",
                missing.join(", ")
            )));
        }

        let number = |field: &str| {
            as_number(&map[field]).ok_or_else(|| {
                tracing::debug!("User field '{}' is not numeric", field);
                AppError::Validation(INVALID_USER_NUMBERS.to_string())
            })
        };

        let age = number("age")?;
        let weight_kg = number("weight")?;
        let height_cm = number("height")?;
        let sugar_level = number("sugar_level")?;

        if !(age > 0.0 && age <= 150.0) {
            tracing::debug!("Invalid age value: {}", age);
            return Err(AppError::Validation(INVALID_USER_NUMBERS.to_string()));
        }
        if !(20.0..=500.0).contains(&weight_kg) {
            tracing::debug!("Invalid weight value: {}", weight_kg);
            return Err(AppError::Validation(INVALID_USER_NUMBERS.to_string()));
        }
        if !(50.0..=250.0).contains(&height_cm) {
            tracing::debug!("Invalid height value: {}", height_cm);
            return Err(AppError::Validation(INVALID_USER_NUMBERS.to_string()));
        }

        Ok(Self {
            age,
            weight_kg,
            height_cm,
            sugar_level,
            diabetes: is_truthy(&map["diabetes"]),
            hypertension: is_truthy(&map["hypertension"]),
        })
    }
}

/// Validates the raw profile and combines it with product details.
///
/// # Errors
///
/// * `AppError::Validation` - see [`UserProfile::from_value`].
pub fn compute_features(
    user_data: &Value,
    product: &ProductDetails,
) -> Result<FeatureVector, AppError> {
    let profile = UserProfile::from_value(user_data)?;
    Ok(compose(&profile, product))
}

/// Builds the model input from already-validated parts. Infallible.
pub fn compose(profile: &UserProfile, product: &ProductDetails) -> FeatureVector {
    let weight = profile.weight_kg;
    let per_kg = |amount: f64| if weight > 0.0 { amount / weight } else { 0.0 };

    FeatureVector {
        age: profile.age,
        weight,
        height: profile.height_cm,
        sugar_level: profile.sugar_level,
        diabetes: u8::from(profile.diabetes),
        hypertension: u8::from(profile.hypertension),
        sugar: product.sugar,
        sodium: product.sodium,
        sugar_per_kg: per_kg(product.sugar),
        sodium_per_kg: per_kg(product.sodium),
        preservative_count: count_preservatives(&product.ingredients),
    }
}

/// Number of distinct [`HARMFUL_PRESERVATIVES`] phrases contained in `ingredients`.
pub fn count_preservatives(ingredients: &str) -> u32 {
    let text = ingredients.to_lowercase();
    HARMFUL_PRESERVATIVES
        .iter()
        .filter(|phrase| text.contains(*phrase))
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product(ingredients: &str) -> ProductDetails {
        ProductDetails {
            barcode: "test".to_string(),
            name: "Test Product".to_string(),
            sugar: 5.0,
            sodium: 0.1,
            ingredients: ingredients.to_string(),
        }
    }

    fn user() -> Value {
        json!({
            "age": 30, "weight": 70, "height": 170,
            "sugar_level": 90, "diabetes": 0, "hypertension": 0
        })
    }

    #[test]
    fn test_baseline_features() {
        let fv = compute_features(&user(), &product("")).unwrap();

        assert_eq!(fv.age, 30.0);
        assert_eq!(fv.weight, 70.0);
        assert_eq!(fv.height, 170.0);
        assert_eq!(fv.sugar_level, 90.0);
        assert_eq!(fv.diabetes, 0);
        assert_eq!(fv.hypertension, 0);
        assert!((fv.sugar_per_kg - 5.0 / 70.0).abs() < 1e-12);
        assert!((fv.sodium_per_kg - 0.1 / 70.0).abs() < 1e-12);
        assert_eq!(fv.preservative_count, 0);
    }

    #[test]
    fn test_missing_fields_listed_in_order() {
        let err = compute_features(&json!({"age": 30, "height": 170}), &product("")).unwrap_err();
        assert_eq!(
            err,
            AppError::Validation(
                "Missing required user fields: weight, sugar_level, diabetes, hypertension"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_empty_profile_rejected() {
        assert!(compute_features(&json!({}), &product("")).is_err());
        assert!(compute_features(&Value::Null, &product("")).is_err());
    }

    #[test]
    fn test_non_numeric_rejected() {
        let mut u = user();
        u["sugar_level"] = json!("high");
        let err = compute_features(&u, &product("")).unwrap_err();
        assert_eq!(err, AppError::Validation(INVALID_USER_NUMBERS.to_string()));
    }

    #[test]
    fn test_sugar_level_unbounded() {
        let mut u = user();
        u["sugar_level"] = json!(-40);
        assert!(compute_features(&u, &product("")).is_ok());
    }

    #[test]
    fn test_truthy_flags() {
        let mut u = user();
        u["diabetes"] = json!("yes");
        u["hypertension"] = json!(true);
        let fv = compute_features(&u, &product("")).unwrap();
        assert_eq!(fv.diabetes, 1);
        assert_eq!(fv.hypertension, 1);

        u["diabetes"] = json!("");
        u["hypertension"] = json!(false);
        let fv = compute_features(&u, &product("")).unwrap();
        assert_eq!(fv.diabetes, 0);
        assert_eq!(fv.hypertension, 0);
    }

    #[test]
    fn test_preservative_matching() {
        assert_eq!(count_preservatives("contains sodium benzoate and aspartame"), 2);
        assert_eq!(count_preservatives("SODIUM NITRATE"), 1);
        assert_eq!(count_preservatives("diaspartame"), 1);
        assert_eq!(count_preservatives("aspartame, aspartame, aspartame"), 1);
        assert_eq!(count_preservatives("sodium, benzoate"), 0);
        assert_eq!(count_preservatives(""), 0);
    }

    #[test]
    fn test_compose_guards_non_positive_weight() {
        let profile = UserProfile {
            age: 30.0,
            weight_kg: 0.0,
            height_cm: 170.0,
            sugar_level: 90.0,
            diabetes: false,
            hypertension: false,
        };
        let fv = compose(&profile, &product(""));
        assert_eq!(fv.sugar_per_kg, 0.0);
        assert_eq!(fv.sodium_per_kg, 0.0);
    }
}
