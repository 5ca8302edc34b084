use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============ Domain Models ============

/// Canonical product data derived from an upstream product record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetails {
    /// Product barcode, copied from the record's `code`.
    pub barcode: String,
    /// Product name.
    pub name: String,
    /// Sugars in grams per 100g.
    pub sugar: f64,
    /// Sodium per 100g.
    pub sodium: f64,
    /// Raw ingredient text; empty when the record has none.
    pub ingredients: String,
}

/// User health profile.
///
/// [`UserProfile::from_value`] checks age, weight and height against their
/// domains. Profiles built field by field skip that check, so `compose`
/// still guards against a non-positive weight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub age: f64,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub sugar_level: f64,
    pub diabetes: bool,
    pub hypertension: bool,
}

/// Model input, in the exact column order the regressor was fitted on.
///
/// Serializes as a named mapping; field declaration order is the wire order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub age: f64,
    pub weight: f64,
    pub height: f64,
    pub sugar_level: f64,
    pub diabetes: u8,
    pub hypertension: u8,
    pub sugar: f64,
    pub sodium: f64,
    pub sugar_per_kg: f64,
    pub sodium_per_kg: f64,
    pub preservative_count: u32,
}

/// Number of model inputs.
pub const FEATURE_COUNT: usize = 11;

/// Column names in fitting order. A model file must declare exactly this list.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "weight",
    "height",
    "sugar_level",
    "diabetes",
    "hypertension",
    "sugar",
    "sodium",
    "sugar_per_kg",
    "sodium_per_kg",
    "preservative_count",
];

impl FeatureVector {
    /// Flattens the vector for the regressor. Order matches [`FEATURE_NAMES`].
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.age,
            self.weight,
            self.height,
            self.sugar_level,
            f64::from(self.diabetes),
            f64::from(self.hypertension),
            self.sugar,
            self.sodium,
            self.sugar_per_kg,
            self.sodium_per_kg,
            f64::from(self.preservative_count),
        ]
    }
}

/// Training metrics recorded for a model build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub r2_score: f64,
    pub mse: f64,
    pub mae: f64,
    pub accuracy: f64,
}

/// Static descriptor of the loaded model, returned verbatim by `/model/version`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub version: String,
    /// `YYYY-MM-DD`
    pub training_date: String,
    pub metrics: ModelMetrics,
}

// ============ API Models ============

/// Successful `/predict` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub health_score: f64,
    pub product_details: ProductDetails,
    pub computed_features: FeatureVector,
    pub model_version: String,
    pub prediction_time_ms: f64,
}

/// `/predict` request after envelope validation.
#[derive(Debug, Clone)]
pub struct PredictionRequest {
    /// Raw user profile mapping; validated by the feature composer.
    pub user: Value,
    pub barcode: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_vector() -> FeatureVector {
        FeatureVector {
            age: 30.0,
            weight: 70.0,
            height: 170.0,
            sugar_level: 90.0,
            diabetes: 1,
            hypertension: 0,
            sugar: 5.0,
            sodium: 0.1,
            sugar_per_kg: 5.0 / 70.0,
            sodium_per_kg: 0.1 / 70.0,
            preservative_count: 2,
        }
    }

    #[test]
    fn test_serialized_keys_match_array_positions() {
        let vector = sample_vector();
        let json = serde_json::to_value(vector).unwrap();
        let arr = vector.to_array();

        assert_eq!(json.as_object().unwrap().len(), FEATURE_COUNT);
        for (i, name) in FEATURE_NAMES.iter().enumerate() {
            assert_eq!(json[*name].as_f64(), Some(arr[i]), "feature {}", name);
        }
    }

    #[test]
    fn test_to_array_order() {
        let arr = sample_vector().to_array();
        assert_eq!(arr.len(), FEATURE_COUNT);
        assert_eq!(arr[0], 30.0);
        assert_eq!(arr[1], 70.0);
        assert_eq!(arr[2], 170.0);
        assert_eq!(arr[3], 90.0);
        assert_eq!(arr[4], 1.0);
        assert_eq!(arr[5], 0.0);
        assert_eq!(arr[6], 5.0);
        assert_eq!(arr[7], 0.1);
        assert_eq!(arr[10], 2.0);
    }
}
