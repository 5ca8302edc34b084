//! Prediction pipeline: raw record + raw profile → score.
//!
//! The steps run in a fixed order (extract, compose, predict) and errors from
//! each step are returned as-is. The caller owns the mapping to responses.

use serde_json::{json, Value};

use crate::errors::AppError;
use crate::features::compute_features;
use crate::models::{FeatureVector, ProductDetails};
use crate::nutrition::extract_product_details;
use crate::predictor::ScorePredictor;

/// Intermediate and final values of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredProduct {
    pub health_score: f64,
    pub product_details: ProductDetails,
    pub features: FeatureVector,
}

/// Runs extract → compose → predict.
pub fn score_product(
    predictor: &ScorePredictor,
    user_data: &Value,
    raw_product: &Value,
) -> Result<ScoredProduct, AppError> {
    let product_details = extract_product_details(raw_product)?;
    let features = compute_features(user_data, &product_details)?;
    tracing::debug!("Computed features for {}: {:?}", product_details.barcode, features);

    let health_score = predictor.predict(&features)?;

    Ok(ScoredProduct {
        health_score,
        product_details,
        features,
    })
}

/// Fixed profile used by the health check.
pub fn smoke_test_user() -> Value {
    json!({
        "age": 30,
        "weight": 70,
        "height": 170,
        "sugar_level": 90,
        "diabetes": 0,
        "hypertension": 0
    })
}

/// Fixed product record used by the health check.
pub fn smoke_test_product() -> Value {
    json!({
        "code": "test",
        "product_name": "Test Product",
        "nutriments": {
            "sugars_100g": 5,
            "sodium_100g": 0.1
        }
    })
}

/// Pushes the fixed smoke-test inputs through the whole pipeline.
pub fn self_check(predictor: &ScorePredictor) -> Result<f64, AppError> {
    score_product(predictor, &smoke_test_user(), &smoke_test_product()).map(|s| s.health_score)
}
