use crate::coercion::{as_text, is_truthy};
use crate::errors::{AppError, ResultExt};
use crate::models::{ModelMetadata, PredictionRequest, PredictionResponse};
use crate::predictor::ScorePredictor;
use crate::product_client::ProductClient;
use crate::scoring::{score_product, self_check};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tower_http::limit::RequestBodyLimitLayer;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

const BODY_NOT_OBJECT: &str = "Request body must be a JSON object";

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Loaded model. Read-only after startup.
    pub predictor: ScorePredictor,
    /// Barcode → product record lookup.
    pub products: ProductClient,
}

/// Scoring and metadata routes. Callers add rate limiting on top.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/predict", post(predict))
        .route("/model/version", get(model_version))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}

pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

/// GET /health
///
/// Runs a fixed profile and product through the full pipeline so a broken
/// model shows up here rather than on the first real request.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    match self_check(&state.predictor) {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "model_version": state.predictor.metadata().version,
                "last_updated": chrono::Utc::now().to_rfc3339(),
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "unhealthy",
                    "error": e.to_string(),
                })),
            )
        }
    }
}

/// GET /model/version
///
/// Returns the loaded model's metadata verbatim.
pub async fn model_version(State(state): State<Arc<AppState>>) -> Json<ModelMetadata> {
    Json(state.predictor.metadata().clone())
}

/// POST /predict
///
/// Looks up the product by barcode and scores it for the given user profile.
/// The body is parsed as JSON whatever its declared content type.
///
/// # Returns
///
/// * `Result<Json<PredictionResponse>, AppError>` - The score with its inputs, or an error.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, AppError> {
    let start = Instant::now();
    let body: Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!("Rejected unparseable request body: {}", e);
        AppError::Validation(BODY_NOT_OBJECT.to_string())
    })?;
    let request = parse_prediction_request(&body)?;

    tracing::info!(
        "Prediction request received for barcode: {}",
        request.barcode
    );

    let raw_product = state
        .products
        .get_product_by_barcode(&request.barcode)
        .await
        .with_context(|| format!("Product lookup for barcode {}", request.barcode))?;

    let scored = score_product(&state.predictor, &request.user, &raw_product)?;

    tracing::info!(
        "Prediction completed for barcode {}. Score: {:.2}",
        request.barcode,
        scored.health_score
    );

    Ok(Json(PredictionResponse {
        health_score: scored.health_score,
        product_details: scored.product_details,
        computed_features: scored.features,
        model_version: state.predictor.metadata().version.clone(),
        prediction_time_ms: start.elapsed().as_secs_f64() * 1000.0,
    }))
}

/// Validates the `/predict` envelope: an object with truthy `user` and `barcode`.
pub fn parse_prediction_request(body: &Value) -> Result<PredictionRequest, AppError> {
    let map = body
        .as_object()
        .ok_or_else(|| AppError::Validation(BODY_NOT_OBJECT.to_string()))?;

    let user = map
        .get("user")
        .filter(|v| is_truthy(v))
        .ok_or_else(|| AppError::Validation("'user' data is required".to_string()))?;
    let barcode = map
        .get("barcode")
        .filter(|v| is_truthy(v))
        .ok_or_else(|| AppError::Validation("'barcode' is required".to_string()))?;

    Ok(PredictionRequest {
        user: user.clone(),
        barcode: as_text(barcode),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prediction_request() {
        let req = parse_prediction_request(&json!({
            "user": {"age": 30},
            "barcode": "3017620422003"
        }))
        .unwrap();
        assert_eq!(req.barcode, "3017620422003");
        assert_eq!(req.user, json!({"age": 30}));
    }

    #[test]
    fn test_numeric_barcode_rendered_as_text() {
        let req = parse_prediction_request(&json!({
            "user": {"age": 30},
            "barcode": 3017620422003u64
        }))
        .unwrap();
        assert_eq!(req.barcode, "3017620422003");
    }

    #[test]
    fn test_envelope_errors() {
        let err = parse_prediction_request(&json!([1, 2])).unwrap_err();
        assert_eq!(
            err,
            AppError::Validation("Request body must be a JSON object".to_string())
        );

        let err = parse_prediction_request(&json!({"barcode": "1"})).unwrap_err();
        assert_eq!(err, AppError::Validation("'user' data is required".to_string()));

        let err = parse_prediction_request(&json!({"user": {}, "barcode": "1"})).unwrap_err();
        assert_eq!(err, AppError::Validation("'user' data is required".to_string()));

        let err = parse_prediction_request(&json!({"user": {"a": 1}, "barcode": ""})).unwrap_err();
        assert_eq!(err, AppError::Validation("'barcode' is required".to_string()));
    }
}
