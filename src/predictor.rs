//! Score prediction over an opaque fitted regressor.

use std::sync::Arc;

use crate::errors::AppError;
use crate::forest::{ModelError, ModelPackage};
use crate::models::{FeatureVector, ModelMetadata};

/// Nominal range of a health score. Not enforced on model output.
pub const SCORE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=100.0;

/// A fitted regression capability: feature slice in, one score out.
///
/// Implementations must reject inputs of the wrong length instead of
/// panicking.
pub trait Regressor: Send + Sync {
    fn predict(&self, features: &[f64]) -> Result<f64, AppError>;
}

/// Read-only handle to the loaded model, shared across requests.
#[derive(Clone)]
pub struct ScorePredictor {
    regressor: Arc<dyn Regressor>,
    metadata: ModelMetadata,
}

impl ScorePredictor {
    pub fn new(regressor: Arc<dyn Regressor>, metadata: ModelMetadata) -> Self {
        Self {
            regressor,
            metadata,
        }
    }

    /// Builds a predictor from a loaded model file, re-checking its structure.
    pub fn from_package(package: ModelPackage) -> Result<Self, ModelError> {
        package.validate()?;
        Ok(Self::new(Arc::new(package.model), package.metadata))
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Scores one feature vector. The model's output is returned unclamped.
    ///
    /// # Errors
    ///
    /// * `AppError::InternalError` - the regressor rejected the input or produced a non-finite score.
    pub fn predict(&self, features: &FeatureVector) -> Result<f64, AppError> {
        let score = self.regressor.predict(&features.to_array())?;

        if !score.is_finite() {
            return Err(AppError::InternalError(format!(
                "Model produced a non-finite score: {}",
                score
            )));
        }
        if !SCORE_RANGE.contains(&score) {
            tracing::warn!(
                "Model {} produced out-of-range score {:.2}",
                self.metadata.version,
                score
            );
        }

        Ok(score)
    }
}
