//! Random-forest regressor persisted as JSON.
//!
//! # Model Format
//!
//! ```json
//! {
//!   "metadata": {"version": "1.0.0", "training_date": "2025-04-21",
//!                "metrics": {"r2_score": 0.992, "mse": 0.07, "mae": 0.139, "accuracy": 0.9986}},
//!   "feature_names": ["age", "weight", ...],
//!   "trees": [
//!     {"nodes": [
//!       {"feature": 6, "threshold": 12.5, "left": 1, "right": 2, "value": 0.0},
//!       {"feature": -1, "threshold": 0.0, "left": -1, "right": -1, "value": 81.2},
//!       {"feature": -1, "threshold": 0.0, "left": -1, "right": -1, "value": 64.9}
//!     ]}
//!   ]
//! }
//! ```
//!
//! Traversal starts at node 0 and goes left when `x[feature] <= threshold`.
//! A node whose children are both `-1` is a leaf. The forest output is the
//! mean of its trees.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

use crate::errors::AppError;
use crate::models::{ModelMetadata, FEATURE_COUNT, FEATURE_NAMES};
use crate::predictor::Regressor;

/// Child index marking a leaf.
pub const LEAF: i64 = -1;

/// One node of a fitted decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub feature: i64,
    pub threshold: f64,
    pub left: i64,
    pub right: i64,
    pub value: f64,
}

impl Node {
    pub fn leaf(value: f64) -> Self {
        Self {
            feature: LEAF,
            threshold: 0.0,
            left: LEAF,
            right: LEAF,
            value,
        }
    }

    pub fn split(feature: usize, threshold: f64, left: usize, right: usize) -> Self {
        Self {
            feature: feature as i64,
            threshold,
            left: left as i64,
            right: right as i64,
            value: 0.0,
        }
    }

    fn is_leaf(&self) -> bool {
        self.left == LEAF && self.right == LEAF
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Walks the tree for one sample. Assumes the tree passed [`Tree::validate`].
    fn evaluate(&self, x: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            if node.is_leaf() {
                return node.value;
            }
            idx = if x[node.feature as usize] <= node.threshold {
                node.left as usize
            } else {
                node.right as usize
            };
        }
    }

    fn validate(&self, tree_idx: usize, n_features: usize) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::InvalidStructure(format!(
                "Tree {} is empty",
                tree_idx
            )));
        }

        let n_nodes = self.nodes.len() as i64;
        for (i, node) in self.nodes.iter().enumerate() {
            let invalid = |reason: &str| {
                ModelError::InvalidStructure(format!("Tree {} node {}: {}", tree_idx, i, reason))
            };

            if node.is_leaf() {
                if !node.value.is_finite() {
                    return Err(invalid("leaf value is not finite"));
                }
                continue;
            }

            if node.feature < 0 || node.feature as usize >= n_features {
                return Err(invalid("feature index out of range"));
            }
            if !node.threshold.is_finite() {
                return Err(invalid("threshold is not finite"));
            }
            // Children must come after their parent, so traversal always terminates.
            for child in [node.left, node.right] {
                if child <= i as i64 || child >= n_nodes {
                    return Err(invalid("child index out of range"));
                }
            }
        }

        Ok(())
    }
}

/// Fitted random-forest regressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub trees: Vec<Tree>,
}

impl RandomForest {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::InvalidStructure(
                "Model must contain at least one tree".to_string(),
            ));
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(idx, FEATURE_COUNT)?;
        }
        Ok(())
    }
}

impl Regressor for RandomForest {
    fn predict(&self, features: &[f64]) -> Result<f64, AppError> {
        if features.len() != FEATURE_COUNT {
            return Err(AppError::InternalError(format!(
                "Expected {} features, got {}",
                FEATURE_COUNT,
                features.len()
            )));
        }
        if self.trees.is_empty() {
            return Err(AppError::InternalError("Model has no trees".to_string()));
        }

        let total: f64 = self.trees.iter().map(|t| t.evaluate(features)).sum();
        Ok(total / self.trees.len() as f64)
    }
}

/// Everything stored in a model file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPackage {
    pub metadata: ModelMetadata,
    pub feature_names: Vec<String>,
    #[serde(flatten)]
    pub model: RandomForest,
}

/// Model loading errors.
#[derive(Debug)]
pub enum ModelError {
    Io(std::io::Error),
    Json(serde_json::Error),
    ChecksumMismatch { expected: String, actual: String },
    /// Declared feature names differ from the order the feature composer produces.
    FeatureOrder { expected: Vec<String>, actual: Vec<String> },
    InvalidStructure(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Io(e) => write!(f, "IO error: {}", e),
            ModelError::Json(e) => write!(f, "JSON parsing error: {}", e),
            ModelError::ChecksumMismatch { expected, actual } => {
                write!(f, "Model checksum mismatch: expected {}, got {}", expected, actual)
            }
            ModelError::FeatureOrder { expected, actual } => write!(
                f,
                "Model feature names {:?} do not match expected order {:?}",
                actual, expected
            ),
            ModelError::InvalidStructure(msg) => write!(f, "Invalid model structure: {}", msg),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Io(e) => Some(e),
            ModelError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ModelError {
    fn from(err: std::io::Error) -> Self {
        ModelError::Io(err)
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Json(err)
    }
}

/// Hex-encoded SHA-256 of a byte slice.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Reads, verifies and validates a model file.
///
/// When `expected_sha256` is given, the file's digest must match it
/// (case-insensitive) before anything is parsed.
pub fn load_model(
    path: impl AsRef<Path>,
    expected_sha256: Option<&str>,
) -> Result<ModelPackage, ModelError> {
    let bytes = std::fs::read(path.as_ref())?;

    if let Some(expected) = expected_sha256 {
        let actual = sha256_hex(&bytes);
        if !actual.eq_ignore_ascii_case(expected.trim()) {
            return Err(ModelError::ChecksumMismatch {
                expected: expected.trim().to_lowercase(),
                actual,
            });
        }
    }

    let package: ModelPackage = serde_json::from_slice(&bytes)?;
    package.validate()?;

    tracing::info!(
        "Loaded model {} ({} trees) from {}",
        package.metadata.version,
        package.model.trees.len(),
        path.as_ref().display()
    );

    Ok(package)
}

impl ModelPackage {
    /// Checks feature order, tree structure and metadata.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES) {
            return Err(ModelError::FeatureOrder {
                expected: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
                actual: self.feature_names.clone(),
            });
        }

        if chrono::NaiveDate::parse_from_str(&self.metadata.training_date, "%Y-%m-%d").is_err() {
            return Err(ModelError::InvalidStructure(format!(
                "training_date '{}' is not YYYY-MM-DD",
                self.metadata.training_date
            )));
        }

        self.model.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelMetrics;

    /// Splits on sugar (index 6) at 10.0.
    pub(crate) fn sugar_stump(low: f64, high: f64) -> Tree {
        Tree {
            nodes: vec![Node::split(6, 10.0, 1, 2), Node::leaf(low), Node::leaf(high)],
        }
    }

    fn package(trees: Vec<Tree>) -> ModelPackage {
        ModelPackage {
            metadata: ModelMetadata {
                version: "1.0.0".to_string(),
                training_date: "2025-04-21".to_string(),
                metrics: ModelMetrics {
                    r2_score: 0.992,
                    mse: 0.07,
                    mae: 0.139,
                    accuracy: 0.9986,
                },
            },
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            model: RandomForest { trees },
        }
    }

    fn sample(sugar: f64) -> Vec<f64> {
        vec![30.0, 70.0, 170.0, 90.0, 0.0, 0.0, sugar, 0.1, sugar / 70.0, 0.1 / 70.0, 0.0]
    }

    #[test]
    fn test_forest_averages_trees() {
        let forest = RandomForest {
            trees: vec![sugar_stump(90.0, 40.0), sugar_stump(80.0, 60.0)],
        };

        assert_eq!(forest.predict(&sample(5.0)).unwrap(), 85.0);
        assert_eq!(forest.predict(&sample(10.0)).unwrap(), 85.0);
        assert_eq!(forest.predict(&sample(25.0)).unwrap(), 50.0);
    }

    #[test]
    fn test_shape_mismatch_is_internal_error() {
        let forest = RandomForest {
            trees: vec![sugar_stump(90.0, 40.0)],
        };
        let err = forest.predict(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, AppError::InternalError(_)));
    }

    #[test]
    fn test_validate_rejects_backward_child() {
        let tree = Tree {
            nodes: vec![Node::split(0, 1.0, 1, 2), Node::split(0, 1.0, 0, 2), Node::leaf(1.0)],
        };
        assert!(matches!(
            package(vec![tree]).validate(),
            Err(ModelError::InvalidStructure(_))
        ));
    }

    #[test]
    fn test_validate_rejects_feature_out_of_range() {
        let tree = Tree {
            nodes: vec![Node::split(11, 1.0, 1, 2), Node::leaf(1.0), Node::leaf(2.0)],
        };
        assert!(package(vec![tree]).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_forest() {
        assert!(package(vec![]).validate().is_err());
        assert!(package(vec![Tree { nodes: vec![] }]).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_reordered_features() {
        let mut pkg = package(vec![sugar_stump(1.0, 2.0)]);
        pkg.feature_names.swap(6, 7);
        assert!(matches!(pkg.validate(), Err(ModelError::FeatureOrder { .. })));
    }

    #[test]
    fn test_validate_rejects_bad_training_date() {
        let mut pkg = package(vec![sugar_stump(1.0, 2.0)]);
        pkg.metadata.training_date = "April 2025".to_string();
        assert!(pkg.validate().is_err());
    }

    #[test]
    fn test_package_json_is_flat() {
        let json = serde_json::to_value(package(vec![sugar_stump(1.0, 2.0)])).unwrap();
        assert!(json.get("trees").is_some());
        assert!(json.get("feature_names").is_some());
        assert!(json.get("model").is_none());
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
