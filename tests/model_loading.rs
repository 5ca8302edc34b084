/// Model file loading tests
/// Tests checksum verification and the feature-order guard applied at startup
use nutriscore_api::forest::{load_model, sha256_hex, ModelError};
use nutriscore_api::predictor::ScorePredictor;
use nutriscore_api::scoring::self_check;
use serde_json::Value;
use std::io::Write;
use tempfile::NamedTempFile;

const BUNDLED: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/model/health_score_model.json");

fn bundled_json() -> Value {
    serde_json::from_str(&std::fs::read_to_string(BUNDLED).unwrap()).unwrap()
}

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_bundled_model_loads_and_scores() {
    let package = load_model(BUNDLED, None).unwrap();
    assert_eq!(package.metadata.version, "1.0.0");
    assert_eq!(package.model.trees.len(), 3);

    let predictor = ScorePredictor::from_package(package).unwrap();
    let score = self_check(&predictor).unwrap();
    assert!((score - (88.4 + 84.9 + 86.0) / 3.0).abs() < 1e-9);
}

#[test]
fn test_checksum_verified() {
    let digest = sha256_hex(&std::fs::read(BUNDLED).unwrap());

    assert!(load_model(BUNDLED, Some(&digest)).is_ok());
    assert!(load_model(BUNDLED, Some(&digest.to_uppercase())).is_ok());

    let wrong = "0".repeat(64);
    match load_model(BUNDLED, Some(&wrong)) {
        Err(ModelError::ChecksumMismatch { expected, actual }) => {
            assert_eq!(expected, wrong);
            assert_eq!(actual, digest);
        }
        other => panic!("expected checksum mismatch, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_reordered_feature_names_refused() {
    let mut json = bundled_json();
    let names = json["feature_names"].as_array_mut().unwrap();
    names.swap(0, 1);

    let file = write_temp(&json.to_string());
    assert!(matches!(
        load_model(file.path(), None),
        Err(ModelError::FeatureOrder { .. })
    ));
}

#[test]
fn test_missing_feature_refused() {
    let mut json = bundled_json();
    json["feature_names"].as_array_mut().unwrap().pop();

    let file = write_temp(&json.to_string());
    assert!(matches!(
        load_model(file.path(), None),
        Err(ModelError::FeatureOrder { .. })
    ));
}

#[test]
fn test_malformed_file_refused() {
    let file = write_temp("{ not json");
    assert!(matches!(load_model(file.path(), None), Err(ModelError::Json(_))));

    assert!(matches!(
        load_model("/nonexistent/model.json", None),
        Err(ModelError::Io(_))
    ));
}

#[test]
fn test_cyclic_tree_refused() {
    let mut json = bundled_json();
    json["trees"][0]["nodes"][1]["left"] = serde_json::json!(0);

    let file = write_temp(&json.to_string());
    assert!(matches!(
        load_model(file.path(), None),
        Err(ModelError::InvalidStructure(_))
    ));
}
