//! Offline training-label generation.
//!
//! The hand-written penalty formula below produced the `health_score` column
//! the regressor was fitted on. It is not part of serving: `/predict` scores
//! come from the model only.
//!
//! Note that "per kg" here is per kilogram of *product* (package weight), not
//! per kilogram of body weight as in [`crate::features`].

/// Catalog row as used for dataset generation.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogProduct {
    pub barcode: String,
    pub product_name: String,
    pub sugar_g: f64,
    pub sodium_mg: f64,
    /// Comma-separated list, or `"none"`.
    pub preservatives: String,
    pub weight_g: f64,
}

/// User row as used for dataset generation.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleUser {
    pub user_id: u32,
    pub age: f64,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub sugar_level: f64,
    pub diabetes: bool,
    pub hypertension: bool,
}

impl CatalogProduct {
    pub fn sugar_per_kg(&self) -> f64 {
        self.sugar_g / (self.weight_g / 1000.0)
    }

    pub fn sodium_per_kg(&self) -> f64 {
        self.sodium_mg / (self.weight_g / 1000.0)
    }

    pub fn has_preservatives(&self) -> bool {
        self.preservatives.trim() != "none"
    }

    /// 0 for `"none"`, otherwise the number of comma-separated entries.
    pub fn preservative_count(&self) -> u32 {
        if self.has_preservatives() {
            self.preservatives.split(',').count() as u32
        } else {
            0
        }
    }
}

/// Deterministic health score in [0, 100].
pub fn health_score(user: &SampleUser, product: &CatalogProduct) -> f64 {
    let sugar_per_kg = product.sugar_per_kg();
    let sodium_per_kg = product.sodium_per_kg();

    let mut score = 100.0;
    score -= (sugar_per_kg * 2.0).min(30.0);
    score -= (sodium_per_kg * 0.01).min(20.0);
    if product.has_preservatives() {
        score -= 10.0;
    }
    if user.diabetes {
        score -= sugar_per_kg.min(20.0);
    }
    if user.hypertension {
        score -= (sodium_per_kg * 0.005).min(15.0);
    }

    score.clamp(0.0, 100.0)
}

/// One labeled training example.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRow {
    pub user_id: u32,
    pub barcode: String,
    pub health_score: f64,
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

impl TrainingRow {
    pub const HEADER: [&'static str; 14] = [
        "user_id",
        "barcode",
        "health_score",
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

    pub fn to_csv_record(&self) -> String {
        [
            self.user_id.to_string(),
            self.barcode.clone(),
            self.health_score.to_string(),
            self.age.to_string(),
            self.weight.to_string(),
            self.height.to_string(),
            self.sugar_level.to_string(),
            self.diabetes.to_string(),
            self.hypertension.to_string(),
            self.sugar.to_string(),
            self.sodium.to_string(),
            self.sugar_per_kg.to_string(),
            self.sodium_per_kg.to_string(),
            self.preservative_count.to_string(),
        ]
        .join(",")
    }
}

/// Cross join of users and products, users outermost.
pub fn build_dataset(users: &[SampleUser], products: &[CatalogProduct]) -> Vec<TrainingRow> {
    users
        .iter()
        .flat_map(|user| {
            products.iter().map(move |product| TrainingRow {
                user_id: user.user_id,
                barcode: product.barcode.clone(),
                health_score: health_score(user, product),
                age: user.age,
                weight: user.weight_kg,
                height: user.height_cm,
                sugar_level: user.sugar_level,
                diabetes: u8::from(user.diabetes),
                hypertension: u8::from(user.hypertension),
                sugar: product.sugar_g,
                sodium: product.sodium_mg,
                sugar_per_kg: product.sugar_per_kg(),
                sodium_per_kg: product.sodium_per_kg(),
                preservative_count: product.preservative_count(),
            })
        })
        .collect()
}

/// Built-in sample catalog.
pub fn sample_products() -> Vec<CatalogProduct> {
    let rows: [(&str, &str, f64, f64, &str, f64); 5] = [
        ("5018374350930", "Chocolate Bar", 25.0, 50.0, "sodium benzoate", 100.0),
        ("5018374350931", "Apple Juice", 20.0, 10.0, "sodium benzoate", 200.0),
        ("5018374350932", "Whole Grain Bread", 10.0, 200.0, "none", 500.0),
        ("5018374350933", "Chips", 30.0, 600.0, "sodium benzoate, potassium sorbate", 150.0),
        ("5018374350934", "Yogurt", 15.0, 100.0, "none", 200.0),
    ];

    rows.iter()
        .map(|(barcode, name, sugar, sodium, preservatives, weight)| CatalogProduct {
            barcode: barcode.to_string(),
            product_name: name.to_string(),
            sugar_g: *sugar,
            sodium_mg: *sodium,
            preservatives: preservatives.to_string(),
            weight_g: *weight,
        })
        .collect()
}

/// Built-in sample user profiles.
pub fn sample_users() -> Vec<SampleUser> {
    let rows: [(u32, f64, f64, f64, f64, bool, bool); 5] = [
        (1, 25.0, 70.0, 175.0, 90.0, false, false),
        (2, 35.0, 80.0, 180.0, 100.0, true, false),
        (3, 45.0, 90.0, 170.0, 110.0, false, true),
        (4, 55.0, 100.0, 175.0, 120.0, true, true),
        (5, 65.0, 75.0, 165.0, 95.0, false, false),
    ];

    rows.iter()
        .map(
            |&(user_id, age, weight_kg, height_cm, sugar_level, diabetes, hypertension)| {
                SampleUser {
                    user_id,
                    age,
                    weight_kg,
                    height_cm,
                    sugar_level,
                    diabetes,
                    hypertension,
                }
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(diabetes: bool, hypertension: bool) -> SampleUser {
        SampleUser {
            user_id: 1,
            age: 40.0,
            weight_kg: 70.0,
            height_cm: 175.0,
            sugar_level: 90.0,
            diabetes,
            hypertension,
        }
    }

    fn find(barcode: &str) -> CatalogProduct {
        sample_products()
            .into_iter()
            .find(|p| p.barcode == barcode)
            .unwrap()
    }

    #[test]
    fn test_whole_grain_bread_healthy_user() {
        // sugar/kg = 20 -> -30 (capped); sodium/kg = 400 -> -4; no preservatives
        let score = health_score(&user(false, false), &find("5018374350932"));
        assert!((score - 66.0).abs() < 1e-9);
    }

    #[test]
    fn test_chips_hypertensive_diabetic() {
        // sugar/kg = 200, sodium/kg = 4000
        // 100 - 30 - 20 - 10 - 20 - 15 = 5
        let score = health_score(&user(true, true), &find("5018374350933"));
        assert!((score - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_never_below_zero() {
        let product = CatalogProduct {
            barcode: "1".to_string(),
            product_name: "Salt Lick".to_string(),
            sugar_g: 1000.0,
            sodium_mg: 1_000_000.0,
            preservatives: "a, b".to_string(),
            weight_g: 10.0,
        };
        let score = health_score(&user(true, true), &product);
        assert!(score >= 0.0);
        assert!(score <= 100.0);
    }

    #[test]
    fn test_preservative_count() {
        assert_eq!(find("5018374350930").preservative_count(), 1);
        assert_eq!(find("5018374350932").preservative_count(), 0);
        assert_eq!(find("5018374350933").preservative_count(), 2);
    }

    #[test]
    fn test_dataset_is_cross_join() {
        let rows = build_dataset(&sample_users(), &sample_products());
        assert_eq!(rows.len(), 25);
        assert_eq!(rows[0].user_id, 1);
        assert_eq!(rows[0].barcode, "5018374350930");
        assert_eq!(rows[5].user_id, 2);
        assert!(rows.iter().all(|r| (0.0..=100.0).contains(&r.health_score)));
    }

    #[test]
    fn test_csv_record_matches_header() {
        let rows = build_dataset(&sample_users(), &sample_products());
        let fields = rows[0].to_csv_record().split(',').count();
        assert_eq!(fields, TrainingRow::HEADER.len());
    }
}
