use failsafe::futures::CircuitBreaker;
use moka::future::Cache;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

use crate::circuit_breaker::{create_lookup_circuit_breaker, LookupCircuitBreaker};
use crate::config::Config;

/// Failures of the product lookup collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupError {
    /// Barcode is empty or not all digits. Raised before any request is made.
    InvalidInput(String),
    /// Upstream answered but has no product for this barcode.
    NotFound(String),
    /// Upstream unreachable, timed out, answered non-2xx, or sent garbage.
    Unavailable(String),
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::InvalidInput(msg) => write!(f, "Invalid barcode: {}", msg),
            LookupError::NotFound(barcode) => write!(f, "Product not found for barcode: {}", barcode),
            LookupError::Unavailable(msg) => write!(f, "Failed to fetch product data: {}", msg),
        }
    }
}

impl std::error::Error for LookupError {}

/// Checks the barcode shape. Digits only, at least one.
pub fn validate_barcode(barcode: &str) -> Result<(), LookupError> {
    if barcode.is_empty() {
        return Err(LookupError::InvalidInput(
            "Barcode cannot be empty".to_string(),
        ));
    }
    if !barcode.chars().all(|c| c.is_ascii_digit()) {
        return Err(LookupError::InvalidInput(
            "Barcode must contain only digits".to_string(),
        ));
    }
    Ok(())
}

/// Only outages trip the breaker.
fn is_outage(err: &LookupError) -> bool {
    matches!(err, LookupError::Unavailable(_))
}

/// Client for the Open Food Facts product API.
///
/// Found products are cached; misses and failures are not.
#[derive(Clone)]
pub struct ProductClient {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<String, Value>,
    breaker: LookupCircuitBreaker,
}

impl ProductClient {
    /// Creates a new `ProductClient` with the configured timeout, cache and base URL.
    pub fn new(config: &Config) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.product_api_timeout_secs))
            .user_agent(concat!("nutriscore-api/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                LookupError::Unavailable(format!("Failed to create product client: {}", e))
            })?;

        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(config.product_cache_ttl_secs))
            .max_capacity(config.product_cache_capacity)
            .build();

        Ok(Self {
            client,
            base_url: config.product_api_base_url.trim_end_matches('/').to_string(),
            cache,
            breaker: create_lookup_circuit_breaker(),
        })
    }

    /// Resolves a barcode to the raw upstream product record.
    ///
    /// # Returns
    ///
    /// * `Ok(Value)` - The `product` object from the upstream response.
    /// * `Err(LookupError)` - See [`LookupError`] for the three failure kinds.
    pub async fn get_product_by_barcode(&self, barcode: &str) -> Result<Value, LookupError> {
        validate_barcode(barcode)?;

        if let Some(cached) = self.cache.get(barcode).await {
            tracing::debug!("Product cache hit for barcode {}", barcode);
            return Ok(cached);
        }

        let product = self
            .breaker
            .call_with(is_outage, Box::pin(self.fetch(barcode)))
            .await
            .map_err(|e| match e {
                failsafe::Error::Inner(inner) => inner,
                failsafe::Error::Rejected => {
                    tracing::warn!("Product lookup circuit open, rejecting {}", barcode);
                    LookupError::Unavailable("product source temporarily disabled".to_string())
                }
            })?;

        self.cache.insert(barcode.to_string(), product.clone()).await;
        Ok(product)
    }

    async fn fetch(&self, barcode: &str) -> Result<Value, LookupError> {
        let url = format!("{}/api/v0/product/{}.json", self.base_url, barcode);
        tracing::info!("Fetching product {} from {}", barcode, url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LookupError::Unavailable(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!("Product API returned error {} for {}", status, barcode);
            return Err(LookupError::Unavailable(format!(
                "HTTP {} error fetching product data",
                status.as_u16()
            )));
        }

        let mut data: Value = response.json().await.map_err(|e| {
            LookupError::Unavailable(format!("Failed to parse product response: {}", e))
        })?;

        if data.get("status").and_then(Value::as_i64) != Some(1) {
            tracing::info!("No product found for barcode {}", barcode);
            return Err(LookupError::NotFound(barcode.to_string()));
        }

        Ok(data
            .get_mut("product")
            .map(Value::take)
            .unwrap_or_else(|| Value::Object(Default::default())))
    }
}
