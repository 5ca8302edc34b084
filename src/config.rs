pub const DEFAULT_PRODUCT_API_BASE_URL: &str = "https://world.openfoodfacts.org";
pub const DEFAULT_MODEL_PATH: &str = "model/health_score_model.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub model_path: String,
    /// Expected hex SHA-256 of the model file; unchecked when absent.
    pub model_sha256: Option<String>,
    pub product_api_base_url: String,
    pub product_api_timeout_secs: u64,
    pub product_cache_ttl_secs: u64,
    pub product_cache_capacity: u64,
    /// Sustained requests per second allowed per client IP.
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            model_path: DEFAULT_MODEL_PATH.to_string(),
            model_sha256: None,
            product_api_base_url: DEFAULT_PRODUCT_API_BASE_URL.to_string(),
            product_api_timeout_secs: 10,
            product_cache_ttl_secs: 3600,
            product_cache_capacity: 10_000,
            rate_limit_per_second: 10,
            rate_limit_burst: 20,
        }
    }
}

impl Config {
    /// Milliseconds between quota replenishments for the rate limiter.
    ///
    /// The governor counts one request back per interval, so the sustained
    /// rate is the inverse of this value. Rates above 1000/s floor at 1 ms.
    pub fn rate_limit_interval_ms(&self) -> u64 {
        (1000 / self.rate_limit_per_second.max(1)).max(1)
    }

    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| defaults.port.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            model_path: std::env::var("MODEL_PATH")
                .unwrap_or(defaults.model_path)
                .trim()
                .to_string(),
            model_sha256: std::env::var("MODEL_SHA256")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|digest| {
                    let digest = digest.trim().to_string();
                    if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                        anyhow::bail!("MODEL_SHA256 must be a 64-character hex digest");
                    }
                    Ok(digest)
                })
                .transpose()?,
            product_api_base_url: std::env::var("PRODUCT_API_BASE_URL")
                .unwrap_or(defaults.product_api_base_url)
                .trim()
                .trim_end_matches('/')
                .to_string(),
            product_api_timeout_secs: parse_positive(
                "PRODUCT_API_TIMEOUT_SECS",
                defaults.product_api_timeout_secs,
            )?,
            product_cache_ttl_secs: parse_positive(
                "PRODUCT_CACHE_TTL_SECS",
                defaults.product_cache_ttl_secs,
            )?,
            product_cache_capacity: parse_positive(
                "PRODUCT_CACHE_CAPACITY",
                defaults.product_cache_capacity,
            )?,
            rate_limit_per_second: parse_positive(
                "RATE_LIMIT_PER_SECOND",
                defaults.rate_limit_per_second,
            )?,
            rate_limit_burst: parse_positive("RATE_LIMIT_BURST", defaults.rate_limit_burst)?,
        };

        if config.model_path.is_empty() {
            anyhow::bail!("MODEL_PATH cannot be empty");
        }
        if !config.product_api_base_url.starts_with("http://")
            && !config.product_api_base_url.starts_with("https://")
        {
            anyhow::bail!("PRODUCT_API_BASE_URL must start with http:// or https://");
        }

        tracing::debug!("Model path: {}", config.model_path);
        tracing::debug!("Product API base URL: {}", config.product_api_base_url);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

/// Reads an optional numeric variable that must be greater than zero.
fn parse_positive<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr + PartialOrd + Default + Copy,
{
    let Ok(raw) = std::env::var(name) else {
        return Ok(default);
    };

    let value: T = raw
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{} must be a positive number", name))?;
    if value <= T::default() {
        anyhow::bail!("{} must be greater than zero", name);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.product_api_timeout_secs, 10);
        assert_eq!(config.product_api_base_url, DEFAULT_PRODUCT_API_BASE_URL);
        assert!(config.model_sha256.is_none());
    }

    #[test]
    fn test_rate_limit_interval_is_inverse_of_rate() {
        let mut config = Config::default();
        assert_eq!(config.rate_limit_interval_ms(), 100);

        config.rate_limit_per_second = 1;
        assert_eq!(config.rate_limit_interval_ms(), 1000);

        config.rate_limit_per_second = 5000;
        assert_eq!(config.rate_limit_interval_ms(), 1);
    }

    #[test]
    fn test_parse_positive_uses_default_when_unset() {
        let value: u64 = parse_positive("NUTRISCORE_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }
}
