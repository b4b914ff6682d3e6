use crate::domain::Decimal;
use crate::engine::PricingConfig;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub pricing_api_url: String,
    pub pricing_api_key: String,
    pub sign_api_url: String,
    pub sign_api_key: String,
    pub max_uplift_p_per_kwh: Option<Decimal>,
    pub default_uplift_p_per_kwh: Option<Decimal>,
    pub http_timeout_secs: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = require(&env_map, "DATABASE_PATH")?;
        let pricing_api_url = require(&env_map, "PRICING_API_URL")?;
        let pricing_api_key = require(&env_map, "PRICING_API_KEY")?;
        let sign_api_url = require(&env_map, "SIGN_API_URL")?;
        let sign_api_key = require(&env_map, "SIGN_API_KEY")?;

        let max_uplift_p_per_kwh = optional_decimal(&env_map, "MAX_UPLIFT_P_PER_KWH")?;
        let default_uplift_p_per_kwh = optional_decimal(&env_map, "DEFAULT_UPLIFT_P_PER_KWH")?;

        let http_timeout_secs = env_map
            .get("HTTP_TIMEOUT_SECS")
            .map(|s| s.as_str())
            .unwrap_or("30")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "HTTP_TIMEOUT_SECS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        Ok(Config {
            port,
            database_path,
            pricing_api_url,
            pricing_api_key,
            sign_api_url,
            sign_api_key,
            max_uplift_p_per_kwh,
            default_uplift_p_per_kwh,
            http_timeout_secs,
        })
    }

    /// The explicit pricing configuration handed to the pricer.
    pub fn pricing_config(&self) -> PricingConfig {
        PricingConfig {
            max_uplift_p_per_kwh: self.max_uplift_p_per_kwh,
            default_uplift_p_per_kwh: self.default_uplift_p_per_kwh,
        }
    }

    /// Bounded timeout for all outbound HTTP calls.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn require(env_map: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    env_map
        .get(key)
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnv(key.to_string()))
}

fn optional_decimal(
    env_map: &HashMap<String, String>,
    key: &str,
) -> Result<Option<Decimal>, ConfigError> {
    env_map
        .get(key)
        .map(|s| {
            Decimal::from_str_canonical(s.trim()).map_err(|_| {
                ConfigError::InvalidValue(key.to_string(), "must be a decimal number".to_string())
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("DATABASE_PATH".to_string(), "/tmp/test.db".to_string());
        map.insert(
            "PRICING_API_URL".to_string(),
            "https://pricing.example.com".to_string(),
        );
        map.insert("PRICING_API_KEY".to_string(), "pk-test".to_string());
        map.insert(
            "SIGN_API_URL".to_string(),
            "https://sign.example.com".to_string(),
        );
        map.insert("SIGN_API_KEY".to_string(), "sk-test".to_string());
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.http_timeout_secs, 30);
        assert_eq!(config.max_uplift_p_per_kwh, None);
        assert_eq!(config.default_uplift_p_per_kwh, None);
    }

    #[test]
    fn test_missing_required_keys() {
        for key in [
            "DATABASE_PATH",
            "PRICING_API_URL",
            "PRICING_API_KEY",
            "SIGN_API_URL",
            "SIGN_API_KEY",
        ] {
            let mut env_map = setup_required_env();
            env_map.remove(key);
            match Config::from_env_map(env_map) {
                Err(ConfigError::MissingEnv(k)) => assert_eq!(k, key),
                other => panic!("Expected MissingEnv for {}, got {:?}", key, other.err()),
            }
        }
    }

    #[test]
    fn test_invalid_port() {
        let mut env_map = setup_required_env();
        env_map.insert("PORT".to_string(), "not_a_number".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_uplift_bounds_parse_as_decimals() {
        let mut env_map = setup_required_env();
        env_map.insert("MAX_UPLIFT_P_PER_KWH".to_string(), "2.5".to_string());
        env_map.insert("DEFAULT_UPLIFT_P_PER_KWH".to_string(), "1.0".to_string());

        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(
            config.max_uplift_p_per_kwh.unwrap().to_canonical_string(),
            "2.5"
        );
        assert_eq!(
            config
                .default_uplift_p_per_kwh
                .unwrap()
                .to_canonical_string(),
            "1"
        );

        let pricing = config.pricing_config();
        assert_eq!(pricing.max_uplift_p_per_kwh, config.max_uplift_p_per_kwh);
    }

    #[test]
    fn test_invalid_uplift_value() {
        let mut env_map = setup_required_env();
        env_map.insert("MAX_UPLIFT_P_PER_KWH".to_string(), "lots".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "MAX_UPLIFT_P_PER_KWH"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_timeout_is_bounded_duration() {
        let mut env_map = setup_required_env();
        env_map.insert("HTTP_TIMEOUT_SECS".to_string(), "10".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.http_timeout(), Duration::from_secs(10));
    }
}
