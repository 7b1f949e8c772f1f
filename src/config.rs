use crate::error::{AppError, AppResult};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub url: UrlConfig,
    pub registry: RegistryConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UrlConfig {
    pub short_code_length: usize,
    pub base_url: String,
    pub default_validity_minutes: i64,
    pub short_code_max_attempts: u32,
    pub max_batch_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    pub sweep_interval_seconds: u64,
    pub geo_lookup_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub requests_per_minute: u64,
    pub burst_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| AppError::Configuration("Invalid SERVER_PORT".to_string()))?;

        let short_code_length = env::var("SHORT_CODE_LENGTH")
            .unwrap_or_else(|_| "6".to_string())
            .parse()
            .map_err(|_| AppError::Configuration("Invalid SHORT_CODE_LENGTH".to_string()))?;
        let base_url = env::var("BASE_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", server_host, server_port));
        let default_validity_minutes = env::var("DEFAULT_VALIDITY_MINUTES")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| {
                AppError::Configuration("Invalid DEFAULT_VALIDITY_MINUTES".to_string())
            })?;
        let short_code_max_attempts = env::var("SHORT_CODE_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| AppError::Configuration("Invalid SHORT_CODE_MAX_ATTEMPTS".to_string()))?;
        let max_batch_size = env::var("MAX_BATCH_SIZE")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .map_err(|_| AppError::Configuration("Invalid MAX_BATCH_SIZE".to_string()))?;

        let sweep_interval_seconds = env::var("SWEEP_INTERVAL_SECONDS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .map_err(|_| AppError::Configuration("Invalid SWEEP_INTERVAL_SECONDS".to_string()))?;
        let geo_lookup_enabled = env::var("GEO_LOOKUP_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .map_err(|_| AppError::Configuration("Invalid GEO_LOOKUP_ENABLED".to_string()))?;

        // Rate limit config
        let requests_per_minute = env::var("RATE_LIMIT_PER_MINUTE")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| AppError::Configuration("Invalid RATE_LIMIT_PER_MINUTE".to_string()))?;
        let burst_size = env::var("RATE_LIMIT_BURST")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map_err(|_| AppError::Configuration("Invalid RATE_LIMIT_BURST".to_string()))?;

        // CORS config
        let allowed_origins_str = env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let allowed_origins: Vec<String> = if allowed_origins_str == "*" {
            vec!["*".to_string()]
        } else {
            allowed_origins_str
                .split(',')
                .map(|s| s.trim().to_string())
                .collect()
        };

        let config = Config {
            server: ServerConfig {
                host: server_host,
                port: server_port,
            },
            url: UrlConfig {
                short_code_length,
                base_url,
                default_validity_minutes,
                short_code_max_attempts,
                max_batch_size,
            },
            registry: RegistryConfig {
                sweep_interval_seconds,
                geo_lookup_enabled,
            },
            rate_limit: RateLimitConfig {
                requests_per_minute,
                burst_size,
            },
            cors: CorsConfig { allowed_origins },
        };

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> AppResult<()> {
        // Validate URL settings
        if self.url.short_code_length < 4 || self.url.short_code_length > 10 {
            return Err(AppError::Configuration(
                "SHORT_CODE_LENGTH must be between 4 and 10".to_string(),
            ));
        }

        if self.url.default_validity_minutes < 1
            || self.url.default_validity_minutes > crate::validate::MAX_VALIDITY_MINUTES
        {
            return Err(AppError::Configuration(format!(
                "DEFAULT_VALIDITY_MINUTES must be between 1 and {}",
                crate::validate::MAX_VALIDITY_MINUTES
            )));
        }

        if self.url.short_code_max_attempts < 1 || self.url.short_code_max_attempts > 100 {
            return Err(AppError::Configuration(
                "SHORT_CODE_MAX_ATTEMPTS must be between 1 and 100".to_string(),
            ));
        }

        if self.url.max_batch_size == 0 {
            return Err(AppError::Configuration(
                "MAX_BATCH_SIZE must be greater than 0".to_string(),
            ));
        }

        if url::Url::parse(&self.url.base_url).is_err() {
            return Err(AppError::Configuration(
                "BASE_URL must be a valid URL".to_string(),
            ));
        }

        // Validate registry settings
        if self.registry.sweep_interval_seconds == 0 {
            return Err(AppError::Configuration(
                "SWEEP_INTERVAL_SECONDS must be greater than 0".to_string(),
            ));
        }

        // Validate rate limiting settings
        if self.rate_limit.requests_per_minute == 0 {
            return Err(AppError::Configuration(
                "RATE_LIMIT_PER_MINUTE must be greater than 0".to_string(),
            ));
        }

        // One request per millisecond is the finest period the limiter
        // supports
        if self.rate_limit.requests_per_minute > 60000 {
            return Err(AppError::Configuration(
                "RATE_LIMIT_PER_MINUTE must not exceed 60000".to_string(),
            ));
        }

        if self.rate_limit.burst_size == 0 {
            return Err(AppError::Configuration(
                "RATE_LIMIT_BURST must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            url: UrlConfig {
                short_code_length: 6,
                base_url: "http://localhost:3000".to_string(),
                default_validity_minutes: 30,
                short_code_max_attempts: 10,
                max_batch_size: 100,
            },
            registry: RegistryConfig {
                sweep_interval_seconds: 60,
                geo_lookup_enabled: false,
            },
            rate_limit: RateLimitConfig {
                requests_per_minute: 10,
                burst_size: 5,
            },
            cors: CorsConfig {
                allowed_origins: vec!["*".to_string()],
            },
        }
    }

    #[test]
    fn test_config_valid() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_config_rejects_bad_code_length() {
        let mut config = base_config();
        config.url.short_code_length = 3;
        assert!(config.validate().is_err());

        config.url.short_code_length = 11;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_zero_sweep_interval() {
        let mut config = base_config();
        config.registry.sweep_interval_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_bad_base_url() {
        let mut config = base_config();
        config.url.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_zero_rate_limit() {
        let mut config = base_config();
        config.rate_limit.requests_per_minute = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_rate_limit_above_limiter_resolution() {
        let mut config = base_config();
        config.rate_limit.requests_per_minute = 60000;
        assert!(config.validate().is_ok());

        config.rate_limit.requests_per_minute = 60001;
        assert!(config.validate().is_err());
    }
}
