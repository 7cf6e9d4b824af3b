use std::collections::HashMap;
use std::env;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub bind_address: String,
    pub jwt_secret: String,
    pub token_ttl_minutes: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidEnvVar(String, String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = vars
            .get("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?
            .clone();

        let redis_url = vars
            .get("REDIS_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("REDIS_URL".to_string()))?
            .clone();

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());

        let jwt_secret = vars
            .get("JWT_SECRET")
            .ok_or_else(|| ConfigError::MissingEnvVar("JWT_SECRET".to_string()))?
            .clone();

        if jwt_secret.is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "JWT_SECRET".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let token_ttl_minutes = vars
            .get("TOKEN_TTL_MINUTES")
            .ok_or_else(|| ConfigError::MissingEnvVar("TOKEN_TTL_MINUTES".to_string()))?
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("TOKEN_TTL_MINUTES".to_string(), e.to_string())
            })?;

        Ok(Config {
            database_url,
            redis_url,
            bind_address,
            jwt_secret,
            token_ttl_minutes,
        })
    }

    /// Token lifetime as a duration. Doubles as the blacklist TTL on
    /// revocation, which caps it at the longest a live token can still
    /// be valid.
    pub fn token_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.token_ttl_minutes * 60)
    }
}
