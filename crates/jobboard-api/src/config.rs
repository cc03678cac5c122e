//! API configuration.

use std::fmt;

use thiserror::Error;

/// Origins of the hosted and local web front-ends.
const DEFAULT_CORS_ORIGINS: [&str; 4] = [
    "http://localhost:5173",
    "http://localhost:5174",
    "https://job-hunter-9f79e.web.app",
    "https://job-hunter-9f79e.firebaseapp.com",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ACCESS_TOKEN_SECRET must be set to sign session tokens")]
    MissingSecret,

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Which document store backs the repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

impl StoreBackend {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid {
                name: "STORE_BACKEND",
                value: value.to_string(),
            }),
        }
    }
}

/// API server configuration.
#[derive(Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// HS256 secret for session tokens
    pub access_token_secret: String,
    /// Serve Prometheus metrics at /metrics
    pub metrics_enabled: bool,
    pub store_backend: StoreBackend,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("cors_origins", &self.cors_origins)
            .field("max_body_size", &self.max_body_size)
            .field("environment", &self.environment)
            .field("access_token_secret", &"<redacted>")
            .field("metrics_enabled", &self.metrics_enabled)
            .field("store_backend", &self.store_backend)
            .finish()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
            max_body_size: 1024 * 1024, // 1MB
            environment: "development".to_string(),
            access_token_secret: String::new(),
            metrics_enabled: true,
            store_backend: StoreBackend::Firestore,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let access_token_secret = std::env::var("ACCESS_TOKEN_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingSecret)?;

        let store_backend = match std::env::var("STORE_BACKEND") {
            Ok(value) => StoreBackend::parse(&value)?,
            Err(_) => defaults.store_backend,
        };

        Ok(Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .or_else(|_| std::env::var("API_PORT"))
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            access_token_secret,
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
            store_backend,
        })
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 9] = [
        "ACCESS_TOKEN_SECRET",
        "API_HOST",
        "PORT",
        "API_PORT",
        "CORS_ORIGINS",
        "MAX_BODY_SIZE",
        "ENVIRONMENT",
        "METRICS_ENABLED",
        "STORE_BACKEND",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_missing_secret_is_fatal() {
        clear_env();
        assert!(matches!(ApiConfig::from_env(), Err(ConfigError::MissingSecret)));

        std::env::set_var("ACCESS_TOKEN_SECRET", "   ");
        assert!(matches!(ApiConfig::from_env(), Err(ConfigError::MissingSecret)));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        std::env::set_var("ACCESS_TOKEN_SECRET", "s3cret");

        let config = ApiConfig::from_env().unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.store_backend, StoreBackend::Firestore);
        assert!(config.cors_origins.contains(&"http://localhost:5173".to_string()));
        assert!(!config.is_production());
        assert!(!format!("{:?}", config).contains("s3cret"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        std::env::set_var("ACCESS_TOKEN_SECRET", "s3cret");
        std::env::set_var("API_PORT", "8080");
        std::env::set_var("PORT", "9090");
        std::env::set_var("CORS_ORIGINS", "https://a.test, https://b.test,");
        std::env::set_var("ENVIRONMENT", "Production");
        std::env::set_var("STORE_BACKEND", "memory");

        let config = ApiConfig::from_env().unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.cors_origins, vec!["https://a.test", "https://b.test"]);
        assert!(config.is_production());
        assert_eq!(config.store_backend, StoreBackend::Memory);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_unknown_backend_rejected() {
        clear_env();
        std::env::set_var("ACCESS_TOKEN_SECRET", "s3cret");
        std::env::set_var("STORE_BACKEND", "mongodb");
        assert!(matches!(
            ApiConfig::from_env(),
            Err(ConfigError::Invalid { name: "STORE_BACKEND", .. })
        ));
        clear_env();
    }
}
