//! Process configuration read from the environment

use std::time::Duration;

use company_domain::company::{ServiceConfig, DEFAULT_STREAM};
use company_mongo::MongoSettings;
use thiserror::Error;

/// Configuration errors, raised once at startup
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Everything the binary needs to wire the service
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mongo: MongoSettings,
    pub kafka_broker: String,
    pub publish_timeout: Duration,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub service: ServiceConfig,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Read the configuration from process environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a variable is set to a value that
    /// cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary lookup function
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let defaults = MongoSettings::default();

        let mongo = MongoSettings {
            uri: get("MONGO_URI", &defaults.uri),
            database: get("MONGO_DATABASE", &defaults.database),
            collection: get("MONGO_COLLECTION", &defaults.collection),
        };

        let port_raw = get("API_PORT", "8080");
        let port = port_raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
            key: "API_PORT",
            value: port_raw.clone(),
            reason: "expected a port number",
        })?;

        let timeout_raw = get("PUBLISH_TIMEOUT_MS", "5000");
        let timeout_ms = timeout_raw
            .parse::<u64>()
            .ok()
            .filter(|ms| *ms > 0)
            .ok_or_else(|| ConfigError::Invalid {
                key: "PUBLISH_TIMEOUT_MS",
                value: timeout_raw.clone(),
                reason: "expected a positive number of milliseconds",
            })?;

        let log_raw = get("LOG_FORMAT", "text");
        let log_format = match log_raw.to_ascii_lowercase().as_str() {
            "text" | "pretty" => LogFormat::Text,
            "json" => LogFormat::Json,
            _ => {
                return Err(ConfigError::Invalid {
                    key: "LOG_FORMAT",
                    value: log_raw,
                    reason: "expected 'text' or 'json'",
                })
            }
        };

        let service = ServiceConfig {
            stream_name: get("COMPANY_EVENTS_STREAM", DEFAULT_STREAM),
            enforce_unique_names: parse_bool("ENFORCE_UNIQUE_NAMES", &get("ENFORCE_UNIQUE_NAMES", "true"))?,
            emit_events: parse_bool("EMIT_EVENTS", &get("EMIT_EVENTS", "true"))?,
        };

        Ok(Self {
            mongo,
            kafka_broker: get("KAFKA_BROKER", "localhost:9092"),
            publish_timeout: Duration::from_millis(timeout_ms),
            jwt_secret: get("JWT_SECRET", "your_secret_key"),
            host: get("API_HOST", "0.0.0.0"),
            port,
            service,
            log_format,
        })
    }

    /// `host:port` the HTTP server listens on
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "expected a boolean",
        }),
    }
}
