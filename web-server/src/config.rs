//! Configuration module

use std::env;

use timelytics_core::constants::DEFAULT_MODEL_PATH;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Model artifact (native `.json[.gz]` or `.onnx[.gz]`)
    pub model_path: String,

    /// Expected SHA-256 of the artifact; falls back to the `.sha256` sidecar
    pub model_sha256: Option<String>,

    /// Emit JSON log lines instead of the human format
    pub log_json: bool,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            model_path: DEFAULT_MODEL_PATH.to_string(),
            model_sha256: None,
            log_json: false,
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: env::var("TIMELYTICS_HOST").unwrap_or(defaults.host),

            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),

            model_path: env::var("MODEL_PATH").unwrap_or(defaults.model_path),

            model_sha256: env::var("MODEL_SHA256")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),

            log_json: env::var("LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(defaults.log_json),

            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
