use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::assessment::domain::Material;
use crate::assessment::explanation::ExplanationBackendKind;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub assessment: AssessmentConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            assessment: AssessmentConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Model artifact location and pipeline backend selection.
#[derive(Debug, Clone)]
pub struct AssessmentConfig {
    pub default_material: Material,
    pub model_dir: PathBuf,
    pub model_timestamps: BTreeMap<Material, String>,
    pub oracle_timeout: Duration,
    pub explanation_backend: ExplanationBackendKind,
    pub generative_command: Option<String>,
}

pub const DEFAULT_ALUMINUM_TIMESTAMP: &str = "20250919_005442";
pub const DEFAULT_COPPER_TIMESTAMP: &str = "20250919_025639";

impl AssessmentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let default_material = match env::var("LCA_MATERIAL") {
            Ok(raw) => raw
                .parse::<Material>()
                .map_err(|_| ConfigError::InvalidMaterial(raw))?,
            Err(_) => Material::Aluminum,
        };

        let model_dir = env::var("LCA_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("models"));

        let mut model_timestamps = BTreeMap::new();
        for material in Material::ALL {
            let key = format!("LCA_MODEL_TIMESTAMP_{}", material.as_str().to_ascii_uppercase());
            let timestamp = env::var(&key).unwrap_or_else(|_| match material {
                Material::Aluminum => DEFAULT_ALUMINUM_TIMESTAMP.to_string(),
                Material::Copper => DEFAULT_COPPER_TIMESTAMP.to_string(),
            });
            model_timestamps.insert(material, timestamp);
        }

        let oracle_timeout = env::var("ORACLE_TIMEOUT_MS")
            .unwrap_or_else(|_| "2000".to_string())
            .parse::<u64>()
            .ok()
            .filter(|millis| *millis > 0)
            .map(Duration::from_millis)
            .ok_or(ConfigError::InvalidOracleTimeout)?;

        let explanation_backend =
            match env::var("EXPLANATION_BACKEND") {
                Ok(raw) => ExplanationBackendKind::parse(&raw)
                    .ok_or(ConfigError::InvalidExplanationBackend(raw))?,
                Err(_) => ExplanationBackendKind::Templated,
            };

        let generative_command = env::var("GENERATIVE_COMMAND")
            .ok()
            .filter(|command| !command.trim().is_empty());

        if explanation_backend == ExplanationBackendKind::Generative
            && generative_command.is_none()
        {
            return Err(ConfigError::MissingGenerativeCommand);
        }

        Ok(Self {
            default_material,
            model_dir,
            model_timestamps,
            oracle_timeout,
            explanation_backend,
            generative_command,
        })
    }

    pub fn timestamp_for(&self, material: Material) -> &str {
        self.model_timestamps
            .get(&material)
            .map(String::as_str)
            .unwrap_or(match material {
                Material::Aluminum => DEFAULT_ALUMINUM_TIMESTAMP,
                Material::Copper => DEFAULT_COPPER_TIMESTAMP,
            })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidMaterial(String),
    InvalidOracleTimeout,
    InvalidExplanationBackend(String),
    MissingGenerativeCommand,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidMaterial(value) => {
                write!(f, "LCA_MATERIAL '{value}' is not a supported material")
            }
            ConfigError::InvalidOracleTimeout => {
                write!(f, "ORACLE_TIMEOUT_MS must be a positive integer")
            }
            ConfigError::InvalidExplanationBackend(value) => write!(
                f,
                "EXPLANATION_BACKEND '{value}' must be 'templated' or 'generative'"
            ),
            ConfigError::MissingGenerativeCommand => write!(
                f,
                "GENERATIVE_COMMAND is required when EXPLANATION_BACKEND=generative"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
