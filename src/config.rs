//! Configuration loading and constants.
//!
//! Process settings (listen address, page labels, log format) come from a TOML
//! file. The backend address is never read from that file: it comes from the
//! `BACK_BASE_URL` and `BACK_BASE_PORT` environment variables, both required.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

// =============================================================================
// HTTP Response Cache Control
// =============================================================================

/// The page reflects live controller state and must never be cached
pub const CACHE_CONTROL_PAGE: &str = "no-store";

/// Static assets (CSS) - long cache
pub const CACHE_CONTROL_STATIC: &str = "public, max-age=86400";

// =============================================================================
// Backend Environment
// =============================================================================

/// Environment variable holding the backend host (address segment of the URL)
pub const ENV_BACK_BASE_URL: &str = "BACK_BASE_URL";

/// Environment variable holding the backend port
pub const ENV_BACK_BASE_PORT: &str = "BACK_BASE_PORT";

/// Path requested on the backend
pub const HEALTHZ_PATH: &str = "/api/healthz";

// =============================================================================
// Page Text
// =============================================================================

/// Result text before the first check
pub const RESULT_PLACEHOLDER: &str = "未実行";

/// Result text while a check is in flight
pub const RESULT_IN_PROGRESS: &str = "通信中...";

pub const DEFAULT_HEADING: &str = "サンプルトップページ（ユーザ画面）";

pub const DEFAULT_BUTTON_LABEL: &str = "バックエンドへアクセス";

// =============================================================================
// Default Paths and Strings
// =============================================================================

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Directory for static files
pub const STATIC_DIR: &str = "static";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "healthz_console=debug,tower_http=debug";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration
    pub http: HttpServerConfig,
    #[serde(default)]
    pub ui: UiConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
    /// How long in-flight connections may drain after SIGTERM/SIGINT
    #[serde(default = "HttpServerConfig::default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
}

impl HttpServerConfig {
    fn default_shutdown_grace() -> u64 {
        30
    }

    /// Parse host and port into a bindable address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                ConfigError::Validation(format!(
                    "invalid http.host or http.port ({}:{}): {}",
                    self.host, self.port, e
                ))
            })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UiConfig {
    #[serde(default = "UiConfig::default_heading")]
    pub heading: String,
    #[serde(default = "UiConfig::default_button_label")]
    pub button_label: String,
    /// Browser refresh interval while a check is pending
    #[serde(default = "UiConfig::default_pending_refresh")]
    pub pending_refresh_seconds: u64,
    /// Version string, populated at runtime
    #[serde(skip_deserializing, default = "UiConfig::default_version")]
    pub version: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            heading: Self::default_heading(),
            button_label: Self::default_button_label(),
            pending_refresh_seconds: Self::default_pending_refresh(),
            version: Self::default_version(),
        }
    }
}

impl UiConfig {
    fn default_heading() -> String {
        DEFAULT_HEADING.to_string()
    }

    fn default_button_label() -> String {
        DEFAULT_BUTTON_LABEL.to_string()
    }

    fn default_pending_refresh() -> u64 {
        1
    }

    fn default_version() -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    fn default_format() -> String {
        DEFAULT_LOG_FORMAT.to_string()
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;

        config.http.socket_addr()?;

        if config.ui.pending_refresh_seconds == 0 {
            return Err(ConfigError::Validation(
                "ui.pending_refresh_seconds must be at least 1".to_string(),
            ));
        }

        match config.logging.format.to_ascii_lowercase().as_str() {
            "text" | "json" => {}
            other => {
                return Err(ConfigError::Validation(format!(
                    "logging.format must be \"text\" or \"json\", got \"{}\"",
                    other
                )))
            }
        }

        Ok(config)
    }
}

/// Address of the backend whose health endpoint the page checks.
///
/// Both fields hold the raw environment values. Blank values are rejected at
/// construction, so a `BackendConfig` that exists is always usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    host: String,
    port: String,
}

impl BackendConfig {
    /// Build from explicit values, rejecting blank ones.
    pub fn new(host: impl Into<String>, port: impl Into<String>) -> Result<Self, ConfigError> {
        let host = require_value(ENV_BACK_BASE_URL, Some(host.into()))?;
        let port = require_value(ENV_BACK_BASE_PORT, Some(port.into()))?;
        Ok(Self { host, port })
    }

    /// Read `BACK_BASE_URL` and `BACK_BASE_PORT` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read both values through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = require_value(ENV_BACK_BASE_URL, lookup(ENV_BACK_BASE_URL))?;
        let port = require_value(ENV_BACK_BASE_PORT, lookup(ENV_BACK_BASE_PORT))?;
        Ok(Self { host, port })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    /// `http://{host}:{port}/api/healthz`, with no encoding or syntax checks.
    pub fn healthz_url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, HEALTHZ_PATH)
    }
}

fn require_value(name: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnv(name)),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
    #[error("required environment variable is not set: {0}")]
    MissingEnv(&'static str),
}
