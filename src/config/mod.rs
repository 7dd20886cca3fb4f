//! Configuration management
//!
//! Configuration is loaded from:
//! - config.yml (optional, every key has a default)
//! - Environment variables (override file settings)
//!
//! Secrets (`PROVIDER_API_KEY`, `APP_PASSWORD`) are only ever read from the
//! environment and are never serialized back out.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Image provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Access control configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Generation limits
    #[serde(default)]
    pub generation: GenerationConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8501
}

/// Image provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API root, without the trailing `/images/generations`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier sent with each request
    #[serde(default = "default_model")]
    pub model: String,
    /// Timeout for each outbound HTTP request
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// API key, from `PROVIDER_API_KEY` only
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            timeout_seconds: default_timeout_seconds(),
            api_key: None,
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "dall-e-3".to_string()
}

fn default_timeout_seconds() -> u64 {
    120
}

/// Access control configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// SHA-256 hex digest of the access password, from `APP_PASSWORD` only
    #[serde(skip)]
    pub password_hash: Option<String>,
    /// Sessions are dropped after this long without a request
    #[serde(default = "default_session_idle_seconds")]
    pub session_idle_seconds: u64,
    /// Upper bound on live sessions held in memory
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            password_hash: None,
            session_idle_seconds: default_session_idle_seconds(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl AuthConfig {
    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_seconds)
    }
}

fn default_session_idle_seconds() -> u64 {
    24 * 60 * 60
}

fn default_max_sessions() -> u64 {
    10_000
}

/// Generation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Minimum interval between two generations in one session
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: default_cooldown_seconds(),
        }
    }
}

impl GenerationConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }
}

fn default_cooldown_seconds() -> u64 {
    10
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
}

impl Config {
    /// Load configuration from file
    ///
    /// A missing or empty file yields the defaults. A file that exists but is
    /// not valid YAML is an error carrying the line and column.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        Ok(config)
    }

    /// Load configuration from file, then apply environment variables
    ///
    /// Overrides follow the pattern `PROMPTCANVAS_<SECTION>_<KEY>`:
    /// - PROMPTCANVAS_SERVER_HOST
    /// - PROMPTCANVAS_SERVER_PORT
    /// - PROMPTCANVAS_PROVIDER_BASE_URL
    /// - PROMPTCANVAS_PROVIDER_MODEL
    /// - PROMPTCANVAS_PROVIDER_TIMEOUT_SECONDS
    /// - PROMPTCANVAS_AUTH_SESSION_IDLE_SECONDS
    /// - PROMPTCANVAS_GENERATION_COOLDOWN_SECONDS
    ///
    /// Secrets come from `PROVIDER_API_KEY` (or `OPENAI_API_KEY`) and
    /// `APP_PASSWORD`.
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("PROMPTCANVAS_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PROMPTCANVAS_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }

        if let Ok(base_url) = std::env::var("PROMPTCANVAS_PROVIDER_BASE_URL") {
            self.provider.base_url = base_url;
        }
        if let Ok(model) = std::env::var("PROMPTCANVAS_PROVIDER_MODEL") {
            self.provider.model = model;
        }
        if let Ok(timeout) = std::env::var("PROMPTCANVAS_PROVIDER_TIMEOUT_SECONDS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                self.provider.timeout_seconds = timeout;
            }
        }

        if let Ok(idle) = std::env::var("PROMPTCANVAS_AUTH_SESSION_IDLE_SECONDS") {
            if let Ok(idle) = idle.parse::<u64>() {
                self.auth.session_idle_seconds = idle;
            }
        }

        if let Ok(cooldown) = std::env::var("PROMPTCANVAS_GENERATION_COOLDOWN_SECONDS") {
            if let Ok(cooldown) = cooldown.parse::<u64>() {
                self.generation.cooldown_seconds = cooldown;
            }
        }

        self.provider.api_key = non_blank_env("PROVIDER_API_KEY")
            .or_else(|| non_blank_env("OPENAI_API_KEY"));
        self.auth.password_hash = non_blank_env("APP_PASSWORD");
    }
}

fn non_blank_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared by every test in this module that touches process environment.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_KEYS: &[&str] = &[
    "PROMPTCANVAS_SERVER_HOST",
    "PROMPTCANVAS_SERVER_PORT",
    "PROMPTCANVAS_PROVIDER_BASE_URL",
    "PROMPTCANVAS_PROVIDER_MODEL",
    "PROMPTCANVAS_PROVIDER_TIMEOUT_SECONDS",
    "PROMPTCANVAS_AUTH_SESSION_IDLE_SECONDS",
    "PROMPTCANVAS_GENERATION_COOLDOWN_SECONDS",
    "PROVIDER_API_KEY",
    "OPENAI_API_KEY",
    "APP_PASSWORD",
];

#[cfg(test)]
fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}
