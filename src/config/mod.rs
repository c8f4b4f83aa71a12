//! Configuration management
//!
//! This module handles loading and parsing configuration for the woispace client.
//! Configuration can be loaded from:
//! - woispace.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API configuration
    #[serde(default)]
    pub api: ApiConfig,
    /// Session and navigation routes
    #[serde(default)]
    pub auth: AuthConfig,
    /// Query cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Enrollment flow behaviour
    #[serde(default)]
    pub flow: FlowConfig,
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the platform backend, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// URL fragments whose 404 responses are expected and not logged as errors
    #[serde(default = "default_quiet_not_found")]
    pub quiet_not_found: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
            quiet_not_found: default_quiet_not_found(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("woispace/{}", env!("CARGO_PKG_VERSION"))
}

fn default_quiet_not_found() -> Vec<String> {
    vec![
        "/versions/current".to_string(),
        "/versions/published".to_string(),
        "/progress".to_string(),
        "/public/".to_string(),
    ]
}

/// Session and navigation routes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Route the user is sent to when the session cannot be refreshed
    #[serde(default = "default_login_route")]
    pub login_route: String,
    /// Fallback route after completing a flow whose chapter is unknown
    #[serde(default = "default_home_route")]
    pub home_route: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_route: default_login_route(),
            home_route: default_home_route(),
        }
    }
}

fn default_login_route() -> String {
    "/login".to_string()
}

fn default_home_route() -> String {
    "/home".to_string()
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache driver (memory or none)
    #[serde(default)]
    pub driver: CacheDriver,
    /// Maximum number of cached responses
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
    /// Upper bound on any cached entry's TTL, in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            driver: CacheDriver::default(),
            max_capacity: default_max_capacity(),
            ttl_seconds: default_ttl(),
        }
    }
}

fn default_max_capacity() -> u64 {
    10_000
}

fn default_ttl() -> u64 {
    3600
}

/// Cache driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheDriver {
    /// In-memory cache (default)
    #[default]
    Memory,
    /// No caching; every read goes to the remote service
    None,
}

/// Enrollment flow behaviour
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Which stored answer of a type counts as the current one
    #[serde(default)]
    pub answer_selection: AnswerSelection,
}

/// Policy for picking the current answer when several of a type exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnswerSelection {
    /// First answer returned by the server
    #[default]
    First,
    /// Most recently created answer
    Latest,
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
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
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

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - WOISPACE_API_BASE_URL
    /// - WOISPACE_API_TIMEOUT_SECONDS
    /// - WOISPACE_API_USER_AGENT
    /// - WOISPACE_AUTH_LOGIN_ROUTE
    /// - WOISPACE_AUTH_HOME_ROUTE
    /// - WOISPACE_CACHE_DRIVER
    /// - WOISPACE_CACHE_MAX_CAPACITY
    /// - WOISPACE_CACHE_TTL_SECONDS
    /// - WOISPACE_FLOW_ANSWER_SELECTION
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot reject on its own
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.api.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "api.base_url must start with http:// or https://, got '{}'",
                self.api.base_url
            )));
        }
        if self.api.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "api.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        // API configuration
        if let Ok(base_url) = std::env::var("WOISPACE_API_BASE_URL") {
            self.api.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Ok(timeout) = std::env::var("WOISPACE_API_TIMEOUT_SECONDS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                self.api.timeout_seconds = timeout;
            }
        }
        if let Ok(user_agent) = std::env::var("WOISPACE_API_USER_AGENT") {
            self.api.user_agent = user_agent;
        }

        // Routes
        if let Ok(route) = std::env::var("WOISPACE_AUTH_LOGIN_ROUTE") {
            self.auth.login_route = route;
        }
        if let Ok(route) = std::env::var("WOISPACE_AUTH_HOME_ROUTE") {
            self.auth.home_route = route;
        }

        // Cache configuration
        if let Ok(driver) = std::env::var("WOISPACE_CACHE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "memory" => self.cache.driver = CacheDriver::Memory,
                "none" => self.cache.driver = CacheDriver::None,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(capacity) = std::env::var("WOISPACE_CACHE_MAX_CAPACITY") {
            if let Ok(capacity) = capacity.parse::<u64>() {
                self.cache.max_capacity = capacity;
            }
        }
        if let Ok(ttl) = std::env::var("WOISPACE_CACHE_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.cache.ttl_seconds = ttl;
            }
        }

        // Flow behaviour
        if let Ok(selection) = std::env::var("WOISPACE_FLOW_ANSWER_SELECTION") {
            match selection.to_lowercase().as_str() {
                "first" => self.flow.answer_selection = AnswerSelection::First,
                "latest" => self.flow.answer_selection = AnswerSelection::Latest,
                _ => {}
            }
        }
    }
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

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
