//! Configuration management for Momentum
//!
//! Handles environment variables and application settings.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};
use url::Url;

const DEFAULT_SECRET: &str = "change-me-in-production";

/// Default endpoint for the AI completion provider
pub const DEFAULT_AI_BASE_URL: &str = "https://api.anthropic.com/v1/messages";

/// Default model for the AI completion provider
pub const DEFAULT_AI_MODEL: &str = "claude-3-5-haiku-20241022";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Database URL
    pub database_url: String,

    /// Secret used to sign session tokens
    pub session_secret: String,

    /// Environment (development, production)
    pub environment: String,

    /// Log level
    pub log_level: String,

    /// Directory holding the built front-end bundle
    pub frontend_dir: PathBuf,

    /// Data directory for SQLite database
    pub data_dir: PathBuf,

    /// CORS origins (empty means allow all)
    pub cors_origins: Vec<String>,

    /// Session lifetime in hours
    pub session_ttl_hours: u64,

    /// Request timeout in seconds
    pub request_timeout: u64,

    /// API key for the AI completion provider; AI is disabled when unset
    pub ai_api_key: Option<String>,

    /// AI provider endpoint
    pub ai_base_url: String,

    /// AI model name
    pub ai_model: String,

    /// Maximum tokens per AI completion
    pub ai_max_tokens: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: "sqlite:momentum.db".to_string(),
            session_secret: DEFAULT_SECRET.to_string(),
            environment: "development".to_string(),
            log_level: "info".to_string(),
            frontend_dir: PathBuf::from("./frontend"),
            data_dir: PathBuf::from("./data"),
            cors_origins: vec![],
            session_ttl_hours: 720,
            request_timeout: 30,
            ai_api_key: None,
            ai_base_url: DEFAULT_AI_BASE_URL.to_string(),
            ai_model: DEFAULT_AI_MODEL.to_string(),
            ai_max_tokens: 512,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Server configuration
        if let Ok(host) = env::var("MOMENTUM_HOST") {
            config.host = host;
        }

        if let Ok(port) = env::var("MOMENTUM_PORT") {
            config.port = port.parse().map_err(|_| ConfigError::InvalidPort(port))?;
        }

        // Database configuration
        if let Ok(database_url) = env::var("MOMENTUM_DATABASE_URL") {
            config.database_url = database_url;
        }

        if let Ok(data_dir) = env::var("MOMENTUM_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        // Authentication
        if let Ok(secret) = env::var("MOMENTUM_SECRET") {
            config.session_secret = secret;
        }

        if let Ok(ttl) = env::var("MOMENTUM_SESSION_TTL_HOURS") {
            config.session_ttl_hours = ttl
                .parse()
                .map_err(|_| ConfigError::InvalidSessionTtl(ttl))?;
        }

        if let Ok(environment) = env::var("MOMENTUM_ENVIRONMENT") {
            config.environment = environment;
        }

        if let Ok(log_level) = env::var("MOMENTUM_LOG_LEVEL") {
            config.log_level = log_level;
        }

        if let Ok(frontend_dir) = env::var("MOMENTUM_FRONTEND_DIR") {
            config.frontend_dir = PathBuf::from(frontend_dir);
        }

        if let Ok(cors_origins) = env::var("MOMENTUM_CORS_ORIGINS") {
            config.cors_origins = cors_origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(timeout) = env::var("MOMENTUM_REQUEST_TIMEOUT") {
            config.request_timeout = timeout
                .parse()
                .map_err(|_| ConfigError::InvalidRequestTimeout(timeout))?;
        }

        // AI provider
        if let Ok(key) = env::var("MOMENTUM_AI_API_KEY") {
            if !key.trim().is_empty() {
                config.ai_api_key = Some(key);
            }
        }

        if let Ok(base_url) = env::var("MOMENTUM_AI_BASE_URL") {
            config.ai_base_url = base_url;
        }

        if let Ok(model) = env::var("MOMENTUM_AI_MODEL") {
            config.ai_model = model;
        }

        if let Ok(max_tokens) = env::var("MOMENTUM_AI_MAX_TOKENS") {
            config.ai_max_tokens = max_tokens
                .parse()
                .map_err(|_| ConfigError::InvalidAiMaxTokens(max_tokens))?;
        }

        config.validate()?;

        Ok(config)
    }

    /// Configuration used by tests: in-memory database and a fixed secret
    pub fn for_test() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            session_secret: "test-secret-that-is-long-enough".to_string(),
            environment: "test".to_string(),
            ..Self::default()
        }
    }

    /// Validate configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        if self.session_secret == DEFAULT_SECRET && self.is_production() {
            return Err(ConfigError::InsecureProductionSecret);
        }

        if self.session_secret.len() < 16 {
            return Err(ConfigError::SessionSecretTooShort);
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port.to_string()));
        }

        if self.database_url.is_empty() {
            return Err(ConfigError::EmptyDatabaseUrl);
        }

        if !self.database_url.starts_with("sqlite:") {
            return Err(ConfigError::UnsupportedDatabase(self.mask_database_url()));
        }

        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDataDir);
        }

        if self.session_ttl_hours == 0 {
            return Err(ConfigError::InvalidSessionTtl(self.session_ttl_hours.to_string()));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::InvalidRequestTimeout(self.request_timeout.to_string()));
        }

        let url = Url::parse(&self.ai_base_url)
            .map_err(|_| ConfigError::InvalidAiBaseUrl(self.ai_base_url.clone()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidAiBaseUrl(self.ai_base_url.clone()));
        }

        if self.ai_max_tokens == 0 || self.ai_max_tokens > 4096 {
            return Err(ConfigError::InvalidAiMaxTokens(self.ai_max_tokens.to_string()));
        }

        Ok(())
    }

    /// Get server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in production mode
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Whether session cookies should carry the `Secure` attribute
    pub fn secure_cookies(&self) -> bool {
        self.is_production()
    }

    /// Whether an AI provider has been configured
    pub fn ai_enabled(&self) -> bool {
        self.ai_api_key.is_some()
    }

    /// Create data directory if it doesn't exist
    pub fn ensure_data_dir(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_dir)
            .map_err(|e| ConfigError::DataDirCreationFailed(e.to_string()))?;
        Ok(())
    }

    /// Resolve the effective database URL. Relative SQLite file paths are
    /// placed inside the data directory; in-memory URLs are left untouched.
    pub fn resolved_database_url(&self) -> String {
        match self.database_path() {
            Some(path) => format!("sqlite:{}", path.display()),
            None => self.database_url.clone(),
        }
    }

    /// Get full database path if using SQLite file
    pub fn database_path(&self) -> Option<PathBuf> {
        let path = self.database_url.strip_prefix("sqlite:")?;
        let path = path.trim_start_matches("//");
        if path.is_empty() || path.starts_with(":memory:") {
            return None;
        }

        let path = PathBuf::from(path);
        if path.is_relative() {
            Some(self.data_dir.join(path))
        } else {
            Some(path)
        }
    }

    /// Log configuration (excluding sensitive data)
    pub fn log_config(&self) {
        info!("Configuration loaded:");
        info!("  Environment: {}", self.environment);
        info!("  Bind address: {}", self.bind_address());
        info!("  Database URL: {}", self.mask_database_url());
        info!("  Data directory: {:?}", self.data_dir);
        info!("  Frontend directory: {:?}", self.frontend_dir);
        info!("  Log level: {}", self.log_level);
        info!("  CORS origins: {:?}", self.cors_origins);
        info!("  Session TTL: {}h", self.session_ttl_hours);
        info!("  Request timeout: {}s", self.request_timeout);
        info!(
            "  AI provider: {}",
            if self.ai_enabled() { self.ai_model.as_str() } else { "disabled" }
        );

        if self.session_secret == DEFAULT_SECRET {
            warn!("Using default session secret - CHANGE IN PRODUCTION!");
        }
    }

    /// Mask database URL for logging
    fn mask_database_url(&self) -> String {
        if self.database_url.starts_with("sqlite:") {
            self.database_url.clone()
        } else if let Some((scheme, _)) = self.database_url.split_once("://") {
            format!("{}://***", scheme)
        } else {
            "***".to_string()
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port: {0}")]
    InvalidPort(String),

    #[error("Invalid session TTL: {0}")]
    InvalidSessionTtl(String),

    #[error("Invalid request timeout: {0}")]
    InvalidRequestTimeout(String),

    #[error("Invalid AI base URL: {0}")]
    InvalidAiBaseUrl(String),

    #[error("Invalid AI max tokens: {0} (must be 1-4096)")]
    InvalidAiMaxTokens(String),

    #[error("Insecure session secret for production environment")]
    InsecureProductionSecret,

    #[error("Session secret too short (minimum 16 characters)")]
    SessionSecretTooShort,

    #[error("Empty database URL")]
    EmptyDatabaseUrl,

    #[error("Unsupported database URL: {0} (only sqlite: URLs are supported)")]
    UnsupportedDatabase(String),

    #[error("Empty data directory")]
    EmptyDataDir,

    #[error("Data directory creation failed: {0}")]
    DataDirCreationFailed(String),
}
