//! Configuration management
//!
//! This module handles loading and parsing configuration for the C-News portal.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Remote content API configuration
    #[serde(default)]
    pub api: ApiConfig,
    /// Response cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Session cookie configuration
    #[serde(default)]
    pub session: SessionConfig,
    /// Theme configuration
    #[serde(default)]
    pub theme: ThemeConfig,
    /// Site defaults used when the API has no settings
    #[serde(default)]
    pub site: SiteConfig,
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
    3000
}

/// Remote content API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST API, e.g. `https://admin.ilkin.site/api/`
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
    /// User-Agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Scheme used in the Authorization header (`Token <key>`)
    #[serde(default = "default_auth_scheme")]
    pub auth_scheme: String,
    /// Page size the API uses for paginated lists
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            timeout_secs: default_api_timeout(),
            user_agent: default_user_agent(),
            auth_scheme: default_auth_scheme(),
            page_size: default_page_size(),
        }
    }
}

impl ApiConfig {
    /// Base URL guaranteed to end with a slash so relative paths join under it
    pub fn normalized_base_url(&self) -> String {
        let trimmed = self.base_url.trim();
        if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{}/", trimmed)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_api_base_url() -> String {
    "https://admin.ilkin.site/api/".to_string()
}

fn default_api_timeout() -> u64 {
    15
}

fn default_user_agent() -> String {
    format!("C-News/{}", env!("CARGO_PKG_VERSION"))
}

fn default_auth_scheme() -> String {
    "Token".to_string()
}

fn default_page_size() -> u32 {
    10
}

/// Response cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached responses
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
    /// TTL for article lists and article details
    #[serde(default = "default_articles_ttl")]
    pub articles_ttl_seconds: u64,
    /// TTL for categories, tags and site settings
    #[serde(default = "default_taxonomy_ttl")]
    pub taxonomy_ttl_seconds: u64,
    /// TTL for comment threads
    #[serde(default = "default_comments_ttl")]
    pub comments_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_max_capacity(),
            articles_ttl_seconds: default_articles_ttl(),
            taxonomy_ttl_seconds: default_taxonomy_ttl(),
            comments_ttl_seconds: default_comments_ttl(),
        }
    }
}

fn default_max_capacity() -> u64 {
    10_000
}

fn default_articles_ttl() -> u64 {
    300
}

fn default_taxonomy_ttl() -> u64 {
    3600
}

fn default_comments_ttl() -> u64 {
    60
}

/// Session cookie configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Cookie name carrying the session id
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Idle lifetime of a session in seconds
    #[serde(default = "default_session_max_age")]
    pub max_age_seconds: u64,
    /// Add the `Secure` attribute to the cookie
    #[serde(default)]
    pub secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            max_age_seconds: default_session_max_age(),
            secure: false,
        }
    }
}

fn default_cookie_name() -> String {
    "cnews_session".to_string()
}

fn default_session_max_age() -> u64 {
    7 * 24 * 60 * 60
}

/// Theme configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Directory whose templates override the embedded ones
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Site defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_name")]
    pub name: String,
    #[serde(default = "default_site_description")]
    pub description: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            description: default_site_description(),
        }
    }
}

fn default_site_name() -> String {
    "C-News".to_string()
}

fn default_site_description() -> String {
    "Your source for the latest news and interesting articles".to_string()
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

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - CNEWS_SERVER_HOST
    /// - CNEWS_SERVER_PORT
    /// - CNEWS_API_BASE_URL
    /// - CNEWS_API_TIMEOUT_SECS
    /// - CNEWS_CACHE_ARTICLES_TTL_SECONDS
    /// - CNEWS_CACHE_TAXONOMY_TTL_SECONDS
    /// - CNEWS_SESSION_SECURE
    /// - CNEWS_THEME_PATH
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("CNEWS_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("CNEWS_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }

        if let Ok(base_url) = std::env::var("CNEWS_API_BASE_URL") {
            self.api.base_url = base_url;
        }
        if let Ok(timeout) = std::env::var("CNEWS_API_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                self.api.timeout_secs = timeout;
            }
        }

        if let Ok(ttl) = std::env::var("CNEWS_CACHE_ARTICLES_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.cache.articles_ttl_seconds = ttl;
            }
        }
        if let Ok(ttl) = std::env::var("CNEWS_CACHE_TAXONOMY_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.cache.taxonomy_ttl_seconds = ttl;
            }
        }

        if let Ok(secure) = std::env::var("CNEWS_SESSION_SECURE") {
            match secure.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.session.secure = true,
                "0" | "false" | "no" => self.session.secure = false,
                _ => {} // Ignore invalid values
            }
        }

        if let Ok(path) = std::env::var("CNEWS_THEME_PATH") {
            self.theme.path = Some(PathBuf::from(path));
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

// Shared mutex for config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const ENV_VARS: &[&str] = &[
        "CNEWS_SERVER_HOST",
        "CNEWS_SERVER_PORT",
        "CNEWS_API_BASE_URL",
        "CNEWS_API_TIMEOUT_SECS",
        "CNEWS_CACHE_ARTICLES_TTL_SECONDS",
        "CNEWS_CACHE_TAXONOMY_TTL_SECONDS",
        "CNEWS_SESSION_SECURE",
        "CNEWS_THEME_PATH",
    ];

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        super::CONFIG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = std::path::Path::new("nonexistent_config.yml");
        let config = Config::load(path).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.api.base_url, "https://admin.ilkin.site/api/");
        assert_eq!(config.api.auth_scheme, "Token");
        assert_eq!(config.cache.articles_ttl_seconds, 300);
        assert_eq!(config.cache.taxonomy_ttl_seconds, 3600);
        assert_eq!(config.session.cookie_name, "cnews_session");
        assert!(!config.session.secure);
        assert!(config.theme.path.is_none());
        assert_eq!(config.site.name, "C-News");
    }

    #[test]
    fn test_load_empty_file_returns_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.api.page_size, 10);
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "api:\n  base_url: \"http://localhost:8000/api\"\n").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.api.base_url, "http://localhost:8000/api");
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.cache.comments_ttl_seconds, 60);
    }

    #[test]
    fn test_load_full_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"
server:
  host: "127.0.0.1"
  port: 9000
api:
  base_url: "https://news.example.com/api/"
  timeout_secs: 5
  auth_scheme: "Bearer"
  page_size: 20
cache:
  articles_ttl_seconds: 60
  taxonomy_ttl_seconds: 120
session:
  cookie_name: "sid"
  secure: true
theme:
  path: "my_theme"
site:
  name: "Daily"
"#).unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.api.base_url, "https://news.example.com/api/");
        assert_eq!(config.api.timeout(), Duration::from_secs(5));
        assert_eq!(config.api.auth_scheme, "Bearer");
        assert_eq!(config.api.page_size, 20);
        assert_eq!(config.cache.articles_ttl_seconds, 60);
        assert_eq!(config.cache.taxonomy_ttl_seconds, 120);
        assert_eq!(config.session.cookie_name, "sid");
        assert!(config.session.secure);
        assert_eq!(config.theme.path, Some(PathBuf::from("my_theme")));
        assert_eq!(config.site.name, "Daily");
        assert_eq!(config.site.description, default_site_description());
    }

    #[test]
    fn test_load_invalid_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: not_a_number\n").unwrap();

        let err = Config::load(file.path()).unwrap_err().to_string();

        assert!(err.contains("parse"));
        assert!(err.contains("line"));
    }

    #[test]
    fn test_load_malformed_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  host: [invalid yaml").unwrap();

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_normalized_base_url_appends_slash() {
        let mut api = ApiConfig::default();
        api.base_url = " http://localhost:8000/api ".to_string();
        assert_eq!(api.normalized_base_url(), "http://localhost:8000/api/");

        api.base_url = "http://localhost:8000/api/".to_string();
        assert_eq!(api.normalized_base_url(), "http://localhost:8000/api/");
    }

    #[test]
    fn test_env_override_server_and_api() {
        let _guard = lock_env();
        clear_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 8080\n").unwrap();

        std::env::set_var("CNEWS_SERVER_HOST", "192.168.1.1");
        std::env::set_var("CNEWS_SERVER_PORT", "4000");
        std::env::set_var("CNEWS_API_BASE_URL", "http://api.local/");
        std::env::set_var("CNEWS_API_TIMEOUT_SECS", "3");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.server.host, "192.168.1.1");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.api.base_url, "http://api.local/");
        assert_eq!(config.api.timeout_secs, 3);

        clear_env();
    }

    #[test]
    fn test_env_override_cache_session_theme() {
        let _guard = lock_env();
        clear_env();

        std::env::set_var("CNEWS_CACHE_ARTICLES_TTL_SECONDS", "30");
        std::env::set_var("CNEWS_CACHE_TAXONOMY_TTL_SECONDS", "90");
        std::env::set_var("CNEWS_SESSION_SECURE", "true");
        std::env::set_var("CNEWS_THEME_PATH", "/srv/theme");

        let config = Config::load_with_env(std::path::Path::new("missing.yml")).unwrap();

        assert_eq!(config.cache.articles_ttl_seconds, 30);
        assert_eq!(config.cache.taxonomy_ttl_seconds, 90);
        assert!(config.session.secure);
        assert_eq!(config.theme.path, Some(PathBuf::from("/srv/theme")));

        clear_env();
    }

    #[test]
    fn test_env_override_invalid_values_ignored() {
        let _guard = lock_env();
        clear_env();

        std::env::set_var("CNEWS_SERVER_PORT", "not_a_port");
        std::env::set_var("CNEWS_API_TIMEOUT_SECS", "-1");
        std::env::set_var("CNEWS_SESSION_SECURE", "maybe");

        let config = Config::load_with_env(std::path::Path::new("missing.yml")).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.api.timeout_secs, 15);
        assert!(!config.session.secure);

        clear_env();
    }
}
