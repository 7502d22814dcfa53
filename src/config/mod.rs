//! Configuration management
//!
//! Loads and saves configuration from XDG-compliant paths.
//! Config location: ~/.config/trail-scout/config.toml

pub mod defaults;

use crate::constants::api::DEFAULT_BASE_URL;
use crate::error::{Error, Result};
use defaults::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote trail service settings
    #[serde(default)]
    pub service: ServiceConfig,

    /// Query defaults and limits
    #[serde(default)]
    pub search: SearchConfig,

    /// Fetch orchestration settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Remote trail service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Locale passed as `lang` and `Accept-Language`
    #[serde(default = "default_locale")]
    pub locale: String,

    /// User-Agent header
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Results requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Sort order requested from the service
    #[serde(default = "default_sort")]
    pub sort: String,
}

/// Query defaults and limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_max_results")]
    pub default_max_results: usize,

    #[serde(default = "default_max_results_cap")]
    pub max_results_cap: usize,

    /// Used for the request bounding box when no radius is given
    #[serde(default = "default_radius_km")]
    pub default_radius_km: f64,

    #[serde(default = "default_max_radius_km")]
    pub max_radius_km: f64,

    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Also scrape each trail's detail page for statistics
    #[serde(default)]
    pub fetch_details: bool,
}

/// Fetch orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

// Default value functions for serde
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}
fn default_sort() -> String {
    DEFAULT_SORT.to_string()
}
fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}
fn default_max_results_cap() -> usize {
    DEFAULT_MAX_RESULTS_CAP
}
fn default_radius_km() -> f64 {
    DEFAULT_RADIUS_KM
}
fn default_max_radius_km() -> f64 {
    DEFAULT_MAX_RADIUS_KM
}
fn default_max_pages() -> u32 {
    DEFAULT_MAX_PAGES
}
fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}
fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}
fn default_retry_backoff_ms() -> u64 {
    DEFAULT_RETRY_BACKOFF_MS
}
fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            locale: default_locale(),
            user_agent: default_user_agent(),
            page_size: default_page_size(),
            sort: default_sort(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_max_results: default_max_results(),
            max_results_cap: default_max_results_cap(),
            default_radius_km: default_radius_km(),
            max_radius_km: default_max_radius_km(),
            max_pages: default_max_pages(),
            fetch_details: false,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl FetchConfig {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(APP_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default path
    ///
    /// Creates default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| {
                Error::Config(format!("Failed to read config file: {}", e))
            })?;

            let config: Config = toml::from_str(&content).map_err(|e| {
                Error::Config(format!("Failed to parse config file: {}", e))
            })?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            Error::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(&path, content).map_err(|e| {
            Error::Config(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.fetch.concurrency == 0 {
            return Err(Error::Config("fetch.concurrency must be at least 1".to_string()));
        }
        if self.service.page_size == 0
            || self.service.page_size > crate::constants::limits::MAX_PAGE_SIZE
        {
            return Err(Error::Config(format!(
                "service.page_size must be in 1..={}",
                crate::constants::limits::MAX_PAGE_SIZE
            )));
        }
        if self.search.max_results_cap == 0 {
            return Err(Error::Config("search.max_results_cap must be at least 1".to_string()));
        }
        if !(self.search.max_radius_km > 0.0) || !(self.search.default_radius_km > 0.0) {
            return Err(Error::Config("search radii must be positive".to_string()));
        }
        if self.search.max_pages == 0 {
            return Err(Error::Config("search.max_pages must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Get a configuration value by key path
    ///
    /// Key format: "section.key"
    /// Returns the value as a string, or None if not found
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["service", "base_url"] => Some(self.service.base_url.clone()),
            ["service", "locale"] => Some(self.service.locale.clone()),
            ["service", "user_agent"] => Some(self.service.user_agent.clone()),
            ["service", "page_size"] => Some(self.service.page_size.to_string()),
            ["service", "sort"] => Some(self.service.sort.clone()),

            ["search", "default_max_results"] => Some(self.search.default_max_results.to_string()),
            ["search", "max_results_cap"] => Some(self.search.max_results_cap.to_string()),
            ["search", "default_radius_km"] => Some(self.search.default_radius_km.to_string()),
            ["search", "max_radius_km"] => Some(self.search.max_radius_km.to_string()),
            ["search", "max_pages"] => Some(self.search.max_pages.to_string()),
            ["search", "fetch_details"] => Some(self.search.fetch_details.to_string()),

            ["fetch", "concurrency"] => Some(self.fetch.concurrency.to_string()),
            ["fetch", "max_retries"] => Some(self.fetch.max_retries.to_string()),
            ["fetch", "retry_backoff_ms"] => Some(self.fetch.retry_backoff_ms.to_string()),
            ["fetch", "request_timeout_secs"] => Some(self.fetch.request_timeout_secs.to_string()),

            ["server", "host"] => Some(self.server.host.clone()),
            ["server", "port"] => Some(self.server.port.to_string()),

            _ => None,
        }
    }

    /// Set a configuration value by key path
    ///
    /// Key format: "section.key"
    /// Returns error if key is invalid or value type is wrong
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["service", "base_url"] => {
                self.service.base_url = value.trim_end_matches('/').to_string();
            }
            ["service", "locale"] => self.service.locale = value.to_string(),
            ["service", "user_agent"] => self.service.user_agent = value.to_string(),
            ["service", "page_size"] => self.service.page_size = parse_value(key, value)?,
            ["service", "sort"] => self.service.sort = value.to_string(),

            ["search", "default_max_results"] => {
                self.search.default_max_results = parse_value(key, value)?;
            }
            ["search", "max_results_cap"] => self.search.max_results_cap = parse_value(key, value)?,
            ["search", "default_radius_km"] => {
                self.search.default_radius_km = parse_value(key, value)?;
            }
            ["search", "max_radius_km"] => self.search.max_radius_km = parse_value(key, value)?,
            ["search", "max_pages"] => self.search.max_pages = parse_value(key, value)?,
            ["search", "fetch_details"] => self.search.fetch_details = parse_value(key, value)?,

            ["fetch", "concurrency"] => self.fetch.concurrency = parse_value(key, value)?,
            ["fetch", "max_retries"] => self.fetch.max_retries = parse_value(key, value)?,
            ["fetch", "retry_backoff_ms"] => self.fetch.retry_backoff_ms = parse_value(key, value)?,
            ["fetch", "request_timeout_secs"] => {
                self.fetch.request_timeout_secs = parse_value(key, value)?;
            }

            ["server", "host"] => self.server.host = value.to_string(),
            ["server", "port"] => self.server.port = parse_value(key, value)?,

            _ => {
                return Err(Error::Config(format!("Unknown config key: {}", key)));
            }
        }

        self.validate()
    }

    /// List all available config keys
    pub fn available_keys() -> Vec<&'static str> {
        vec![
            "service.base_url",
            "service.locale",
            "service.user_agent",
            "service.page_size",
            "service.sort",
            "search.default_max_results",
            "search.max_results_cap",
            "search.default_radius_km",
            "search.max_radius_km",
            "search.max_pages",
            "search.fetch_details",
            "fetch.concurrency",
            "fetch.max_retries",
            "fetch.retry_backoff_ms",
            "fetch.request_timeout_secs",
            "server.host",
            "server.port",
        ]
    }

    /// Get server address as "host:port"
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("Invalid value for {}: {}", key, value)))
}
