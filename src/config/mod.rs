//! Configuration management.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::RetryConfig;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Provider API endpoints
    #[serde(default)]
    pub endpoints: Endpoints,

    /// API keys for various services
    #[serde(default)]
    pub api_keys: ApiKeys,

    /// Rate limiting settings
    #[serde(default)]
    pub rate_limits: RateLimitConfig,

    /// Retry and backoff settings
    #[serde(default)]
    pub retry: RetrySettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            api_keys: ApiKeys::default(),
            rate_limits: RateLimitConfig::default(),
            retry: RetrySettings::default(),
        }
    }
}

impl Config {
    /// Retry policy built from the configured settings
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::default()
            .max_attempts(self.retry.max_attempts)
            .base_delay(Duration::from_millis(self.retry.base_delay_ms))
    }
}

/// Provider API base URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoints {
    /// arXiv Atom query endpoint
    #[serde(default = "default_arxiv_endpoint")]
    pub arxiv: String,

    /// Semantic Scholar Graph API base URL
    #[serde(default = "default_semantic_endpoint")]
    pub semantic_scholar: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            arxiv: default_arxiv_endpoint(),
            semantic_scholar: default_semantic_endpoint(),
        }
    }
}

fn default_arxiv_endpoint() -> String {
    "http://export.arxiv.org/api/query".to_string()
}

fn default_semantic_endpoint() -> String {
    "https://api.semanticscholar.org/graph/v1".to_string()
}

/// API keys for external services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeys {
    /// Semantic Scholar API key (optional, for higher rate limits)
    #[serde(default)]
    pub semantic_scholar: Option<String>,
}

impl Default for ApiKeys {
    fn default() -> Self {
        Self {
            semantic_scholar: std::env::var("SEMANTIC_SCHOLAR_API_KEY").ok(),
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Request budget for Semantic Scholar within one window
    #[serde(default = "default_s2_max_requests")]
    pub semantic_scholar_max_requests: u32,

    /// Length of the Semantic Scholar rate window in seconds
    #[serde(default = "default_s2_window_secs")]
    pub semantic_scholar_window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            semantic_scholar_max_requests: default_s2_max_requests(),
            semantic_scholar_window_secs: default_s2_window_secs(),
        }
    }
}

fn default_s2_max_requests() -> u32 {
    100
}

fn default_s2_window_secs() -> u64 {
    300
}

/// Retry and exponential backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts per request, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff base delay in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

/// Load configuration from a file
pub fn load_config(path: &PathBuf) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path.as_path()))
        .add_source(config::Environment::with_prefix("BIBSEARCH"))
        .build()?;

    settings.try_deserialize()
}

/// Get the default configuration (from env vars or defaults)
pub fn get_config() -> Config {
    Config::default()
}
