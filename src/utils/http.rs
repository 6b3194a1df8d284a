//! HTTP client shared by the provider clients.

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Identifies this crate to the provider APIs, as both ask callers to do.
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Timeout on each provider call; the retry executor treats it like a
/// network failure.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin wrapper tying the crate's user agent and timeouts to one shared
/// connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client: Arc::new(client),
        }
    }

    /// Get the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_names_this_crate() {
        assert!(USER_AGENT.starts_with("bibsearch/"));
    }
}
