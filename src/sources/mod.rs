//! Provider clients with a trait-based architecture.
//!
//! This module defines the [`Source`] trait that both bibliographic providers
//! implement, plus the shared error taxonomy. New providers can be added by
//! implementing the trait and registering them with the
//! [`SourceRegistry`](registry::SourceRegistry).

mod arxiv;
pub mod mock;
mod registry;
mod semantic;

pub use arxiv::ArxivSource;
pub use mock::MockSource;
pub use registry::{SourceCapabilities, SourceRegistry};
pub use semantic::SemanticScholarSource;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::models::{Paper, SearchQuery, SearchResponse, SourceType};

/// Interface implemented by every bibliographic provider client.
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this provider (e.g. "arxiv")
    fn id(&self) -> &str;

    /// Human-readable name of this provider
    fn name(&self) -> &str;

    /// The provider's normalized source type
    fn source_type(&self) -> SourceType;

    /// Describe the capabilities of this provider
    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH
    }

    /// Search for papers matching the query
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SourceError>;

    /// Fetch a single paper by its provider-specific id.
    ///
    /// A provider "not found" response yields `Ok(None)`, not an error.
    async fn get_by_id(&self, id: &str) -> Result<Option<Paper>, SourceError>;
}

/// Errors surfaced by provider clients.
///
/// Every variant carries the provider name so messages reaching the caller
/// identify where the failure happened.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The request did not complete within the configured timeout
    #[error("{source_name} API request timeout")]
    Timeout { source_name: &'static str },

    /// Provider returned a 5xx status
    #[error("{source_name} API error: {status} - server error")]
    Server {
        source_name: &'static str,
        status: u16,
    },

    /// Provider returned 429
    #[error("{source_name} API rate limit exceeded. Please try again later.")]
    RateLimited { source_name: &'static str },

    /// Provider returned a non-429 4xx status
    #[error("{source_name} API error: {status} - {message}")]
    Client {
        source_name: &'static str,
        status: u16,
        message: String,
    },

    /// No response at all (DNS failure, connection refused, ...)
    #[error("{source_name} API network error: {message}")]
    Network {
        source_name: &'static str,
        message: String,
    },

    /// The response body could not be parsed into the expected shape
    #[error("Failed to parse {source_name} response: {message}")]
    Parse {
        source_name: &'static str,
        message: String,
    },

    /// Caller-side validation failure, never sent upstream
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl SourceError {
    /// Classify a transport-level failure from reqwest.
    pub fn from_transport(source_name: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout { source_name }
        } else {
            SourceError::Network {
                source_name,
                message: err.to_string(),
            }
        }
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(source_name: &'static str, status: StatusCode) -> Self {
        if status == StatusCode::TOO_MANY_REQUESTS {
            SourceError::RateLimited { source_name }
        } else if status.is_server_error() {
            SourceError::Server {
                source_name,
                status: status.as_u16(),
            }
        } else {
            SourceError::Client {
                source_name,
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string(),
            }
        }
    }

    /// Whether the retry executor may re-attempt after this error.
    ///
    /// Timeouts, 5xx and connection failures are always transient; 429 is
    /// transient only for providers that opt in (`retry_on_rate_limit`).
    pub fn is_transient(&self, retry_on_rate_limit: bool) -> bool {
        match self {
            SourceError::Timeout { .. }
            | SourceError::Server { .. }
            | SourceError::Network { .. } => true,
            SourceError::RateLimited { .. } => retry_on_rate_limit,
            SourceError::Client { .. }
            | SourceError::Parse { .. }
            | SourceError::InvalidRequest(_) => false,
        }
    }
}
