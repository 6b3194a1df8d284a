//! # bibsearch
//!
//! A resilient client layer for searching academic papers across multiple
//! bibliographic APIs (arXiv and Semantic Scholar), with unified result
//! merging.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Paper, SearchQuery, etc.)
//! - [`sources`]: Provider clients with a trait-based plugin architecture
//! - [`unified`]: Cross-provider search orchestration
//! - [`utils`]: HTTP client, rate limiting, and retry machinery
//! - [`config`]: Configuration management

pub mod config;
pub mod models;
pub mod sources;
pub mod unified;
pub mod utils;

// Re-export commonly used types
pub use models::Paper;
pub use sources::{Source, SourceRegistry};
pub use unified::{UnifiedSearchRequest, UnifiedSearcher};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
