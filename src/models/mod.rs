//! Core data structures shared across providers.

mod paper;
mod search;

pub use paper::{Paper, PaperBuilder, SourceType};
pub use search::{
    parse_publication_date, DateRange, ProviderFailure, SearchQuery, SearchResponse, SortBy,
    SortOrder, UnifiedSearchResponse, UnifiedSortMode,
};
