//! Search request and response models.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Paper;

/// Sort order for search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Sort field for a single-provider search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    Relevance,
    Date,
}

/// Search query parameters.
///
/// Built once per logical search and passed by reference into the provider
/// clients; never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Main search query string
    pub query: String,

    /// Maximum number of results to return (providers cap this at 100)
    pub limit: usize,

    /// Pagination offset
    pub offset: usize,

    /// Sort by field
    pub sort_by: SortBy,

    /// Sort order
    pub sort_order: SortOrder,

    /// Year filter (single year or range like "2018-2022")
    pub year: Option<String>,

    /// Publication venue filter (Semantic Scholar)
    pub venue: Option<String>,

    /// Fields-of-study filter (Semantic Scholar)
    pub fields_of_study: Vec<String>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            limit: 10,
            offset: 0,
            sort_by: SortBy::Relevance,
            sort_order: SortOrder::Descending,
            year: None,
            venue: None,
            fields_of_study: Vec::new(),
        }
    }
}

impl SearchQuery {
    /// Create a new search query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set maximum results
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set pagination offset
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Set sort by
    pub fn sort_by(mut self, sort: SortBy) -> Self {
        self.sort_by = sort;
        self
    }

    /// Set sort order
    pub fn sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = order;
        self
    }

    /// Set year filter
    pub fn year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    /// Set venue filter
    pub fn venue(mut self, venue: impl Into<String>) -> Self {
        self.venue = Some(venue.into());
        self
    }

    /// Set fields-of-study filter
    pub fn fields_of_study(mut self, fields: Vec<String>) -> Self {
        self.fields_of_study = fields;
        self
    }

    /// The result limit clamped to what the providers accept
    pub fn bounded_limit(&self) -> usize {
        self.limit.clamp(1, 100)
    }
}

/// Search response from a single provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Normalized papers
    pub papers: Vec<Paper>,

    /// Total number of matches reported by the provider
    pub total_results: usize,

    /// Offset of the first returned result
    pub offset: usize,

    /// Number of results in this page as reported by the provider
    pub items_per_page: usize,
}

/// A provider that failed during a unified search, with the reason
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderFailure {
    /// Provider name ("arXiv", "Semantic Scholar")
    pub source: String,

    /// Human-readable failure message
    pub message: String,
}

/// Sort mode for merged unified-search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnifiedSortMode {
    /// Keep each provider's own relevance order
    Relevance,
    /// Newest publication date first
    Date,
    /// Citation count descending
    Citations,
}

/// Inclusive publication-date window for unified-search filtering
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// A range with only a lower bound
    pub fn from(date: NaiveDate) -> Self {
        Self {
            from: Some(date),
            to: None,
        }
    }

    /// Whether the range constrains anything at all
    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Check a parsed publication date against the window
    pub fn contains(&self, date: NaiveDate) -> bool {
        if let Some(from) = self.from {
            if date < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if date > to {
                return false;
            }
        }
        true
    }
}

/// Merged result of a unified multi-source search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnifiedSearchResponse {
    /// Merged, sorted, truncated papers
    pub results: Vec<Paper>,

    /// Combined post-filter result count before truncation
    pub total: usize,

    /// Providers that failed, with reasons; empty when all succeeded
    pub errors: Vec<ProviderFailure>,
}

/// Parse a provider-reported publication date.
///
/// Providers report RFC 3339 timestamps (arXiv), bare dates, or bare years
/// (Semantic Scholar).
pub fn parse_publication_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|ndt| Utc.from_utc_datetime(&ndt));
    }
    if let Ok(year) = raw.trim().parse::<i32>() {
        return NaiveDate::from_ymd_opt(year, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|ndt| Utc.from_utc_datetime(&ndt));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builder() {
        let query = SearchQuery::new("deep learning")
            .limit(25)
            .offset(50)
            .sort_by(SortBy::Date)
            .year("2020-2022")
            .venue("NeurIPS");

        assert_eq!(query.query, "deep learning");
        assert_eq!(query.limit, 25);
        assert_eq!(query.offset, 50);
        assert_eq!(query.sort_by, SortBy::Date);
        assert_eq!(query.venue.as_deref(), Some("NeurIPS"));
    }

    #[test]
    fn test_bounded_limit() {
        assert_eq!(SearchQuery::new("q").limit(0).bounded_limit(), 1);
        assert_eq!(SearchQuery::new("q").limit(10).bounded_limit(), 10);
        assert_eq!(SearchQuery::new("q").limit(500).bounded_limit(), 100);
    }

    #[test]
    fn test_parse_publication_date_formats() {
        assert!(parse_publication_date("2023-01-15T10:00:00Z").is_some());
        assert!(parse_publication_date("2023-06-15").is_some());
        assert!(parse_publication_date("2023").is_some());
        assert!(parse_publication_date("not a date").is_none());
        assert!(parse_publication_date("").is_none());
    }

    #[test]
    fn test_date_range_contains() {
        let from = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let range = DateRange {
            from: Some(from),
            to: Some(to),
        };

        assert!(range.contains(NaiveDate::from_ymd_opt(2023, 6, 15).unwrap()));
        assert!(range.contains(from));
        assert!(range.contains(to));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
    }

    #[test]
    fn test_date_range_unbounded() {
        assert!(DateRange::default().is_unbounded());
        assert!(!DateRange::from(NaiveDate::from_ymd_opt(2022, 1, 1).unwrap()).is_unbounded());
    }
}
