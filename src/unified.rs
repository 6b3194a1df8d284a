//! Cross-provider search orchestration.
//!
//! Fans one query out to several providers concurrently, merges what comes
//! back, and degrades gracefully: a failing provider contributes an error
//! entry instead of sinking the whole search.

use std::cmp::Reverse;
use std::sync::Arc;

use futures_util::future::join_all;

use crate::models::{
    parse_publication_date, DateRange, Paper, ProviderFailure, SearchQuery, SortBy, SourceType,
    UnifiedSearchResponse, UnifiedSortMode,
};
use crate::sources::{Source, SourceRegistry};

/// Parameters for one unified search.
#[derive(Debug, Clone)]
pub struct UnifiedSearchRequest {
    pub query: String,
    /// Total result cap across all providers
    pub limit: usize,
    pub date_range: DateRange,
    pub sort: UnifiedSortMode,
}

impl UnifiedSearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: 10,
            date_range: DateRange::default(),
            sort: UnifiedSortMode::Relevance,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn date_range(mut self, range: DateRange) -> Self {
        self.date_range = range;
        self
    }

    pub fn sort(mut self, sort: UnifiedSortMode) -> Self {
        self.sort = sort;
        self
    }

    fn bounded_limit(&self) -> usize {
        self.limit.clamp(1, 100)
    }
}

/// Orchestrator that searches a fixed set of providers in parallel.
#[derive(Debug, Clone)]
pub struct UnifiedSearcher {
    sources: Vec<Arc<dyn Source>>,
}

impl UnifiedSearcher {
    /// Build a searcher over an explicit set of providers
    pub fn new(sources: Vec<Arc<dyn Source>>) -> Self {
        Self { sources }
    }

    /// Build a searcher over every searchable provider in the registry
    pub fn from_registry(registry: &SourceRegistry) -> Self {
        Self {
            sources: registry.searchable().into_iter().cloned().collect(),
        }
    }

    /// Run the search across all providers.
    ///
    /// The per-provider quota is the ceiling of `limit / providers`, so the
    /// combined pool always has at least `limit` candidates when every
    /// provider can fill its share. Provider failures are collected into
    /// `errors`; the merged result reflects whichever providers answered.
    pub async fn search(&self, request: &UnifiedSearchRequest) -> UnifiedSearchResponse {
        if self.sources.is_empty() {
            return UnifiedSearchResponse {
                results: Vec::new(),
                total: 0,
                errors: Vec::new(),
            };
        }

        let limit = request.bounded_limit();
        let per_source = limit.div_ceil(self.sources.len());
        // A date-sorted merge must also fetch date-sorted candidates, or the
        // providers would hand back their most relevant N instead of their
        // newest N.
        let provider_sort = match request.sort {
            UnifiedSortMode::Date => SortBy::Date,
            UnifiedSortMode::Relevance | UnifiedSortMode::Citations => SortBy::Relevance,
        };
        let query = SearchQuery::new(request.query.clone())
            .limit(per_source)
            .sort_by(provider_sort);

        let futures = self.sources.iter().map(|source| {
            let source = Arc::clone(source);
            let query = query.clone();
            async move {
                let name = source.name().to_string();
                (name, source.search(&query).await)
            }
        });

        let mut papers: Vec<Paper> = Vec::new();
        let mut errors: Vec<ProviderFailure> = Vec::new();

        for (name, outcome) in join_all(futures).await {
            match outcome {
                Ok(response) => papers.extend(response.papers),
                Err(error) => {
                    tracing::warn!(provider = %name, %error, "provider search failed");
                    errors.push(ProviderFailure {
                        source: name,
                        message: error.to_string(),
                    });
                }
            }
        }

        let mut results = filter_by_date(papers, &request.date_range);
        sort_results(&mut results, request.sort);

        let total = results.len();
        results.truncate(limit);

        UnifiedSearchResponse {
            results,
            total,
            errors,
        }
    }
}

/// Drop papers outside the requested date range.
///
/// Papers without a parseable date are kept for arXiv (its feed dates are
/// synthesized when absent, so this is rare) but dropped for Semantic
/// Scholar, whose records frequently omit dates and would otherwise flood a
/// date-filtered search with unverifiable entries.
fn filter_by_date(papers: Vec<Paper>, range: &DateRange) -> Vec<Paper> {
    if range.is_unbounded() {
        return papers;
    }

    papers
        .into_iter()
        .filter(|paper| {
            match paper
                .publication_date
                .as_deref()
                .and_then(parse_publication_date)
            {
                Some(date) => range.contains(date.date_naive()),
                None => paper.source != SourceType::SemanticScholar,
            }
        })
        .collect()
}

fn sort_results(papers: &mut [Paper], sort: UnifiedSortMode) {
    match sort {
        // Providers already return relevance order; keep their interleaving.
        UnifiedSortMode::Relevance => {}
        UnifiedSortMode::Date => {
            papers.sort_by_key(|paper| {
                let timestamp = paper
                    .publication_date
                    .as_deref()
                    .and_then(parse_publication_date)
                    .map(|d| d.timestamp())
                    .unwrap_or(i64::MIN);
                Reverse(timestamp)
            });
        }
        UnifiedSortMode::Citations => {
            papers.sort_by_key(|paper| Reverse(paper.citation_count.unwrap_or(0)));
        }
    }
}
