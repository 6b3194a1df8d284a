//! Semantic Scholar provider client (Graph REST API).

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::models::{Paper, PaperBuilder, SearchQuery, SearchResponse, SourceType};
use crate::sources::{Source, SourceCapabilities, SourceError};
use crate::utils::{with_retry, HttpClient, RateLimiter, RetryConfig};

/// Default base URL for the Semantic Scholar Graph API
const SEMANTIC_API_BASE: &str = "https://api.semanticscholar.org/graph/v1";

const SOURCE_NAME: &str = "Semantic Scholar";

/// Request quota without an API key: 100 requests per 5 minutes.
const RATE_LIMIT_MAX_REQUESTS: u32 = 100;
const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Field selection sent with every request
const DEFAULT_FIELDS: &[&str] = &[
    "paperId",
    "title",
    "authors",
    "abstract",
    "year",
    "venue",
    "citationCount",
    "referenceCount",
    "influentialCitationCount",
    "isOpenAccess",
    "openAccessPdf",
    "fieldsOfStudy",
    "publicationDate",
    "externalIds",
    "url",
];

/// Semantic Scholar provider client.
///
/// One instance owns the process-wide token bucket for the provider's quota,
/// so all logical searches against Semantic Scholar share a single budget.
/// 429 responses are retried with backoff on top of the limiter.
#[derive(Debug, Clone)]
pub struct SemanticScholarSource {
    client: Arc<HttpClient>,
    base_url: String,
    api_key: Option<String>,
    limiter: Arc<RateLimiter>,
    retry: RetryConfig,
}

impl SemanticScholarSource {
    /// Create a client against the public Graph API
    pub fn new() -> Self {
        Self::with_base_url(SEMANTIC_API_BASE)
    }

    /// Create a client against a custom endpoint (used by tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Arc::new(HttpClient::new()),
            base_url: base_url.into(),
            api_key: std::env::var("SEMANTIC_SCHOLAR_API_KEY").ok(),
            limiter: Arc::new(RateLimiter::new(RATE_LIMIT_MAX_REQUESTS, RATE_LIMIT_WINDOW)),
            retry: RetryConfig::default().retry_on_rate_limit(true),
        }
    }

    /// Create a client from application configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            client: Arc::new(HttpClient::new()),
            base_url: config.endpoints.semantic_scholar.clone(),
            api_key: config.api_keys.semantic_scholar.clone(),
            limiter: Arc::new(RateLimiter::new(
                config.rate_limits.semantic_scholar_max_requests,
                Duration::from_secs(config.rate_limits.semantic_scholar_window_secs),
            )),
            retry: config.retry_config().retry_on_rate_limit(true),
        }
    }

    /// Override the retry policy (used by tests to shrink delays)
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry.retry_on_rate_limit(true);
        self
    }

    fn build_search_url(&self, query: &SearchQuery) -> String {
        let mut url = format!(
            "{}/paper/search?query={}&limit={}&offset={}&fields={}",
            self.base_url,
            urlencoding::encode(&query.query),
            query.bounded_limit(),
            query.offset,
            DEFAULT_FIELDS.join(",")
        );

        if let Some(year) = &query.year {
            url.push_str(&format!("&year={}", urlencoding::encode(year)));
        }
        if let Some(venue) = &query.venue {
            url.push_str(&format!("&venue={}", urlencoding::encode(venue)));
        }
        if !query.fields_of_study.is_empty() {
            url.push_str(&format!(
                "&fieldsOfStudy={}",
                urlencoding::encode(&query.fields_of_study.join(","))
            ));
        }

        url
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self.client.client().get(url);
        match &self.api_key {
            Some(key) => builder.header("x-api-key", key),
            None => builder,
        }
    }

    /// GET a `/paper/{id}` endpoint, mapping 404 to `None`.
    async fn fetch_paper(&self, path_id: &str) -> Result<Option<Paper>, SourceError> {
        if path_id.trim().is_empty() {
            return Err(SourceError::InvalidRequest(
                "paper id must not be empty".to_string(),
            ));
        }

        self.limiter.acquire().await;

        let url = format!(
            "{}/paper/{}?fields={}",
            self.base_url,
            urlencoding::encode(path_id),
            DEFAULT_FIELDS.join(",")
        );

        let this = self.clone();
        let raw = with_retry(self.retry, || {
            let this = this.clone();
            let url = url.clone();
            async move {
                let response = this
                    .request(&url)
                    .send()
                    .await
                    .map_err(|e| SourceError::from_transport(SOURCE_NAME, e))?;

                let status = response.status();
                if status == StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                if !status.is_success() {
                    return Err(SourceError::from_status(SOURCE_NAME, status));
                }

                let paper: S2Paper =
                    response.json().await.map_err(|e| SourceError::Parse {
                        source_name: SOURCE_NAME,
                        message: e.to_string(),
                    })?;
                Ok(Some(paper))
            }
        })
        .await?;

        raw.map(|p| Self::parse_paper(&p)).transpose()
    }

    /// Fetch a paper by an external identifier such as `DOI:10.1234/x`
    /// or `ArXiv:2101.00001`. Returns `None` on provider 404.
    pub async fn get_by_external_id(&self, external_id: &str) -> Result<Option<Paper>, SourceError> {
        self.fetch_paper(external_id).await
    }

    /// Normalize one raw paper object into a [`Paper`].
    fn parse_paper(data: &S2Paper) -> Result<Paper, SourceError> {
        let paper_id = data.paper_id.clone().ok_or_else(|| SourceError::Parse {
            source_name: SOURCE_NAME,
            message: "paper object missing paperId".to_string(),
        })?;

        let authors: Vec<String> = data
            .authors
            .iter()
            .filter_map(|a| a.name.clone())
            .collect();

        let publication_date = data
            .publication_date
            .clone()
            .or_else(|| data.year.map(|y| y.to_string()));

        let doi = data
            .external_ids
            .as_ref()
            .and_then(|ids| ids.get("DOI"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        let url = data.url.clone().unwrap_or_else(|| {
            format!("https://www.semanticscholar.org/paper/{}", paper_id)
        });

        let mut builder = PaperBuilder::new(
            paper_id,
            data.title.clone().unwrap_or_default(),
            url,
            SourceType::SemanticScholar,
        )
        .authors(authors)
        .abstract_text(data.r#abstract.clone().unwrap_or_default())
        .fields_of_study(data.fields_of_study.clone().unwrap_or_default());

        if let Some(date) = publication_date {
            builder = builder.publication_date(date);
        }
        if let Some(pdf_url) = data.open_access_pdf.as_ref().and_then(|p| p.url.clone()) {
            builder = builder.pdf_url(pdf_url);
        }
        if let Some(doi) = doi {
            builder = builder.doi(doi);
        }
        if let Some(venue) = data.venue.clone().filter(|v| !v.is_empty()) {
            builder = builder.venue(venue);
        }
        if let Some(count) = data.citation_count {
            builder = builder.citation_count(count.max(0) as u32);
        }

        Ok(builder.build())
    }
}

impl Default for SemanticScholarSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Source for SemanticScholarSource {
    fn id(&self) -> &str {
        "semantic-scholar"
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn source_type(&self) -> SourceType {
        SourceType::SemanticScholar
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH
            | SourceCapabilities::LOOKUP
            | SourceCapabilities::EXTERNAL_ID_LOOKUP
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SourceError> {
        if query.query.trim().is_empty() {
            return Err(SourceError::InvalidRequest(
                "search query must not be empty".to_string(),
            ));
        }

        self.limiter.acquire().await;

        let url = self.build_search_url(query);
        let this = self.clone();

        let data = with_retry(self.retry, || {
            let this = this.clone();
            let url = url.clone();
            async move {
                let response = this
                    .request(&url)
                    .send()
                    .await
                    .map_err(|e| SourceError::from_transport(SOURCE_NAME, e))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(SourceError::from_status(SOURCE_NAME, status));
                }

                response
                    .json::<S2SearchResponse>()
                    .await
                    .map_err(|e| SourceError::Parse {
                        source_name: SOURCE_NAME,
                        message: e.to_string(),
                    })
            }
        })
        .await?;

        let papers: Vec<Paper> = data
            .data
            .iter()
            .map(Self::parse_paper)
            .collect::<Result<_, _>>()?;

        Ok(SearchResponse {
            items_per_page: papers.len(),
            total_results: data.total,
            offset: data.offset,
            papers,
        })
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Paper>, SourceError> {
        self.fetch_paper(id).await
    }
}

// ===== Semantic Scholar API shapes =====

#[derive(Debug, Deserialize)]
struct S2SearchResponse {
    #[serde(default)]
    data: Vec<S2Paper>,
    #[serde(default)]
    total: usize,
    #[serde(default)]
    offset: usize,
}

#[derive(Debug, Deserialize)]
struct S2Paper {
    #[serde(rename = "paperId")]
    paper_id: Option<String>,
    title: Option<String>,
    #[serde(default)]
    authors: Vec<S2Author>,
    r#abstract: Option<String>,
    year: Option<i32>,
    venue: Option<String>,
    #[serde(rename = "citationCount")]
    citation_count: Option<i64>,
    #[serde(rename = "openAccessPdf")]
    open_access_pdf: Option<S2OpenAccessPdf>,
    #[serde(rename = "fieldsOfStudy")]
    fields_of_study: Option<Vec<String>>,
    #[serde(rename = "publicationDate")]
    publication_date: Option<String>,
    #[serde(rename = "externalIds")]
    external_ids: Option<HashMap<String, serde_json::Value>>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S2Author {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S2OpenAccessPdf {
    url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper_json() -> &'static str {
        r#"{
            "paperId": "649def34f8be52c8b66281af98ae884c09aef38b",
            "title": "Attention Is All You Need",
            "authors": [
                {"authorId": "1", "name": "Ashish Vaswani"},
                {"authorId": "2", "name": null}
            ],
            "abstract": "The dominant sequence transduction models...",
            "year": 2017,
            "venue": "NeurIPS",
            "citationCount": 90000,
            "openAccessPdf": {"url": "https://arxiv.org/pdf/1706.03762.pdf", "status": "GREEN"},
            "fieldsOfStudy": ["Computer Science"],
            "publicationDate": "2017-06-12",
            "externalIds": {"DOI": "10.5555/3295222", "ArXiv": "1706.03762"},
            "url": "https://www.semanticscholar.org/paper/649def34"
        }"#
    }

    #[test]
    fn test_parse_paper() {
        let raw: S2Paper = serde_json::from_str(paper_json()).unwrap();
        let paper = SemanticScholarSource::parse_paper(&raw).unwrap();

        assert_eq!(paper.external_id, "649def34f8be52c8b66281af98ae884c09aef38b");
        assert_eq!(paper.title, "Attention Is All You Need");
        // Authors without a name are skipped.
        assert_eq!(paper.authors, vec!["Ashish Vaswani"]);
        assert_eq!(paper.publication_date.as_deref(), Some("2017-06-12"));
        assert_eq!(
            paper.pdf_url.as_deref(),
            Some("https://arxiv.org/pdf/1706.03762.pdf")
        );
        assert_eq!(paper.citation_count, Some(90000));
        assert_eq!(paper.venue.as_deref(), Some("NeurIPS"));
        assert_eq!(paper.doi.as_deref(), Some("10.5555/3295222"));
        assert_eq!(paper.source, SourceType::SemanticScholar);
    }

    #[test]
    fn test_parse_paper_minimal_fields() {
        let raw: S2Paper =
            serde_json::from_str(r#"{"paperId": "abc123", "title": "Sparse", "year": 2020}"#)
                .unwrap();
        let paper = SemanticScholarSource::parse_paper(&raw).unwrap();

        assert_eq!(paper.external_id, "abc123");
        // Year stands in when publicationDate is absent.
        assert_eq!(paper.publication_date.as_deref(), Some("2020"));
        assert!(paper.pdf_url.is_none());
        assert!(paper.venue.is_none());
    }

    #[test]
    fn test_parse_paper_missing_id_is_error() {
        let raw: S2Paper = serde_json::from_str(r#"{"title": "No Id"}"#).unwrap();
        let result = SemanticScholarSource::parse_paper(&raw);
        assert!(matches!(result, Err(SourceError::Parse { .. })));
    }

    #[test]
    fn test_build_search_url_with_filters() {
        let source = SemanticScholarSource::with_base_url("http://example.com/graph/v1");
        let query = SearchQuery::new("transformers")
            .limit(20)
            .offset(40)
            .year("2020-2022")
            .venue("NeurIPS")
            .fields_of_study(vec!["Computer Science".to_string()]);

        let url = source.build_search_url(&query);
        assert!(url.starts_with("http://example.com/graph/v1/paper/search?query=transformers"));
        assert!(url.contains("limit=20"));
        assert!(url.contains("offset=40"));
        assert!(url.contains("fields=paperId,title,authors"));
        assert!(url.contains("&year=2020-2022"));
        assert!(url.contains("&venue=NeurIPS"));
        assert!(url.contains("&fieldsOfStudy=Computer%20Science"));
    }

    #[test]
    fn test_build_search_url_caps_limit() {
        let source = SemanticScholarSource::with_base_url("http://example.com");
        let url = source.build_search_url(&SearchQuery::new("q").limit(400));
        assert!(url.contains("limit=100"));
    }

    #[tokio::test]
    async fn test_search_rejects_empty_query() {
        let source = SemanticScholarSource::with_base_url("http://example.com");
        let result = source.search(&SearchQuery::new("")).await;
        assert!(matches!(result, Err(SourceError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_get_by_id_rejects_empty_id() {
        let source = SemanticScholarSource::with_base_url("http://example.com");
        let result = source.get_by_id("  ").await;
        assert!(matches!(result, Err(SourceError::InvalidRequest(_))));
    }
}
