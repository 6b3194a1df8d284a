//! arXiv provider client (Atom/XML query API).

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::config::Config;
use crate::models::{
    Paper, PaperBuilder, SearchQuery, SearchResponse, SortBy, SortOrder, SourceType,
};
use crate::sources::{Source, SourceCapabilities, SourceError};
use crate::utils::{with_retry, HttpClient, RetryConfig};

/// Default base URL for the arXiv query API
const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";
/// Base URL for synthesized PDF links
const ARXIV_PDF_URL: &str = "http://arxiv.org/pdf";
/// URL prefix stripped from entry ids
const ARXIV_ABS_PREFIX: &str = "/abs/";

const SOURCE_NAME: &str = "arXiv";

/// arXiv provider client.
///
/// Builds Atom feed requests against the arXiv query API and normalizes the
/// feed entries. Only network failures, timeouts and 5xx responses are
/// retried; arXiv does not hand out 429s worth waiting on.
#[derive(Debug, Clone)]
pub struct ArxivSource {
    client: Arc<HttpClient>,
    base_url: String,
    retry: RetryConfig,
}

impl ArxivSource {
    /// Create a client against the public arXiv API
    pub fn new() -> Self {
        Self::with_base_url(ARXIV_API_URL)
    }

    /// Create a client against a custom endpoint (used by tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Arc::new(HttpClient::new()),
            base_url: base_url.into(),
            retry: RetryConfig::default(),
        }
    }

    /// Create a client from application configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            client: Arc::new(HttpClient::new()),
            base_url: config.endpoints.arxiv.clone(),
            retry: config.retry_config(),
        }
    }

    /// Override the retry policy (used by tests to shrink delays)
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry.retry_on_rate_limit(false);
        self
    }

    fn build_search_url(&self, query: &SearchQuery) -> String {
        let sort_by = match query.sort_by {
            SortBy::Relevance => "relevance",
            SortBy::Date => "submittedDate",
        };
        let sort_order = match query.sort_order {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        };

        format!(
            "{}?search_query={}&start={}&max_results={}&sortBy={}&sortOrder={}",
            self.base_url,
            urlencoding::encode(&query.query),
            query.offset,
            query.bounded_limit(),
            sort_by,
            sort_order
        )
    }

    async fn fetch_feed(&self, url: &str) -> Result<AtomFeed, SourceError> {
        let client = Arc::clone(&self.client);
        let url = url.to_string();

        with_retry(self.retry, || {
            let client = Arc::clone(&client);
            let url = url.clone();
            async move {
                let response = client
                    .client()
                    .get(&url)
                    .header("Accept", "application/atom+xml")
                    .send()
                    .await
                    .map_err(|e| SourceError::from_transport(SOURCE_NAME, e))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(SourceError::from_status(SOURCE_NAME, status));
                }

                let body = response
                    .text()
                    .await
                    .map_err(|e| SourceError::from_transport(SOURCE_NAME, e))?;

                quick_xml::de::from_str::<AtomFeed>(&body).map_err(|e| SourceError::Parse {
                    source_name: SOURCE_NAME,
                    message: e.to_string(),
                })
            }
        })
        .await
    }

    /// Normalize one Atom entry into a [`Paper`].
    fn parse_entry(entry: &AtomEntry) -> Result<Paper, SourceError> {
        let external_id = entry
            .id
            .rsplit_once(ARXIV_ABS_PREFIX)
            .map(|(_, tail)| tail)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SourceError::Parse {
                source_name: SOURCE_NAME,
                message: format!("entry id '{}' has no /abs/ segment", entry.id),
            })?
            .to_string();

        let title = collapse_whitespace(&entry.title);
        let abstract_text = entry
            .summary
            .as_deref()
            .map(collapse_whitespace)
            .unwrap_or_default();

        let authors: Vec<String> = entry.authors.iter().map(|a| a.name.clone()).collect();
        let categories: Vec<String> = entry.categories.iter().map(|c| c.term.clone()).collect();

        let pdf_url = entry
            .links
            .iter()
            .find(|link| link.link_type.as_deref() == Some("application/pdf"))
            .map(|link| link.href.clone())
            .unwrap_or_else(|| format!("{}/{}.pdf", ARXIV_PDF_URL, external_id));

        // Feeds without published/updated get the fetch time so every arXiv
        // entry carries a date; downstream date filtering relies on this.
        let publication_date = entry
            .published
            .clone()
            .or_else(|| entry.updated.clone())
            .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());

        Ok(
            PaperBuilder::new(external_id, title, entry.id.clone(), SourceType::Arxiv)
                .authors(authors)
                .abstract_text(abstract_text)
                .publication_date(publication_date)
                .pdf_url(pdf_url)
                .categories(categories)
                .build(),
        )
    }
}

impl Default for ArxivSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Source for ArxivSource {
    fn id(&self) -> &str {
        "arxiv"
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn source_type(&self) -> SourceType {
        SourceType::Arxiv
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH | SourceCapabilities::LOOKUP
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SourceError> {
        if query.query.trim().is_empty() {
            return Err(SourceError::InvalidRequest(
                "search query must not be empty".to_string(),
            ));
        }

        let url = self.build_search_url(query);
        let feed = self.fetch_feed(&url).await?;

        let papers: Vec<Paper> = feed
            .entries
            .iter()
            .map(Self::parse_entry)
            .collect::<Result<_, _>>()?;

        Ok(SearchResponse {
            total_results: feed.total_results.unwrap_or(0),
            offset: feed.start_index.unwrap_or(0),
            items_per_page: feed.items_per_page.unwrap_or(0),
            papers,
        })
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Paper>, SourceError> {
        if id.trim().is_empty() {
            return Err(SourceError::InvalidRequest(
                "arXiv id must not be empty".to_string(),
            ));
        }

        let url = format!("{}?id_list={}", self.base_url, urlencoding::encode(id));
        let feed = self.fetch_feed(&url).await?;

        feed.entries
            .first()
            .map(Self::parse_entry)
            .transpose()
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ===== Atom feed shapes =====
//
// quick-xml's serde deserializer strips namespace prefixes, so the
// opensearch pagination elements are matched by their local names.

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "totalResults", default)]
    total_results: Option<usize>,
    #[serde(rename = "startIndex", default)]
    start_index: Option<usize>,
    #[serde(rename = "itemsPerPage", default)]
    items_per_page: Option<usize>,
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    published: Option<String>,
    #[serde(default)]
    updated: Option<String>,
    #[serde(rename = "author", default)]
    authors: Vec<AtomAuthor>,
    #[serde(rename = "category", default)]
    categories: Vec<AtomCategory>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AtomCategory {
    #[serde(rename = "@term")]
    term: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: String,
    #[serde(rename = "@type", default)]
    link_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_from_xml(xml: &str) -> AtomEntry {
        let feed: AtomFeed = quick_xml::de::from_str(xml).expect("valid feed");
        feed.entries.into_iter().next().expect("one entry")
    }

    const FEED_WITH_PDF_LINK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">
  <opensearch:totalResults>42</opensearch:totalResults>
  <opensearch:startIndex>0</opensearch:startIndex>
  <opensearch:itemsPerPage>1</opensearch:itemsPerPage>
  <entry>
    <id>http://arxiv.org/abs/2101.00001</id>
    <title>A Study of
        Whitespace   Handling</title>
    <summary>Some   abstract
        text.</summary>
    <published>2021-01-01T00:00:00Z</published>
    <updated>2021-02-01T00:00:00Z</updated>
    <author><name>Alice Example</name></author>
    <author><name>Bob Example</name></author>
    <category term="cs.AI"/>
    <category term="cs.LG"/>
    <link href="http://arxiv.org/abs/2101.00001" rel="alternate" type="text/html"/>
    <link href="http://arxiv.org/pdf/2101.00001v1" rel="related" type="application/pdf"/>
  </entry>
</feed>"#;

    const FEED_WITHOUT_PDF_LINK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/abs/2101.00001</id>
    <title>No PDF Link</title>
    <summary>Abstract.</summary>
    <published>2021-01-01T00:00:00Z</published>
    <author><name>Alice Example</name></author>
    <link href="http://arxiv.org/abs/2101.00001" rel="alternate" type="text/html"/>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_entry_strips_id_prefix() {
        let entry = entry_from_xml(FEED_WITH_PDF_LINK);
        let paper = ArxivSource::parse_entry(&entry).unwrap();
        assert_eq!(paper.external_id, "2101.00001");
        assert_eq!(paper.source, SourceType::Arxiv);
    }

    #[test]
    fn test_parse_entry_collapses_whitespace() {
        let entry = entry_from_xml(FEED_WITH_PDF_LINK);
        let paper = ArxivSource::parse_entry(&entry).unwrap();
        assert_eq!(paper.title, "A Study of Whitespace Handling");
        assert_eq!(paper.abstract_text, "Some abstract text.");
    }

    #[test]
    fn test_parse_entry_authors_and_categories() {
        let entry = entry_from_xml(FEED_WITH_PDF_LINK);
        let paper = ArxivSource::parse_entry(&entry).unwrap();
        assert_eq!(paper.authors, vec!["Alice Example", "Bob Example"]);
        assert_eq!(paper.categories, vec!["cs.AI", "cs.LG"]);
    }

    #[test]
    fn test_parse_entry_finds_pdf_link() {
        let entry = entry_from_xml(FEED_WITH_PDF_LINK);
        let paper = ArxivSource::parse_entry(&entry).unwrap();
        assert_eq!(
            paper.pdf_url.as_deref(),
            Some("http://arxiv.org/pdf/2101.00001v1")
        );
    }

    #[test]
    fn test_parse_entry_synthesizes_pdf_link() {
        let entry = entry_from_xml(FEED_WITHOUT_PDF_LINK);
        let paper = ArxivSource::parse_entry(&entry).unwrap();
        assert_eq!(
            paper.pdf_url.as_deref(),
            Some("http://arxiv.org/pdf/2101.00001.pdf")
        );
    }

    #[test]
    fn test_parse_entry_prefers_published_date() {
        let entry = entry_from_xml(FEED_WITH_PDF_LINK);
        let paper = ArxivSource::parse_entry(&entry).unwrap();
        assert_eq!(
            paper.publication_date.as_deref(),
            Some("2021-01-01T00:00:00Z")
        );
    }

    #[test]
    fn test_parse_entry_falls_back_to_updated_then_now() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/abs/2101.00002</id>
    <title>T</title>
    <updated>2021-02-01T00:00:00Z</updated>
  </entry>
</feed>"#;
        let paper = ArxivSource::parse_entry(&entry_from_xml(xml)).unwrap();
        assert_eq!(
            paper.publication_date.as_deref(),
            Some("2021-02-01T00:00:00Z")
        );

        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/abs/2101.00003</id>
    <title>T</title>
  </entry>
</feed>"#;
        let paper = ArxivSource::parse_entry(&entry_from_xml(xml)).unwrap();
        // Absent dates are filled with the fetch time, so the field is
        // always populated for arXiv.
        assert!(paper.publication_date.is_some());
    }

    #[test]
    fn test_parse_feed_pagination() {
        let feed: AtomFeed = quick_xml::de::from_str(FEED_WITH_PDF_LINK).unwrap();
        assert_eq!(feed.total_results, Some(42));
        assert_eq!(feed.start_index, Some(0));
        assert_eq!(feed.items_per_page, Some(1));
        assert_eq!(feed.entries.len(), 1);
    }

    #[test]
    fn test_parse_entry_rejects_malformed_id() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>not-an-arxiv-url</id>
    <title>T</title>
  </entry>
</feed>"#;
        let result = ArxivSource::parse_entry(&entry_from_xml(xml));
        assert!(matches!(result, Err(SourceError::Parse { .. })));
    }

    #[test]
    fn test_build_search_url() {
        let source = ArxivSource::with_base_url("http://example.com/api/query");
        let query = SearchQuery::new("quantum computing")
            .limit(25)
            .offset(50)
            .sort_by(SortBy::Date);

        let url = source.build_search_url(&query);
        assert!(url.starts_with("http://example.com/api/query?search_query=quantum%20computing"));
        assert!(url.contains("start=50"));
        assert!(url.contains("max_results=25"));
        assert!(url.contains("sortBy=submittedDate"));
        assert!(url.contains("sortOrder=descending"));
    }

    #[test]
    fn test_build_search_url_clamps_limit() {
        let source = ArxivSource::with_base_url("http://example.com");
        let url = source.build_search_url(&SearchQuery::new("q").limit(5000));
        assert!(url.contains("max_results=100"));
    }

    #[tokio::test]
    async fn test_search_rejects_empty_query() {
        let source = ArxivSource::with_base_url("http://example.com");
        let result = source.search(&SearchQuery::new("   ")).await;
        assert!(matches!(result, Err(SourceError::InvalidRequest(_))));
    }
}
