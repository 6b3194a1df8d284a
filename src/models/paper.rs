//! Paper model representing a normalized result from any provider.

use serde::{Deserialize, Serialize};

/// The provider where the paper was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    #[serde(rename = "arxiv")]
    Arxiv,
    #[serde(rename = "semantic-scholar")]
    SemanticScholar,
}

impl SourceType {
    /// Returns the display name of the provider
    pub fn name(&self) -> &'static str {
        match self {
            SourceType::Arxiv => "arXiv",
            SourceType::SemanticScholar => "Semantic Scholar",
        }
    }

    /// Returns the provider identifier used in queries and error reports
    pub fn id(&self) -> &'static str {
        match self {
            SourceType::Arxiv => "arxiv",
            SourceType::SemanticScholar => "semantic-scholar",
        }
    }

    /// Parse a provider identifier string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "arxiv" => Some(SourceType::Arxiv),
            "semantic-scholar" | "semantic" => Some(SourceType::SemanticScholar),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A paper normalized into a provider-agnostic shape.
///
/// Both providers' raw responses (Atom XML for arXiv, JSON for Semantic
/// Scholar) are parsed into this one record. Constructed fresh per response
/// parse and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paper {
    /// Provider-specific identifier (bare arXiv id, Semantic Scholar paperId)
    pub external_id: String,

    /// Paper title (whitespace-collapsed)
    pub title: String,

    /// Author names in publication order
    pub authors: Vec<String>,

    /// Abstract text (whitespace-collapsed)
    pub abstract_text: String,

    /// Publication date (ISO format) when the provider reports one
    pub publication_date: Option<String>,

    /// Direct PDF URL
    pub pdf_url: Option<String>,

    /// Paper page URL
    pub url: String,

    /// Provider the paper came from
    pub source: SourceType,

    /// Digital Object Identifier
    pub doi: Option<String>,

    /// Subject categories (arXiv)
    pub categories: Vec<String>,

    /// Fields of study (Semantic Scholar)
    pub fields_of_study: Vec<String>,

    /// Publication venue (Semantic Scholar)
    pub venue: Option<String>,

    /// Citation count (Semantic Scholar)
    pub citation_count: Option<u32>,
}

impl Paper {
    /// Create a new paper with required fields
    pub fn new(external_id: String, title: String, url: String, source: SourceType) -> Self {
        Self {
            external_id,
            title,
            authors: Vec::new(),
            abstract_text: String::new(),
            publication_date: None,
            pdf_url: None,
            url,
            source,
            doi: None,
            categories: Vec::new(),
            fields_of_study: Vec::new(),
            venue: None,
            citation_count: None,
        }
    }

    /// Check if the paper has a downloadable PDF
    pub fn has_pdf(&self) -> bool {
        self.pdf_url.is_some()
    }
}

/// Builder for constructing Paper objects
#[derive(Debug, Clone)]
pub struct PaperBuilder {
    paper: Paper,
}

impl PaperBuilder {
    /// Create a new builder with required fields
    pub fn new(
        external_id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        source: SourceType,
    ) -> Self {
        Self {
            paper: Paper::new(external_id.into(), title.into(), url.into(), source),
        }
    }

    /// Set authors
    pub fn authors(mut self, authors: Vec<String>) -> Self {
        self.paper.authors = authors;
        self
    }

    /// Set abstract
    pub fn abstract_text(mut self, abstract_text: impl Into<String>) -> Self {
        self.paper.abstract_text = abstract_text.into();
        self
    }

    /// Set publication date
    pub fn publication_date(mut self, date: impl Into<String>) -> Self {
        self.paper.publication_date = Some(date.into());
        self
    }

    /// Set PDF URL
    pub fn pdf_url(mut self, url: impl Into<String>) -> Self {
        self.paper.pdf_url = Some(url.into());
        self
    }

    /// Set DOI
    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.paper.doi = Some(doi.into());
        self
    }

    /// Set categories
    pub fn categories(mut self, categories: Vec<String>) -> Self {
        self.paper.categories = categories;
        self
    }

    /// Set fields of study
    pub fn fields_of_study(mut self, fields: Vec<String>) -> Self {
        self.paper.fields_of_study = fields;
        self
    }

    /// Set venue
    pub fn venue(mut self, venue: impl Into<String>) -> Self {
        self.paper.venue = Some(venue.into());
        self
    }

    /// Set citation count
    pub fn citation_count(mut self, count: u32) -> Self {
        self.paper.citation_count = Some(count);
        self
    }

    /// Build the Paper
    pub fn build(self) -> Paper {
        self.paper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paper_builder() {
        let paper = PaperBuilder::new(
            "2101.00001",
            "Test Paper",
            "http://arxiv.org/abs/2101.00001",
            SourceType::Arxiv,
        )
        .authors(vec!["John Doe".to_string(), "Jane Smith".to_string()])
        .abstract_text("This is a test abstract.")
        .pdf_url("http://arxiv.org/pdf/2101.00001.pdf")
        .publication_date("2021-01-01T00:00:00Z")
        .build();

        assert_eq!(paper.external_id, "2101.00001");
        assert_eq!(paper.authors.len(), 2);
        assert!(paper.has_pdf());
        assert_eq!(paper.citation_count, None);
    }

    #[test]
    fn test_source_type_parse() {
        assert_eq!(SourceType::parse("arxiv"), Some(SourceType::Arxiv));
        assert_eq!(
            SourceType::parse("semantic-scholar"),
            Some(SourceType::SemanticScholar)
        );
        assert_eq!(
            SourceType::parse("semantic"),
            Some(SourceType::SemanticScholar)
        );
        assert_eq!(SourceType::parse("pubmed"), None);
    }

    #[test]
    fn test_source_type_ids_round_trip() {
        for source in [SourceType::Arxiv, SourceType::SemanticScholar] {
            assert_eq!(SourceType::parse(source.id()), Some(source));
        }
    }
}
