//! Scripted in-memory provider used by orchestrator tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::models::{Paper, SearchQuery, SearchResponse, SourceType};
use crate::sources::{Source, SourceCapabilities, SourceError};

/// A provider that serves canned papers, or fails on demand.
///
/// Every search query it receives is recorded, so tests can assert what the
/// orchestrator actually sent.
#[derive(Debug, Clone)]
pub struct MockSource {
    id: String,
    name: String,
    source_type: SourceType,
    papers: Vec<Paper>,
    fail_with_status: Option<u16>,
    received: Arc<Mutex<Vec<SearchQuery>>>,
}

impl MockSource {
    pub fn new(source_type: SourceType, papers: Vec<Paper>) -> Self {
        Self {
            id: source_type.id().to_string(),
            name: source_type.name().to_string(),
            source_type,
            papers,
            fail_with_status: None,
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queries received by `search`, in arrival order.
    pub fn received_queries(&self) -> Vec<SearchQuery> {
        self.received.lock().unwrap().clone()
    }

    /// Make every call return a server error with the given status.
    pub fn failing(source_type: SourceType, status: u16) -> Self {
        Self {
            fail_with_status: Some(status),
            ..Self::new(source_type, Vec::new())
        }
    }

    fn check_failure(&self) -> Result<(), SourceError> {
        match self.fail_with_status {
            Some(status) => Err(SourceError::Server {
                source_name: self.source_type.name(),
                status,
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> SourceType {
        self.source_type
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH | SourceCapabilities::LOOKUP
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SourceError> {
        self.received.lock().unwrap().push(query.clone());
        self.check_failure()?;

        let papers: Vec<Paper> = self
            .papers
            .iter()
            .take(query.bounded_limit())
            .cloned()
            .collect();

        Ok(SearchResponse {
            total_results: self.papers.len(),
            offset: query.offset,
            items_per_page: papers.len(),
            papers,
        })
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Paper>, SourceError> {
        self.check_failure()?;
        Ok(self.papers.iter().find(|p| p.external_id == id).cloned())
    }
}
