//! Web search capability.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::{Result, TRACING_TARGET_PROVIDER};

/// A single search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Result title.
    pub title: String,
    /// Result URL.
    pub link: String,
    /// Short excerpt, if the engine returned one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// Results of one search query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    /// The query that produced these results.
    pub query: String,
    /// Results in ranking order.
    pub results: Vec<SearchHit>,
}

impl SearchResults {
    /// Creates an empty result set for `query`.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            results: Vec::new(),
        }
    }

    /// Appends a result.
    pub fn with_hit(mut self, hit: SearchHit) -> Self {
        self.results.push(hit);
        self
    }

    /// Returns the number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if there are no results.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// A web search backend.
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    /// Runs `query` and returns its results.
    async fn search(&self, query: &str) -> Result<SearchResults>;
}

/// Shared handle to a [`SearchProvider`].
#[derive(Clone)]
pub struct SearchService {
    inner: Arc<dyn SearchProvider>,
}

impl SearchService {
    /// Wraps a provider.
    pub fn new<P>(provider: P) -> Self
    where
        P: SearchProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Runs `query`; failures are returned unchanged.
    pub async fn search(&self, query: &str) -> Result<SearchResults> {
        let start = Instant::now();
        let result = self.inner.search(query).await;

        match &result {
            Ok(results) => tracing::debug!(
                target: TRACING_TARGET_PROVIDER,
                query,
                results = results.len(),
                elapsed_ms = start.elapsed().as_millis(),
                "Search completed"
            ),
            Err(error) => tracing::error!(
                target: TRACING_TARGET_PROVIDER,
                query,
                error = %error,
                "Search failed"
            ),
        }

        result
    }
}

impl fmt::Debug for SearchService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchService").finish_non_exhaustive()
    }
}
