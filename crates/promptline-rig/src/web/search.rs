//! Web search through SerpAPI.

use std::fmt;

use promptline_core::provider::{SearchHit, SearchProvider, SearchResults, SearchService};
use promptline_core::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::http::HttpConfig;
use crate::TRACING_TARGET_WEB;

/// SerpAPI JSON search endpoint.
pub const SERPAPI_ENDPOINT: &str = "https://serpapi.com/search.json";

const CAPABILITY: &str = "serpapi";

/// Google search through SerpAPI, returning the organic results.
#[derive(Clone)]
pub struct SerpApiSearch {
    http: Client,
    api_key: String,
    endpoint: Url,
    num_results: u32,
}

impl SerpApiSearch {
    /// Creates a search client for `api_key`.
    pub fn new(api_key: impl Into<String>, config: &HttpConfig) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::config("SerpAPI key cannot be empty"));
        }

        let endpoint = Url::parse(SERPAPI_ENDPOINT)
            .map_err(|e| Error::config(format!("invalid SerpAPI endpoint: {e}")))?;

        Ok(Self {
            http: config.build_client()?,
            api_key,
            endpoint,
            num_results: 10,
        })
    }

    /// Sends requests to `endpoint` instead of the public API.
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Sets how many results to request.
    pub fn with_num_results(mut self, num_results: u32) -> Self {
        self.num_results = num_results.max(1);
        self
    }

    /// Wraps this client into a [`SearchService`].
    pub fn into_service(self) -> SearchService {
        SearchService::new(self)
    }
}

#[async_trait::async_trait]
impl SearchProvider for SerpApiSearch {
    async fn search(&self, query: &str) -> Result<SearchResults> {
        tracing::debug!(
            target: TRACING_TARGET_WEB,
            query,
            num_results = self.num_results,
            "Searching"
        );

        let num_results = self.num_results.to_string();
        let response = self
            .http
            .get(self.endpoint.clone())
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("num", num_results.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::capability(CAPABILITY, e.without_url()))?;

        let status = response.status();
        let mut body: SerpApiResponse = response
            .json()
            .await
            .map_err(|e| Error::capability(CAPABILITY, format!("HTTP {status}: {e}")))?;

        if let Some(error) = body.error.take() {
            return Err(Error::capability(CAPABILITY, error));
        }
        if !status.is_success() {
            return Err(Error::capability(CAPABILITY, format!("HTTP {status}")));
        }

        Ok(body.into_results(query))
    }
}

impl fmt::Debug for SerpApiSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerpApiSearch")
            .field("endpoint", &self.endpoint.as_str())
            .field("num_results", &self.num_results)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    title: String,
    link: String,
    #[serde(default)]
    snippet: Option<String>,
}

impl SerpApiResponse {
    fn into_results(self, query: &str) -> SearchResults {
        self.organic_results
            .into_iter()
            .fold(SearchResults::new(query), |results, r| {
                results.with_hit(SearchHit {
                    title: r.title,
                    link: r.link,
                    snippet: r.snippet,
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_organic_results() {
        let body: SerpApiResponse = serde_json::from_str(
            r#"{
                "search_metadata": {"status": "Success"},
                "organic_results": [
                    {"position": 1, "title": "Rust", "link": "https://rust-lang.org", "snippet": "A language"},
                    {"position": 2, "title": "Crates", "link": "https://crates.io"}
                ]
            }"#,
        )
        .unwrap();

        let results = body.into_results("rust");
        assert_eq!(results.query, "rust");
        assert_eq!(results.len(), 2);
        assert_eq!(results.results[0].snippet.as_deref(), Some("A language"));
        assert_eq!(results.results[1].snippet, None);
    }

    #[test]
    fn missing_results_are_empty() {
        let body: SerpApiResponse =
            serde_json::from_str(r#"{"error": "Invalid API key."}"#).unwrap();
        assert_eq!(body.error.as_deref(), Some("Invalid API key."));
        assert!(body.into_results("q").is_empty());
    }

    #[test]
    fn rejects_empty_key() {
        assert!(SerpApiSearch::new(" ", &HttpConfig::default()).is_err());

        let search = SerpApiSearch::new("key", &HttpConfig::default())
            .unwrap()
            .with_num_results(0);
        assert_eq!(search.num_results, 1);
    }
}
