//! Page fetch capability.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::{Result, TRACING_TARGET_PROVIDER};

/// Readable content of a fetched page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedPage {
    /// The URL that was requested.
    pub url: String,
    /// Page title if available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Extracted text.
    pub text: String,
}

/// A page fetch backend.
#[async_trait::async_trait]
pub trait FetchProvider: Send + Sync {
    /// Downloads `url` and extracts its text.
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// Shared handle to a [`FetchProvider`].
#[derive(Clone)]
pub struct FetchService {
    inner: Arc<dyn FetchProvider>,
}

impl FetchService {
    /// Wraps a provider.
    pub fn new<P>(provider: P) -> Self
    where
        P: FetchProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Fetches `url`; failures are returned unchanged.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let start = Instant::now();
        let result = self.inner.fetch(url).await;

        match &result {
            Ok(page) => tracing::debug!(
                target: TRACING_TARGET_PROVIDER,
                url,
                text_len = page.text.len(),
                elapsed_ms = start.elapsed().as_millis(),
                "Fetch completed"
            ),
            Err(error) => tracing::error!(
                target: TRACING_TARGET_PROVIDER,
                url,
                error = %error,
                "Fetch failed"
            ),
        }

        result
    }
}

impl fmt::Debug for FetchService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchService").finish_non_exhaustive()
    }
}
