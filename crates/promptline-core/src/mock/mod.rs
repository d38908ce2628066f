//! Scripted capability providers for testing.
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! promptline-core = { version = "...", features = ["test-utils"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use promptline_core::mock::MockGeneration;
//!
//! let mock = MockGeneration::new()
//!     .reply(["Hel", "lo"])
//!     .fail_after(["partial"], "provider went away");
//!
//! let service = mock.clone().into_service();
//! // ... run a pipeline, then inspect what the provider saw:
//! assert_eq!(mock.prompts().len(), 2);
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_stream::try_stream;
use futures::StreamExt;

use crate::provider::{
    FetchProvider, FetchService, FetchedPage, FragmentStream, GenerationProvider,
    GenerationService, SearchHit, SearchProvider, SearchResults, SearchService,
};
use crate::{Error, Result};

/// One scripted generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// Yield the fragments, then finish.
    Fragments(Vec<String>),
    /// Yield the fragments, then fail with a capability error.
    FailAfter {
        fragments: Vec<String>,
        message: String,
    },
}

#[derive(Debug, Default)]
struct MockState {
    script: Mutex<VecDeque<MockReply>>,
    prompts: Mutex<Vec<String>>,
    open_streams: AtomicUsize,
}

impl MockState {
    fn script(&self) -> MutexGuard<'_, VecDeque<MockReply>> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn prompts(&self) -> MutexGuard<'_, Vec<String>> {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Decrements the open stream count when the stream is dropped.
struct OpenStream(Arc<MockState>);

impl OpenStream {
    fn open(state: Arc<MockState>) -> Self {
        state.open_streams.fetch_add(1, Ordering::SeqCst);
        Self(state)
    }
}

impl Drop for OpenStream {
    fn drop(&mut self) {
        self.0.open_streams.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Generation provider that replays scripted replies.
///
/// Replies are consumed in call order. Once the script is exhausted every
/// call echoes its prompt back as a single fragment.
#[derive(Debug, Clone, Default)]
pub struct MockGeneration {
    state: Arc<MockState>,
}

impl MockGeneration {
    /// Creates a mock with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful reply made of `fragments`.
    pub fn reply<I, S>(self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fragments = fragments.into_iter().map(Into::into).collect();
        self.state.script().push_back(MockReply::Fragments(fragments));
        self
    }

    /// Queues a reply that yields `fragments` and then fails.
    pub fn fail_after<I, S>(self, fragments: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fragments = fragments.into_iter().map(Into::into).collect();
        self.state.script().push_back(MockReply::FailAfter {
            fragments,
            message: message.into(),
        });
        self
    }

    /// Returns every prompt received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.state.prompts().clone()
    }

    /// Returns the number of generation calls made.
    pub fn calls(&self) -> usize {
        self.state.prompts().len()
    }

    /// Returns the number of fragment streams not yet dropped.
    pub fn open_streams(&self) -> usize {
        self.state.open_streams.load(Ordering::SeqCst)
    }

    /// Wraps this mock into a [`GenerationService`].
    pub fn into_service(self) -> GenerationService {
        GenerationService::new(self)
    }
}

impl GenerationProvider for MockGeneration {
    fn generate(&self, prompt: String) -> FragmentStream {
        self.state.prompts().push(prompt.clone());

        let reply = self
            .state
            .script()
            .pop_front()
            .unwrap_or_else(|| MockReply::Fragments(vec![prompt]));

        let guard = OpenStream::open(self.state.clone());

        try_stream! {
            let _guard = guard;
            let (fragments, failure) = match reply {
                MockReply::Fragments(fragments) => (fragments, None),
                MockReply::FailAfter { fragments, message } => (fragments, Some(message)),
            };

            for fragment in fragments {
                yield fragment;
            }

            if let Some(message) = failure {
                Err::<(), _>(Error::capability("mock", message))?;
            }
        }
        .boxed()
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Search provider returning one canned hit per query.
#[derive(Debug, Clone, Default)]
pub struct MockSearch {
    failure: Option<String>,
}

impl MockSearch {
    /// Creates a search mock that always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a search mock that always fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
        }
    }

    /// Wraps this mock into a [`SearchService`].
    pub fn into_service(self) -> SearchService {
        SearchService::new(self)
    }
}

#[async_trait::async_trait]
impl SearchProvider for MockSearch {
    async fn search(&self, query: &str) -> Result<SearchResults> {
        if let Some(message) = &self.failure {
            return Err(Error::capability("mock-search", message));
        }

        Ok(SearchResults::new(query).with_hit(SearchHit {
            title: format!("Result for {query}"),
            link: format!("https://search.test/?q={}", query.replace(' ', "+")),
            snippet: Some(format!("About {query}")),
        }))
    }
}

/// Fetch provider returning a page whose text names the URL.
#[derive(Debug, Clone, Default)]
pub struct MockFetch {
    failure: Option<String>,
}

impl MockFetch {
    /// Creates a fetch mock that always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fetch mock that always fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
        }
    }

    /// Wraps this mock into a [`FetchService`].
    pub fn into_service(self) -> FetchService {
        FetchService::new(self)
    }
}

#[async_trait::async_trait]
impl FetchProvider for MockFetch {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        if let Some(message) = &self.failure {
            return Err(Error::capability("mock-fetch", message));
        }

        Ok(FetchedPage {
            url: url.to_string(),
            title: Some("Mock page".to_string()),
            text: format!("Content of {url}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;

    use super::*;

    #[tokio::test]
    async fn replays_script_then_echoes() {
        let mock = MockGeneration::new().reply(["a", "b"]);
        let service = mock.clone().into_service();

        let first: Vec<String> = service.generate("one").try_collect().await.unwrap();
        let second: Vec<String> = service.generate("two").try_collect().await.unwrap();

        assert_eq!(first, vec!["a", "b"]);
        assert_eq!(second, vec!["two"]);
        assert_eq!(mock.prompts(), vec!["one", "two"]);
        assert_eq!(mock.open_streams(), 0);
    }

    #[tokio::test]
    async fn failure_follows_partial_fragments() {
        let mock = MockGeneration::new().fail_after(["partial"], "boom");
        let mut stream = mock.generate("prompt".into());

        assert_eq!(stream.next().await.unwrap().unwrap(), "partial");
        let error = stream.next().await.unwrap().unwrap_err();
        assert!(error.is_capability());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn dropping_stream_releases_it() {
        let mock = MockGeneration::new().reply(["a", "b", "c"]);
        let mut stream = mock.generate("prompt".into());
        assert_eq!(mock.open_streams(), 1);

        stream.next().await;
        drop(stream);
        assert_eq!(mock.open_streams(), 0);
    }

    #[tokio::test]
    async fn search_and_fetch_mocks() {
        let results = MockSearch::new().search("rust lang").await.unwrap();
        assert_eq!(results.query, "rust lang");
        assert_eq!(results.len(), 1);

        assert!(MockSearch::failing("down").search("x").await.is_err());

        let page = MockFetch::new().fetch("https://a.test").await.unwrap();
        assert_eq!(page.text, "Content of https://a.test");
    }
}
