//! Text generation capability.

use std::fmt;
use std::sync::Arc;

use futures::stream::BoxStream;

use crate::{Result, TRACING_TARGET_PROVIDER};

/// Lazy sequence of generated text fragments.
///
/// Dropping the stream must release whatever the provider holds open for it
/// (an HTTP response body, a subprocess, ...).
pub type FragmentStream = BoxStream<'static, Result<String>>;

/// A text generation backend.
///
/// Implementations receive a fully resolved prompt and return a stream that
/// yields output fragments as they become available. Errors may be yielded at
/// any point and terminate the stream.
pub trait GenerationProvider: Send + Sync {
    /// Starts generating a response to `prompt`.
    fn generate(&self, prompt: String) -> FragmentStream;

    /// Returns a short name used in logs.
    fn name(&self) -> &str {
        "generation"
    }
}

/// Shared handle to a [`GenerationProvider`].
///
/// This type is cheap to clone and can be shared across threads.
#[derive(Clone)]
pub struct GenerationService {
    inner: Arc<dyn GenerationProvider>,
}

impl GenerationService {
    /// Wraps a provider.
    pub fn new<P>(provider: P) -> Self
    where
        P: GenerationProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Wraps an already shared provider.
    pub fn from_arc(provider: Arc<dyn GenerationProvider>) -> Self {
        Self { inner: provider }
    }

    /// Returns the provider name.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Starts generating a response to `prompt`.
    pub fn generate(&self, prompt: impl Into<String>) -> FragmentStream {
        let prompt = prompt.into();

        tracing::debug!(
            target: TRACING_TARGET_PROVIDER,
            provider = self.name(),
            prompt_len = prompt.len(),
            "Starting generation"
        );

        self.inner.generate(prompt)
    }
}

impl fmt::Debug for GenerationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationService")
            .field("provider", &self.name())
            .finish()
    }
}
