//! Completion provider over rig models.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, Stream};
use futures::{StreamExt, TryStreamExt, future};
use promptline_core::provider::{FragmentStream, GenerationProvider, GenerationService};
use promptline_core::{Error, PromptMessages, Result};
use rig::completion::{
    AssistantContent, CompletionError, CompletionModel as RigCompletionModel,
    CompletionRequestBuilder,
};
use rig::one_or_many::OneOrMany;
use rig::prelude::CompletionClient;
use rig::providers::{anthropic, openai};
use rig::streaming::StreamedAssistantContent;
use serde::{Deserialize, Serialize};

use super::credentials::Credentials;
use super::model::{AnthropicModel, CompletionModel, OpenAiModel};
use crate::TRACING_TARGET_COMPLETION;

/// Request settings applied to every completion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletionSettings {
    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Upper bound on generated tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u64>,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            temperature: None,
            max_tokens: Some(4096),
        }
    }
}

/// Completion provider that wraps the rig model of one provider.
///
/// This is a cheaply cloneable wrapper around an `Arc`. The rendered prompt's
/// `<system>` segment is sent as the preamble and its `<user>` segment as
/// the prompt. As a [`GenerationProvider`] it streams the response, yielding
/// text deltas as the provider sends them.
#[derive(Clone)]
pub struct CompletionProvider(Arc<Inner>);

struct Inner {
    service: CompletionService,
    model_name: String,
    settings: CompletionSettings,
}

enum CompletionService {
    OpenAi(openai::CompletionModel),
    Anthropic(anthropic::completion::CompletionModel),
}

impl CompletionProvider {
    /// Connects to the provider of `model`.
    ///
    /// Fails with a configuration error when `credentials` belong to another
    /// provider.
    pub fn connect(
        model: CompletionModel,
        credentials: Credentials,
        settings: CompletionSettings,
    ) -> Result<Self> {
        let service = match (credentials, model) {
            (Credentials::OpenAi(c), CompletionModel::OpenAi(m)) => {
                let client = openai::Client::new(&c.api_key)
                    .map_err(|e| Error::capability("openai", e))?
                    .completions_api();
                CompletionService::OpenAi(client.completion_model(m.as_ref()))
            }
            (Credentials::Anthropic(c), CompletionModel::Anthropic(m)) => {
                let client = anthropic::Client::new(&c.api_key)
                    .map_err(|e| Error::capability("anthropic", e))?;
                CompletionService::Anthropic(client.completion_model(m.as_ref()))
            }
            (credentials, model) => {
                return Err(Error::config(format!(
                    "{} credentials cannot be used with model '{model}'",
                    credentials.provider()
                )));
            }
        };

        tracing::debug!(
            target: TRACING_TARGET_COMPLETION,
            model = %model,
            temperature = ?settings.temperature,
            max_tokens = ?settings.max_tokens,
            "Completion provider connected"
        );

        Ok(Self(Arc::new(Inner {
            service,
            model_name: model.as_str().to_string(),
            settings,
        })))
    }

    /// Creates an OpenAI completion provider.
    pub fn openai(api_key: &str, model: OpenAiModel) -> Result<Self> {
        Self::connect(
            CompletionModel::OpenAi(model),
            Credentials::OpenAi(super::ApiKeyCredentials::new(api_key)),
            CompletionSettings::default(),
        )
    }

    /// Creates an Anthropic completion provider.
    pub fn anthropic(api_key: &str, model: AnthropicModel) -> Result<Self> {
        Self::connect(
            CompletionModel::Anthropic(model),
            Credentials::Anthropic(super::ApiKeyCredentials::new(api_key)),
            CompletionSettings::default(),
        )
    }

    /// Returns the model name.
    pub fn model_name(&self) -> &str {
        &self.0.model_name
    }

    /// Returns the provider name.
    pub fn provider_name(&self) -> &'static str {
        match self.0.service {
            CompletionService::OpenAi(_) => "openai",
            CompletionService::Anthropic(_) => "anthropic",
        }
    }

    /// Returns the request settings.
    pub fn settings(&self) -> &CompletionSettings {
        &self.0.settings
    }

    /// Sends one completion request and returns the response text.
    pub async fn complete(&self, messages: &PromptMessages) -> Result<String> {
        let start = Instant::now();
        let settings = &self.0.settings;

        let result = match &self.0.service {
            CompletionService::OpenAi(model) => send(model, messages, settings).await,
            CompletionService::Anthropic(model) => send(model, messages, settings).await,
        };

        match result {
            Ok(text) => {
                tracing::debug!(
                    target: TRACING_TARGET_COMPLETION,
                    model = self.model_name(),
                    output_len = text.len(),
                    elapsed_ms = start.elapsed().as_millis(),
                    "Completion finished"
                );
                Ok(text)
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET_COMPLETION,
                    model = self.model_name(),
                    error = %error,
                    "Completion failed"
                );
                Err(Error::capability(self.provider_name(), error))
            }
        }
    }

    /// Opens a streaming completion and returns its text deltas.
    pub async fn stream(&self, messages: &PromptMessages) -> Result<FragmentStream> {
        let settings = &self.0.settings;
        let provider = self.provider_name();

        let result = match &self.0.service {
            CompletionService::OpenAi(model) => {
                open_stream(model, messages, settings, provider).await
            }
            CompletionService::Anthropic(model) => {
                open_stream(model, messages, settings, provider).await
            }
        };

        match result {
            Ok(fragments) => {
                tracing::debug!(
                    target: TRACING_TARGET_COMPLETION,
                    model = self.model_name(),
                    "Completion stream opened"
                );
                Ok(fragments)
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET_COMPLETION,
                    model = self.model_name(),
                    error = %error,
                    "Completion stream failed to open"
                );
                Err(Error::capability(provider, error))
            }
        }
    }

    /// Wraps this provider into a [`GenerationService`].
    pub fn into_service(self) -> GenerationService {
        GenerationService::new(self)
    }
}

impl GenerationProvider for CompletionProvider {
    fn generate(&self, prompt: String) -> FragmentStream {
        let provider = self.clone();
        stream::once(async move {
            let messages = PromptMessages::parse(&prompt);
            provider.stream(&messages).await
        })
        .try_flatten()
        .boxed()
    }

    fn name(&self) -> &str {
        self.provider_name()
    }
}

fn build_request<M>(
    model: &M,
    messages: &PromptMessages,
    settings: &CompletionSettings,
) -> CompletionRequestBuilder<M>
where
    M: RigCompletionModel,
{
    let mut request = model.completion_request(messages.user.as_str());
    if let Some(system) = &messages.system {
        request = request.preamble(system.clone());
    }
    if let Some(temperature) = settings.temperature {
        request = request.temperature(temperature);
    }
    if let Some(max_tokens) = settings.max_tokens {
        request = request.max_tokens(max_tokens);
    }
    request
}

async fn send<M>(
    model: &M,
    messages: &PromptMessages,
    settings: &CompletionSettings,
) -> std::result::Result<String, CompletionError>
where
    M: RigCompletionModel,
{
    let response = build_request(model, messages, settings).send().await?;
    Ok(extract_text_content(&response.choice))
}

async fn open_stream<M>(
    model: &M,
    messages: &PromptMessages,
    settings: &CompletionSettings,
    provider: &'static str,
) -> std::result::Result<FragmentStream, CompletionError>
where
    M: RigCompletionModel,
    M::StreamingResponse: Send + 'static,
{
    let response = build_request(model, messages, settings).stream().await?;
    Ok(text_deltas(response, provider))
}

/// Keeps the text deltas of a streamed response, ending at the first error.
fn text_deltas<S, R>(response: S, provider: &'static str) -> FragmentStream
where
    S: Stream<Item = std::result::Result<StreamedAssistantContent<R>, CompletionError>>
        + Send
        + 'static,
    R: Clone + Unpin + Send + 'static,
{
    response
        .try_filter_map(|content| async move {
            Ok(match content {
                StreamedAssistantContent::Text(text) => Some(text.text),
                _ => None,
            })
        })
        .map_err(move |error| Error::capability(provider, error))
        .scan(false, |failed, item| {
            let keep = !*failed;
            *failed = item.is_err();
            future::ready(keep.then_some(item))
        })
        .boxed()
}

/// Concatenates the text parts of an assistant response.
fn extract_text_content(choice: &OneOrMany<AssistantContent>) -> String {
    choice
        .iter()
        .filter_map(|content| match content {
            AssistantContent::Text(text) => Some(text.text()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("")
}

impl std::fmt::Debug for CompletionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionProvider")
            .field("provider", &self.provider_name())
            .field("model", &self.model_name())
            .field("settings", &self.0.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ApiKeyCredentials;

    #[test]
    fn rejects_mismatched_credentials() {
        let err = CompletionProvider::connect(
            CompletionModel::Anthropic(AnthropicModel::ClaudeHaiku35),
            Credentials::OpenAi(ApiKeyCredentials::new("sk-test")),
            CompletionSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn builds_without_network() {
        let provider = CompletionProvider::openai("sk-test", OpenAiModel::Gpt4oMini).unwrap();
        assert_eq!(provider.provider_name(), "openai");
        assert_eq!(provider.model_name(), "gpt-4o-mini");
        assert_eq!(provider.settings().max_tokens, Some(4096));
        assert_eq!(provider.clone().into_service().name(), "openai");
    }

    #[test]
    fn joins_text_parts() {
        let choice = OneOrMany::many(vec![
            AssistantContent::text("Hello, "),
            AssistantContent::text("world"),
        ])
        .unwrap();
        assert_eq!(extract_text_content(&choice), "Hello, world");
    }

    type OpenAiDelta =
        StreamedAssistantContent<<openai::CompletionModel as RigCompletionModel>::StreamingResponse>;

    #[tokio::test]
    async fn streams_text_deltas_in_order() {
        let items: Vec<std::result::Result<OpenAiDelta, CompletionError>> = vec![
            Ok(StreamedAssistantContent::text("Hel")),
            Ok(StreamedAssistantContent::text("lo")),
            Ok(StreamedAssistantContent::text(", world")),
        ];

        let fragments: Vec<String> = text_deltas(stream::iter(items), "openai")
            .try_collect()
            .await
            .unwrap();
        assert_eq!(fragments, ["Hel", "lo", ", world"]);
    }

    #[tokio::test]
    async fn stream_errors_become_capability_errors() {
        let items: Vec<std::result::Result<OpenAiDelta, CompletionError>> = vec![
            Ok(StreamedAssistantContent::text("partial")),
            Err(CompletionError::ProviderError("overloaded".into())),
            Ok(StreamedAssistantContent::text("unreachable")),
        ];

        let mut fragments = text_deltas(stream::iter(items), "anthropic");
        assert_eq!(fragments.next().await.unwrap().unwrap(), "partial");
        let error = fragments.next().await.unwrap().unwrap_err();
        assert!(matches!(
            error,
            Error::Capability { ref capability, ref message }
                if capability == "anthropic" && message.contains("overloaded")
        ));
        assert!(fragments.next().await.is_none());
    }
}
