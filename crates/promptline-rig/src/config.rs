//! Configuration for the rig, search and fetch providers.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use promptline_core::provider::{FetchService, GenerationService, SearchService};
use promptline_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::provider::{
    ApiKeyCredentials, CompletionModel, CompletionProvider, CompletionSettings, Credentials,
    ProviderKind,
};
use crate::web::{HttpConfig, PageFetcher, SerpApiSearch};

/// Provider selection, credentials and request settings.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct RigConfig {
    /// Completion provider used by tasks without a model override.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "PROMPTLINE_PROVIDER", default_value = "openai")
    )]
    pub provider: ProviderKind,

    /// Default model identifier.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "PROMPTLINE_MODEL", default_value = "gpt-4o-mini")
    )]
    pub model: String,

    /// Sampling temperature.
    #[cfg_attr(feature = "config", arg(long, env = "PROMPTLINE_TEMPERATURE"))]
    pub temperature: Option<f64>,

    /// Upper bound on generated tokens per task.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "PROMPTLINE_MAX_TOKENS", default_value = "4096")
    )]
    pub max_tokens: u64,

    /// OpenAI API key.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "OPENAI_API_KEY", hide_env_values = true)
    )]
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,

    /// Anthropic API key.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)
    )]
    #[serde(skip_serializing)]
    pub anthropic_api_key: Option<String>,

    /// SerpAPI key for web search.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "SERPAPI_API_KEY", hide_env_values = true)
    )]
    #[serde(skip_serializing)]
    pub serpapi_api_key: Option<String>,

    /// Timeout of search and fetch requests, in seconds.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "PROMPTLINE_HTTP_TIMEOUT_SECS", default_value = "30")
    )]
    pub http_timeout_secs: u64,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            model: "gpt-4o-mini".to_string(),
            temperature: None,
            max_tokens: 4096,
            openai_api_key: None,
            anthropic_api_key: None,
            serpapi_api_key: None,
            http_timeout_secs: 30,
        }
    }
}

impl RigConfig {
    /// Validates the settings without touching the network.
    pub fn validate(&self) -> Result<()> {
        CompletionModel::parse_for(self.provider, &self.model)?;
        if let Some(temperature) = self.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(Error::config("temperature must be between 0.0 and 2.0"));
        }
        if self.max_tokens == 0 {
            return Err(Error::config("max_tokens must be at least 1"));
        }
        self.http_config().validate()
    }

    /// Returns the HTTP settings for search and fetch.
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig::default().with_timeout(Duration::from_secs(self.http_timeout_secs))
    }

    /// Returns the per-request completion settings.
    pub fn completion_settings(&self) -> CompletionSettings {
        CompletionSettings {
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
        }
    }

    /// Creates the default generator.
    pub fn generation_service(&self) -> Result<GenerationService> {
        let model = CompletionModel::parse_for(self.provider, &self.model)?;
        self.connect(model)
    }

    /// Creates a generator for `model`, inferring its provider from the name.
    pub fn generation_service_for(&self, model: &str) -> Result<GenerationService> {
        self.connect(model.parse()?)
    }

    /// Creates the search service, if a SerpAPI key is configured.
    pub fn search_service(&self) -> Result<Option<SearchService>> {
        let Some(key) = self.serpapi_api_key.as_deref() else {
            return Ok(None);
        };
        let search = SerpApiSearch::new(key, &self.http_config())?;
        Ok(Some(search.into_service()))
    }

    /// Creates the page fetch service.
    pub fn fetch_service(&self) -> Result<FetchService> {
        Ok(PageFetcher::new(&self.http_config())?.into_service())
    }

    fn connect(&self, model: CompletionModel) -> Result<GenerationService> {
        let credentials = self.credentials(model.provider())?;
        let provider = CompletionProvider::connect(model, credentials, self.completion_settings())?;
        Ok(provider.into_service())
    }

    fn credentials(&self, provider: ProviderKind) -> Result<Credentials> {
        let (key, env) = match provider {
            ProviderKind::OpenAi => (&self.openai_api_key, "OPENAI_API_KEY"),
            ProviderKind::Anthropic => (&self.anthropic_api_key, "ANTHROPIC_API_KEY"),
        };
        let key = key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::config(format!("{provider} requires an API key ({env})")))?;

        let credentials = ApiKeyCredentials::new(key);
        Ok(match provider {
            ProviderKind::OpenAi => Credentials::OpenAi(credentials),
            ProviderKind::Anthropic => Credentials::Anthropic(credentials),
        })
    }
}

impl std::fmt::Debug for RigConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RigConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("openai_api_key", &self.openai_api_key.is_some())
            .field("anthropic_api_key", &self.anthropic_api_key.is_some())
            .field("serpapi_api_key", &self.serpapi_api_key.is_some())
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(RigConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_model_of_other_provider() {
        let config = RigConfig {
            provider: ProviderKind::Anthropic,
            ..RigConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_out_of_range_settings() {
        let config = RigConfig {
            temperature: Some(3.5),
            ..RigConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RigConfig {
            http_timeout_secs: 0,
            ..RigConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let err = RigConfig::default().generation_service().unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn builds_services_from_keys() {
        let config = RigConfig {
            openai_api_key: Some("sk-test".into()),
            anthropic_api_key: Some("sk-ant-test".into()),
            serpapi_api_key: Some("serp-test".into()),
            ..RigConfig::default()
        };

        assert_eq!(config.generation_service().unwrap().name(), "openai");
        assert_eq!(
            config
                .generation_service_for("claude-3-5-haiku-20241022")
                .unwrap()
                .name(),
            "anthropic"
        );
        assert!(config.search_service().unwrap().is_some());
        assert!(config.fetch_service().is_ok());
        assert!(!format!("{config:?}").contains("sk-test"));
    }

    #[test]
    fn search_is_optional() {
        assert!(RigConfig::default().search_service().unwrap().is_none());
    }
}
