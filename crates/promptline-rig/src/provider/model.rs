//! Type-safe completion model references.

use std::fmt;
use std::str::FromStr;

use promptline_core::Error;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Completion provider family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ProviderKind {
    /// OpenAI chat completions.
    #[serde(rename = "openai")]
    #[strum(serialize = "openai")]
    OpenAi,
    /// Anthropic messages.
    Anthropic,
}

/// OpenAI completion models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OpenAiModel {
    /// GPT-4o (multimodal flagship)
    #[serde(rename = "gpt-4o")]
    #[strum(serialize = "gpt-4o")]
    Gpt4o,
    /// GPT-4o mini (fast, affordable)
    #[serde(rename = "gpt-4o-mini")]
    #[strum(serialize = "gpt-4o-mini")]
    Gpt4oMini,
    /// GPT-4.1
    #[serde(rename = "gpt-4.1")]
    #[strum(serialize = "gpt-4.1")]
    Gpt41,
    /// GPT-4.1 mini
    #[serde(rename = "gpt-4.1-mini")]
    #[strum(serialize = "gpt-4.1-mini")]
    Gpt41Mini,
    /// o3 mini (reasoning)
    #[serde(rename = "o3-mini")]
    #[strum(serialize = "o3-mini")]
    O3Mini,
}

/// Anthropic models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AnthropicModel {
    /// Claude Opus 4 (most capable)
    #[serde(rename = "claude-opus-4-20250514")]
    #[strum(serialize = "claude-opus-4-20250514")]
    ClaudeOpus4,
    /// Claude Sonnet 4 (balanced)
    #[serde(rename = "claude-sonnet-4-20250514")]
    #[strum(serialize = "claude-sonnet-4-20250514")]
    ClaudeSonnet4,
    /// Claude Haiku 3.5 (fast)
    #[serde(rename = "claude-3-5-haiku-20241022")]
    #[strum(serialize = "claude-3-5-haiku-20241022")]
    ClaudeHaiku35,
}

/// Reference to a completion model of a specific provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "provider", content = "model", rename_all = "snake_case")]
pub enum CompletionModel {
    /// OpenAI completion models.
    #[serde(rename = "openai")]
    OpenAi(OpenAiModel),
    /// Anthropic models.
    Anthropic(AnthropicModel),
}

impl CompletionModel {
    /// Returns the model identifier.
    pub fn as_str(&self) -> &str {
        match self {
            Self::OpenAi(m) => m.as_ref(),
            Self::Anthropic(m) => m.as_ref(),
        }
    }

    /// Returns the provider family.
    pub fn provider(&self) -> ProviderKind {
        match self {
            Self::OpenAi(_) => ProviderKind::OpenAi,
            Self::Anthropic(_) => ProviderKind::Anthropic,
        }
    }

    /// Parses `name` as a model of `provider`.
    pub fn parse_for(provider: ProviderKind, name: &str) -> promptline_core::Result<Self> {
        let model = match provider {
            ProviderKind::OpenAi => OpenAiModel::from_str(name).map(Self::OpenAi),
            ProviderKind::Anthropic => AnthropicModel::from_str(name).map(Self::Anthropic),
        };
        model.map_err(|_| Error::config(format!("unknown {provider} model '{name}'")))
    }
}

impl FromStr for CompletionModel {
    type Err = Error;

    /// Resolves a bare model identifier to its provider.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::parse_for(ProviderKind::OpenAi, name)
            .or_else(|_| Self::parse_for(ProviderKind::Anthropic, name))
            .map_err(|_| Error::config(format!("unknown model '{name}'")))
    }
}

impl fmt::Display for CompletionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_provider_from_name() {
        let model: CompletionModel = "claude-sonnet-4-20250514".parse().unwrap();
        assert_eq!(model, CompletionModel::Anthropic(AnthropicModel::ClaudeSonnet4));
        assert_eq!(model.provider(), ProviderKind::Anthropic);

        let model: CompletionModel = "gpt-4o-mini".parse().unwrap();
        assert_eq!(model.as_str(), "gpt-4o-mini");
        assert_eq!(model.provider().to_string(), "openai");
    }

    #[test]
    fn rejects_unknown_or_mismatched_models() {
        assert!("gpt-2".parse::<CompletionModel>().is_err());
        assert!(CompletionModel::parse_for(ProviderKind::Anthropic, "gpt-4o").is_err());
    }

    #[test]
    fn provider_kind_parses_case_insensitively() {
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!("anthropic".parse::<ProviderKind>().unwrap(), ProviderKind::Anthropic);
    }

    #[test]
    fn serializes_with_provider_tag() {
        let model = CompletionModel::OpenAi(OpenAiModel::Gpt41);
        assert_eq!(
            serde_json::to_string(&model).unwrap(),
            r#"{"provider":"openai","model":"gpt-4.1"}"#
        );
    }
}
