//! Pipeline configuration.

use derive_builder::Builder;
use promptline_core::Template;
use serde::{Deserialize, Serialize};

use crate::keys::INPUT_TEXT;

/// Configuration for pipeline execution.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(try_from = "UncheckedConfig")]
pub struct PipelineConfig {
    /// Data key the run input is stored under.
    #[builder(default = "INPUT_TEXT.to_string()")]
    pub input_key: String,

    /// Whether tasks see the transcript of earlier tasks.
    #[builder(default = "true")]
    pub include_chat_history: bool,
}

impl PipelineConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(key) = &self.input_key {
            let template = Template::parse(&format!("{{{key}}}"))
                .map_err(|_| format!("input_key '{key}' is not a valid placeholder name"))?;
            if template.placeholders().count() != 1 {
                return Err(format!("input_key '{key}' is not a valid placeholder name"));
            }
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_key: INPUT_TEXT.to_string(),
            include_chat_history: true,
        }
    }
}

/// Deserialized fields, checked by the builder before use.
#[derive(Deserialize)]
#[serde(default)]
struct UncheckedConfig {
    input_key: String,
    include_chat_history: bool,
}

impl Default for UncheckedConfig {
    fn default() -> Self {
        let PipelineConfig {
            input_key,
            include_chat_history,
        } = PipelineConfig::default();
        Self {
            input_key,
            include_chat_history,
        }
    }
}

impl TryFrom<UncheckedConfig> for PipelineConfig {
    type Error = String;

    fn try_from(config: UncheckedConfig) -> Result<Self, Self::Error> {
        PipelineConfigBuilder::default()
            .input_key(config.input_key)
            .include_chat_history(config.include_chat_history)
            .build()
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_match_default() {
        let config = PipelineConfigBuilder::default().build().unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn rejects_invalid_input_key() {
        assert!(PipelineConfigBuilder::default().input_key("").build().is_err());
        assert!(PipelineConfigBuilder::default().input_key("a b").build().is_err());
        assert!(PipelineConfigBuilder::default().input_key("a}{b").build().is_err());

        let config = PipelineConfigBuilder::default()
            .input_key("topic")
            .include_chat_history(false)
            .build()
            .unwrap();
        assert_eq!(config.input_key, "topic");
        assert!(!config.include_chat_history);
    }

    #[test]
    fn deserializes_partial_config() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"include_chat_history":false}"#).unwrap();
        assert_eq!(config.input_key, "input_text");
        assert!(!config.include_chat_history);
    }

    #[test]
    fn deserialization_validates_input_key() {
        let error = serde_json::from_str::<PipelineConfig>(r#"{"input_key":"a b"}"#).unwrap_err();
        assert!(error.to_string().contains("not a valid placeholder name"));

        let config: PipelineConfig = serde_json::from_str(r#"{"input_key":"topic"}"#).unwrap();
        assert_eq!(config.input_key, "topic");
        assert!(config.include_chat_history);
    }
}
