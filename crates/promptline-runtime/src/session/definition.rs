//! Serializable pipeline definitions.

use serde::{Deserialize, Serialize};

use crate::{PipelineConfig, TaskDefinition};

/// A pipeline as stored in a definition file.
///
/// ```json
/// {
///   "config": { "include_chat_history": true },
///   "tasks": [
///     { "system_context": "You are terse.", "task_prompt": "{input_text}" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    /// Execution settings.
    #[serde(default)]
    pub config: PipelineConfig,
    /// Tasks in execution order.
    pub tasks: Vec<TaskDefinition>,
}

impl PipelineDefinition {
    /// The two-step example pipeline: restyle the input, then write a play
    /// inspired by it.
    pub fn example() -> promptline_core::Result<Self> {
        Ok(Self {
            config: PipelineConfig::default(),
            tasks: vec![
                TaskDefinition::first_example()?,
                TaskDefinition::follow_up_example()?,
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_survives_json() {
        let example = PipelineDefinition::example().unwrap();
        let json = serde_json::to_string_pretty(&example).unwrap();
        let parsed: PipelineDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, example);
    }

    #[test]
    fn config_is_optional() {
        let parsed: PipelineDefinition =
            serde_json::from_str(r#"{"tasks":[{"system_context":"","task_prompt":"hi"}]}"#)
                .unwrap();
        assert_eq!(parsed.config, PipelineConfig::default());
        assert_eq!(parsed.tasks.len(), 1);
    }

    #[test]
    fn rejects_unusable_input_key() {
        let result = serde_json::from_str::<PipelineDefinition>(
            r#"{"config":{"input_key":"a b"},"tasks":[{"system_context":"","task_prompt":"hi"}]}"#,
        );
        assert!(result.is_err());
    }
}
