//! User-authored task definitions.

use promptline_core::{PromptMessages, Result, Template};
use serde::{Deserialize, Serialize};

use crate::keys::{SYSTEM_CONTEXT, TASK_PROMPT};

/// Fixed prompt wrapper every task is rendered through.
pub(crate) const TASK_WRAPPER: &str = "<system>
Current date: {current_date}
Current time: {current_time}

{system_context}{chat_history_section}
</system>
<user>
{task_prompt}
</user>";

/// The editable part of a task: its system context, its prompt and an
/// optional model override.
///
/// Both texts are templates and are validated when the definition is
/// created or deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Instructions placed in the system segment.
    pub system_context: Template,
    /// The user request.
    pub task_prompt: Template,
    /// Model used instead of the session default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl TaskDefinition {
    /// Parses both templates.
    pub fn new(system_context: &str, task_prompt: &str) -> Result<Self> {
        Ok(Self {
            system_context: Template::parse(system_context)?,
            task_prompt: Template::parse(task_prompt)?,
            model: None,
        })
    }

    /// Parses a single `<system>...</system><user>...</user>` prompt.
    ///
    /// Text outside the markers is treated as the task prompt.
    pub fn from_tagged(source: &str) -> Result<Self> {
        let messages = PromptMessages::parse(source);
        Self::new(messages.system.as_deref().unwrap_or_default(), &messages.user)
    }

    /// Sets the model override.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Builds the full task template: the wrapper with both texts spliced in.
    pub fn to_template(&self) -> Result<Template> {
        let wrapper = Template::parse(TASK_WRAPPER)?;
        Ok(wrapper
            .splice(SYSTEM_CONTEXT, &self.system_context)
            .splice(TASK_PROMPT, &self.task_prompt))
    }

    /// A first task that restyles the run input.
    pub fn first_example() -> Result<Self> {
        Self::new(
            "You always echo what USER says in Shakespearean English.",
            "{input_text}",
        )
    }

    /// A follow-up task that builds on the first task's output.
    pub fn follow_up_example() -> Result<Self> {
        Self::new(
            "You are an amazing playwright.",
            "Please write the first two paragraphs of a play inspired by:\n{task_1_output}",
        )
    }
}
