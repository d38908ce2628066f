//! Chat history synthesized from completed tasks.

use promptline_core::{PromptMessages, WorkflowData};

use crate::Task;

/// Heading placed before the transcript inside the system segment.
const SECTION_HEADING: &str = "Chat history:";

/// One completed exchange: a task's prompt source and its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    /// The user segment of the task template, placeholders unresolved.
    pub user: String,
    /// The task output.
    pub assistant: String,
}

/// Transcript of the tasks completed earlier in a run.
///
/// The user side of every turn is the template source, not its rendering:
/// `{input_text}` appears as written, and the referenced value is already
/// visible in the assistant side of earlier turns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatHistory {
    turns: Vec<ChatTurn>,
}

impl ChatHistory {
    /// Builds the history of `completed` tasks, reading their outputs from
    /// `data`.
    pub fn from_tasks(completed: &[Task], data: &WorkflowData) -> Self {
        let turns = completed
            .iter()
            .map(|task| {
                let source = task.template().to_string();
                ChatTurn {
                    user: prompt_source(&source).to_string(),
                    assistant: data
                        .get_text(&task.output_key())
                        .map(|text| text.into_owned())
                        .unwrap_or_default(),
                }
            })
            .collect();

        Self { turns }
    }

    /// Returns the turns in task order.
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// Returns the number of turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns true if no task has completed.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Formats the turns as `User: ...\nAssistant: ...` blocks separated by
    /// a blank line. Empty when there are no turns.
    pub fn transcript(&self) -> String {
        self.turns
            .iter()
            .map(|turn| format!("User: {}\nAssistant: {}", turn.user, turn.assistant))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Returns the text substituted for `{chat_history_section}`.
    ///
    /// Empty when there are no turns, so the first task's system segment
    /// ends with its own context.
    pub fn section(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        format!("\n\n{SECTION_HEADING}\n{}", self.transcript())
    }
}

/// Returns the user segment of a task template as written.
///
/// Only the line breaks the task wrapper puts around `{task_prompt}` are
/// removed; the prompt itself keeps its spacing.
fn prompt_source(source: &str) -> &str {
    let segment = PromptMessages::user_segment(source);
    let segment = segment.strip_prefix('\n').unwrap_or(segment);
    segment.strip_suffix('\n').unwrap_or(segment)
}
