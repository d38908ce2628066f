#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod clock;
mod event;
mod history;
pub mod pipeline;
mod progress;
pub mod session;
pub mod task;
mod transcript;

pub use clock::{Ambient, Clock, FixedClock, SystemClock};
pub use event::PipelineEvent;
pub use history::{ChatHistory, ChatTurn};
pub use pipeline::{Pipeline, PipelineConfig, PipelineConfigBuilder};
pub use progress::{ProgressSnapshot, RunProgress, RunStatus};
pub use promptline_core::{Error, Result};
pub use session::{PipelineDefinition, PipelineRun, PipelineSession};
pub use task::{Task, TaskDefinition};
pub use transcript::Transcript;

/// Tracing target for runtime operations.
pub const TRACING_TARGET: &str = "promptline_runtime";

/// Render-context keys supplied by the executor for every task.
pub mod keys {
    /// The task's system context source.
    pub const SYSTEM_CONTEXT: &str = "system_context";
    /// The task's prompt source.
    pub const TASK_PROMPT: &str = "task_prompt";
    /// Transcript of the tasks completed earlier in the run.
    pub const CHAT_HISTORY_SECTION: &str = "chat_history_section";
    /// Run start date, `%Y-%m-%d`.
    pub const CURRENT_DATE: &str = "current_date";
    /// Run start time, `%H:%M:%S`.
    pub const CURRENT_TIME: &str = "current_time";
    /// Default key of the free-form run input.
    pub const INPUT_TEXT: &str = "input_text";
}
