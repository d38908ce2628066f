//! Events emitted while a pipeline runs.

use serde::{Deserialize, Serialize};

/// Lifecycle and content events of a pipeline run.
///
/// Fragments of task `N` always arrive between `TaskBegin { position: N }`
/// and `TaskEnd { position: N }`, and `TaskEnd` of one task precedes
/// `TaskBegin` of the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// A task started generating.
    TaskBegin { position: usize },

    /// Incremental output of the running task.
    ContentFragment { text: String },

    /// A task finished and its output has been written to the data store.
    TaskEnd { position: usize },
}

impl PipelineEvent {
    /// Returns the task position for lifecycle events.
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::TaskBegin { position } | Self::TaskEnd { position } => Some(*position),
            Self::ContentFragment { .. } => None,
        }
    }

    /// Returns the fragment text for content events.
    pub fn fragment(&self) -> Option<&str> {
        match self {
            Self::ContentFragment { text } => Some(text),
            _ => None,
        }
    }
}
