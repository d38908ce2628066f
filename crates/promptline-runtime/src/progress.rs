//! Run progress shared with the host while events are streamed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum RunStatus {
    /// The run has not started.
    Idle = 0,
    /// Tasks are executing.
    Running = 1,
    /// Every task finished.
    Completed = 2,
    /// A task failed and the run stopped.
    Failed = 3,
}

impl RunStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Completed,
            3 => Self::Failed,
            _ => Self::Idle,
        }
    }
}

/// Point-in-time view of a run's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Position of the task executing or last executed; 0 before the run.
    pub current: usize,
    /// Number of tasks in the run.
    pub total: usize,
    /// Run state.
    pub status: RunStatus,
}

#[derive(Debug, Default)]
struct Inner {
    current: AtomicUsize,
    total: AtomicUsize,
    status: AtomicU8,
}

/// Progress handle of a pipeline.
///
/// Cheap to clone; every clone observes the same run.
#[derive(Debug, Clone, Default)]
pub struct RunProgress {
    inner: Arc<Inner>,
}

impl RunProgress {
    /// Creates an idle progress handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            current: self.inner.current.load(Ordering::Acquire),
            total: self.inner.total.load(Ordering::Acquire),
            status: self.status(),
        }
    }

    /// Returns the position of the task executing or last executed.
    pub fn current_task(&self) -> Option<usize> {
        match self.inner.current.load(Ordering::Acquire) {
            0 => None,
            position => Some(position),
        }
    }

    /// Returns the run state.
    pub fn status(&self) -> RunStatus {
        RunStatus::from_u8(self.inner.status.load(Ordering::Acquire))
    }

    pub(crate) fn start(&self, total: usize) {
        self.inner.current.store(0, Ordering::Release);
        self.inner.total.store(total, Ordering::Release);
        self.set_status(RunStatus::Running);
    }

    pub(crate) fn advance(&self, position: usize) {
        self.inner.current.store(position, Ordering::Release);
    }

    pub(crate) fn complete(&self) {
        self.set_status(RunStatus::Completed);
    }

    pub(crate) fn fail(&self) {
        self.set_status(RunStatus::Failed);
    }

    fn set_status(&self, status: RunStatus) {
        self.inner.status.store(status as u8, Ordering::Release);
    }
}
