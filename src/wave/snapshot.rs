// src/wave/snapshot.rs

//! Point-in-time task records.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::delay::{today, Delay};
use crate::plan::StageId;

/// Identifier of an external task; allocated by whoever materialises tasks.
pub type TaskId = u64;

/// Lifecycle status of a task as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Placeholder for a dependency that has no task yet.
    Queued,
    /// Scheduled for a future date.
    Initialized,
    /// Materialising now.
    Ready,
    Completed,
    Skipped,
}

impl TaskStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Skipped)
    }

    pub fn is_active(self) -> bool {
        matches!(self, TaskStatus::Ready)
    }

    pub fn is_pending(self) -> bool {
        matches!(self, TaskStatus::Queued | TaskStatus::Initialized)
    }
}

/// Outcome of a task; only meaningful once the status is finished.
///
/// Skip snapshots carry `Fail`, so predicates that care about real failures
/// must also look at the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskResult {
    Success,
    Fail,
}

/// Immutable record of a task's status at one moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSnapshot {
    /// `None` for engine-made markers (skips, queued placeholders) that have
    /// no external task behind them.
    pub task_id: Option<TaskId>,
    pub stage_id: StageId,
    pub taken_at: NaiveDate,
    pub status: TaskStatus,
    pub result: TaskResult,
}

impl TaskSnapshot {
    pub fn new(
        task_id: Option<TaskId>,
        stage_id: StageId,
        taken_at: NaiveDate,
        status: TaskStatus,
        result: TaskResult,
    ) -> Self {
        Self {
            task_id,
            stage_id,
            taken_at,
            status,
            result,
        }
    }

    pub fn activated(task_id: TaskId, stage_id: StageId) -> Self {
        Self::new(
            Some(task_id),
            stage_id,
            today(),
            TaskStatus::Ready,
            TaskResult::Success,
        )
    }

    /// A task deferred by `delay`; `taken_at` is the date it becomes due.
    pub fn later(task_id: TaskId, stage_id: StageId, delay: &Delay) -> Self {
        Self::new(
            Some(task_id),
            stage_id,
            delay.apply_to(today()),
            TaskStatus::Initialized,
            TaskResult::Success,
        )
    }

    pub fn succeeded(task_id: TaskId, stage_id: StageId) -> Self {
        Self::completed(task_id, stage_id, TaskResult::Success)
    }

    pub fn failed(task_id: TaskId, stage_id: StageId) -> Self {
        Self::completed(task_id, stage_id, TaskResult::Fail)
    }

    pub fn completed(task_id: TaskId, stage_id: StageId, result: TaskResult) -> Self {
        Self::new(Some(task_id), stage_id, today(), TaskStatus::Completed, result)
    }

    pub fn skipped(stage_id: StageId) -> Self {
        Self::new(None, stage_id, today(), TaskStatus::Skipped, TaskResult::Fail)
    }

    pub fn queued(stage_id: StageId) -> Self {
        Self::new(None, stage_id, today(), TaskStatus::Queued, TaskResult::Fail)
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    /// Finished with `result`; a skip never counts as a `Success`.
    pub fn did_resolve_as(&self, result: TaskResult) -> bool {
        self.is_finished() && self.result == result
    }

    /// Same task, status and result; `taken_at` is ignored.
    pub(crate) fn same_state_as(&self, other: &TaskSnapshot) -> bool {
        self.task_id == other.task_id && self.status == other.status && self.result == other.result
    }
}
