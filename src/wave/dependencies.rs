// src/wave/dependencies.rs

//! Derived view over the resolution of a set of dependency stages.

use crate::wave::snapshot::{TaskResult, TaskSnapshot, TaskStatus};

/// Latest known snapshot of each dependency, or a `Queued` placeholder for
/// dependencies that have no task in the wave yet.
///
/// Built on demand by [`Wave::query_dependencies_info`](crate::wave::Wave::query_dependencies_info);
/// never stored.
#[derive(Debug, Clone)]
pub struct DependenciesInfo {
    deps: Vec<TaskSnapshot>,
}

impl DependenciesInfo {
    pub fn new(deps: Vec<TaskSnapshot>) -> Self {
        Self { deps }
    }

    pub fn snapshots(&self) -> &[TaskSnapshot] {
        &self.deps
    }

    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    /// Every dependency finished with `target`. Vacuously true when empty.
    pub fn all_did_resolve_as(&self, target: TaskResult) -> bool {
        self.deps.iter().all(|s| s.did_resolve_as(target))
    }

    /// Every dependency finished (completed or skipped).
    pub fn all_did_resolve(&self) -> bool {
        self.deps.iter().all(|s| s.is_finished())
    }

    pub fn any_did_resolve_as(&self, target: TaskResult) -> bool {
        self.deps.iter().any(|s| s.did_resolve_as(target))
    }

    /// At least one dependency ran and failed; skips do not count.
    pub fn any_did_fail(&self) -> bool {
        self.deps
            .iter()
            .any(|s| s.status == TaskStatus::Completed && s.result == TaskResult::Fail)
    }

    /// Every dependency ran and failed. Skips do not count as failures.
    pub fn all_did_fail(&self) -> bool {
        self.deps
            .iter()
            .all(|s| s.status == TaskStatus::Completed && s.result == TaskResult::Fail)
    }

    pub fn any_did_skip(&self) -> bool {
        self.deps.iter().any(|s| s.status == TaskStatus::Skipped)
    }
}
