// src/wave/state.rs

//! Per-run wave state and waves under construction.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use tracing::debug;

use crate::delay::{today, Delay};
use crate::plan::{Link, Plan, Stage, StageId};
use crate::types::DelayPolicy;
use crate::wave::dependencies::DependenciesInfo;
use crate::wave::snapshot::{TaskId, TaskResult, TaskSnapshot, TaskStatus};

/// Position of a wave in the scheduler's wave list.
pub type WaveId = usize;

/// Opaque key/value data carried by a wave for callback use.
pub type WaveData = BTreeMap<String, toml::Value>;

/// One traversal of the plan: cursors plus the snapshot history.
///
/// A wave is unresolved while its cursor list is non-empty. Once empty, every
/// stage of the plan carries a finished or skipped snapshot.
#[derive(Debug, Clone)]
pub struct Wave {
    id: WaveId,
    parent_id: Option<WaveId>,
    started_at: NaiveDate,
    resources: WaveData,
    scratchpad: WaveData,
    cursors: Vec<StageId>,
    history: Vec<TaskSnapshot>,
    /// Index into `history` of each stage's latest snapshot.
    latest_by_stage: HashMap<StageId, usize>,
    /// Index into `history` of each external task's latest snapshot.
    latest_by_task: HashMap<TaskId, usize>,
    /// Stages that ever had a non-skipped snapshot.
    live_stages: HashSet<StageId>,
}

impl Wave {
    fn new(id: WaveId, parent_id: Option<WaveId>) -> Self {
        Self {
            id,
            parent_id,
            started_at: today(),
            resources: WaveData::new(),
            scratchpad: WaveData::new(),
            cursors: Vec::new(),
            history: Vec::new(),
            latest_by_stage: HashMap::new(),
            latest_by_task: HashMap::new(),
            live_stages: HashSet::new(),
        }
    }

    pub fn id(&self) -> WaveId {
        self.id
    }

    pub fn parent_id(&self) -> Option<WaveId> {
        self.parent_id
    }

    pub fn started_at(&self) -> NaiveDate {
        self.started_at
    }

    pub fn resources(&self) -> &WaveData {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut WaveData {
        &mut self.resources
    }

    pub fn scratchpad(&self) -> &WaveData {
        &self.scratchpad
    }

    pub fn scratchpad_mut(&mut self) -> &mut WaveData {
        &mut self.scratchpad
    }

    pub fn cursors(&self) -> &[StageId] {
        &self.cursors
    }

    /// Every snapshot ever added, oldest first.
    pub fn history(&self) -> &[TaskSnapshot] {
        &self.history
    }

    pub fn history_for(&self, task: TaskId) -> Vec<&TaskSnapshot> {
        self.history
            .iter()
            .filter(|s| s.task_id == Some(task))
            .collect()
    }

    pub fn has_unresolved_tasks(&self) -> bool {
        !self.cursors.is_empty()
    }

    /// Whether the stage was materialised as a task in this wave. Skip markers
    /// do not count.
    pub fn has_related_task(&self, stage: StageId) -> bool {
        self.live_stages.contains(&stage)
    }

    pub fn latest_for_stage(&self, stage: StageId) -> Option<&TaskSnapshot> {
        self.latest_by_stage.get(&stage).map(|&i| &self.history[i])
    }

    /// # Panics
    ///
    /// Panics if the stage has no snapshot in this wave.
    pub fn snapshot_of_stage(&self, stage: StageId) -> &TaskSnapshot {
        match self.latest_for_stage(stage) {
            Some(snapshot) => snapshot,
            None => panic!("wave {} has no snapshot for stage {stage}", self.id),
        }
    }

    /// Latest snapshot of a task.
    ///
    /// # Panics
    ///
    /// Panics if the task is unknown to this wave.
    pub fn snapshot_of_task(&self, task: TaskId) -> &TaskSnapshot {
        match self.latest_by_task.get(&task) {
            Some(&i) => &self.history[i],
            None => panic!("wave {} has no snapshot for task {task}", self.id),
        }
    }

    pub fn latest_snapshot_by_stage(&self) -> BTreeMap<StageId, &TaskSnapshot> {
        self.latest_by_stage
            .iter()
            .map(|(&stage, &i)| (stage, &self.history[i]))
            .collect()
    }

    /// Latest snapshot of every external task. Marker snapshots without a
    /// task id are left out.
    pub fn latest_snapshot_by_task(&self) -> BTreeMap<TaskId, &TaskSnapshot> {
        self.latest_by_task
            .iter()
            .map(|(&task, &i)| (task, &self.history[i]))
            .collect()
    }

    pub fn query_dependencies_info(&self, stages: &[StageId]) -> DependenciesInfo {
        let deps = stages
            .iter()
            .map(|&id| {
                self.latest_for_stage(id)
                    .cloned()
                    .unwrap_or_else(|| TaskSnapshot::queued(id))
            })
            .collect();
        DependenciesInfo::new(deps)
    }

    /// Delay to apply to `stage` given the incoming links whose source
    /// resolved to `target`.
    ///
    /// `ShortestDelay` keeps the smallest qualifying link delay,
    /// `LongestDelay` the largest. Without a qualifying link the result is
    /// `Delay::none()`.
    pub fn select_delay_for<K>(
        &self,
        stage: &Stage<K>,
        policy: DelayPolicy,
        incomings: &[Link],
        target: TaskResult,
    ) -> Delay {
        let mut selected: Option<&Delay> = None;

        for link in incomings {
            let qualifies = self
                .latest_for_stage(link.from)
                .is_some_and(|s| s.did_resolve_as(target));
            if !qualifies {
                continue;
            }

            selected = match selected {
                None => Some(&link.delay),
                Some(current) => {
                    let better = match policy {
                        DelayPolicy::ShortestDelay => link.delay.less_than(current),
                        DelayPolicy::LongestDelay => link.delay.greater_than(current),
                    };
                    if better { Some(&link.delay) } else { Some(current) }
                }
            };
        }

        let delay = selected.cloned().unwrap_or_default();
        debug!(wave = self.id, stage = stage.id, ?policy, %delay, "selected delay");
        delay
    }

    /// Record a snapshot. Returns `false` (and records nothing) when the
    /// stage's latest snapshot already has the same task, status and result.
    pub(crate) fn add_snapshot(&mut self, snapshot: TaskSnapshot) -> bool {
        if let Some(latest) = self.latest_for_stage(snapshot.stage_id) {
            if latest.same_state_as(&snapshot) {
                return false;
            }
        }

        if snapshot.status != TaskStatus::Skipped {
            self.live_stages.insert(snapshot.stage_id);
        }
        self.latest_by_stage
            .insert(snapshot.stage_id, self.history.len());
        if let Some(task) = snapshot.task_id {
            self.latest_by_task.insert(task, self.history.len());
        }
        self.history.push(snapshot);
        true
    }

    pub(crate) fn add_cursor(&mut self, stage: StageId) {
        self.cursors.push(stage);
    }

    pub(crate) fn cursor_at(&self, index: usize) -> Option<StageId> {
        self.cursors.get(index).copied()
    }

    pub(crate) fn remove_cursor_at(&mut self, index: usize) -> StageId {
        self.cursors.remove(index)
    }

    /// Give every plan stage without a live task a `Skipped` snapshot.
    /// Returns how many stages were newly skipped.
    pub(crate) fn skip_fill<K>(&mut self, plan: &Plan<K>) -> usize {
        let mut skipped = 0;
        for stage in plan.stages() {
            if !self.has_related_task(stage.id) && self.add_snapshot(TaskSnapshot::skipped(stage.id)) {
                skipped += 1;
            }
        }
        skipped
    }
}

/// A wave that has not been given an id yet.
///
/// Callbacks build one of these to request a sibling wave. The scheduler
/// turns it into a [`Wave`] with [`PendingWave::commit`] when it appends it to
/// the wave list.
#[derive(Debug, Clone, Default)]
pub struct PendingWave {
    parent_id: Option<WaveId>,
    resources: WaveData,
    scratchpad: WaveData,
    cursors: Vec<StageId>,
    snapshots: Vec<TaskSnapshot>,
}

impl PendingWave {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child_of(parent: WaveId) -> Self {
        Self {
            parent_id: Some(parent),
            ..Self::default()
        }
    }

    pub fn parent_id(&self) -> Option<WaveId> {
        self.parent_id
    }

    pub fn cursors(&self) -> &[StageId] {
        &self.cursors
    }

    pub fn with_resource(mut self, key: &str, value: impl Into<toml::Value>) -> Self {
        self.resources.insert(key.to_string(), value.into());
        self
    }

    pub fn with_scratch(mut self, key: &str, value: impl Into<toml::Value>) -> Self {
        self.scratchpad.insert(key.to_string(), value.into());
        self
    }

    /// Record `snapshot` and track its stage as a cursor.
    pub fn seed(mut self, snapshot: TaskSnapshot) -> Self {
        self.cursors.push(snapshot.stage_id);
        self.snapshots.push(snapshot);
        self
    }

    /// Record a snapshot without adding a cursor.
    pub fn add_snapshot(&mut self, snapshot: TaskSnapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn add_cursor(&mut self, stage: StageId) {
        self.cursors.push(stage);
    }

    /// Assign the id and produce the live wave.
    pub fn commit(self, id: WaveId) -> Wave {
        let mut wave = Wave::new(id, self.parent_id);
        wave.resources = self.resources;
        wave.scratchpad = self.scratchpad;
        for snapshot in self.snapshots {
            wave.add_snapshot(snapshot);
        }
        wave.cursors = self.cursors;
        wave
    }
}
