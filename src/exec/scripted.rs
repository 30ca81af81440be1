// src/exec/scripted.rs

//! Scripted task backend.
//!
//! Plays the role of the external task system for plans of
//! [`StandardKind`] stages: every stage has a [`StageScript`] that says how
//! its task ends and how long it takes. Time is a virtual calendar moved by
//! [`ScriptedDispatcher::tick`], so runs are deterministic.

use std::collections::{BTreeMap, HashMap};

use chrono::{Days, NaiveDate};
use serde::Deserialize;
use tracing::{debug, trace};

use crate::delay::{today, Delay};
use crate::engine::{DependencyDecision, Dispatcher, StageCallbacks};
use crate::plan::{Link, Stage, StageId};
use crate::rules::{StandardKind, StandardRules};
use crate::types::ExecutionMode;
use crate::wave::{TaskId, TaskResult, TaskSnapshot, TaskStatus, Wave, WaveHandle, WaveStart};

/// How the task of one stage behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StageScript {
    pub outcome: TaskResult,
    pub mode: ExecutionMode,
    /// Ticks a deferred task stays `Ready` before finishing.
    pub ticks: u32,
}

impl Default for StageScript {
    fn default() -> Self {
        Self {
            outcome: TaskResult::Success,
            mode: ExecutionMode::Immediate,
            ticks: 1,
        }
    }
}

impl StageScript {
    pub fn immediate(outcome: TaskResult) -> Self {
        Self {
            outcome,
            ..Self::default()
        }
    }

    pub fn deferred(outcome: TaskResult, ticks: u32) -> Self {
        Self {
            outcome,
            mode: ExecutionMode::Deferred,
            ticks,
        }
    }
}

#[derive(Debug, Clone)]
struct ScriptedTask {
    stage: StageId,
    script: StageScript,
    status: TaskStatus,
    result: TaskResult,
    /// Due date while `Initialized`, otherwise the date of the last change.
    date: NaiveDate,
    remaining: u32,
}

impl ScriptedTask {
    fn snapshot(&self, id: TaskId) -> TaskSnapshot {
        TaskSnapshot::new(Some(id), self.stage, self.date, self.status, self.result)
    }

    /// Start running on `date`.
    fn release(&mut self, date: NaiveDate) {
        self.date = date;
        match self.script.mode {
            ExecutionMode::Immediate => self.finish(date),
            ExecutionMode::Deferred => {
                self.status = TaskStatus::Ready;
                self.remaining = self.script.ticks.max(1);
            }
        }
    }

    fn finish(&mut self, date: NaiveDate) {
        self.date = date;
        self.status = TaskStatus::Completed;
        self.result = self.script.outcome;
        self.remaining = 0;
    }
}

/// [`Dispatcher`] for [`StandardKind`] plans backed by per-stage scripts.
///
/// Decisions come from [`StandardRules`]. Stages without a script run the
/// default one: succeed immediately.
#[derive(Debug, Clone)]
pub struct ScriptedDispatcher {
    rules: StandardRules,
    scripts: HashMap<StageId, StageScript>,
    tasks: BTreeMap<TaskId, ScriptedTask>,
    next_task: TaskId,
    clock: NaiveDate,
}

impl Default for ScriptedDispatcher {
    fn default() -> Self {
        Self::new(StandardRules::default(), HashMap::new())
    }
}

impl ScriptedDispatcher {
    pub fn new(rules: StandardRules, scripts: HashMap<StageId, StageScript>) -> Self {
        Self {
            rules,
            scripts,
            tasks: BTreeMap::new(),
            next_task: 1,
            clock: today(),
        }
    }

    pub fn with_script(mut self, stage: StageId, script: StageScript) -> Self {
        self.scripts.insert(stage, script);
        self
    }

    pub fn rules(&self) -> &StandardRules {
        &self.rules
    }

    pub fn script_for(&self, stage: StageId) -> StageScript {
        self.scripts.get(&stage).copied().unwrap_or_default()
    }

    /// Current date of the virtual calendar.
    pub fn clock(&self) -> NaiveDate {
        self.clock
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn task_status(&self, task: TaskId) -> Option<TaskStatus> {
        self.tasks.get(&task).map(|t| t.status)
    }

    /// Ids of tasks materialised for `stage`, oldest first.
    pub fn tasks_for_stage(&self, stage: StageId) -> Vec<TaskId> {
        self.tasks
            .iter()
            .filter(|(_, t)| t.stage == stage)
            .map(|(&id, _)| id)
            .collect()
    }

    /// Advance the calendar by `days`.
    ///
    /// Tasks whose due date has arrived start running; deferred tasks that
    /// were already running count down one tick and finish at zero.
    pub fn tick(&mut self, days: u32) {
        self.clock = self
            .clock
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX);
        let now = self.clock;

        for (id, task) in self.tasks.iter_mut() {
            match task.status {
                TaskStatus::Initialized if task.date <= now => {
                    task.release(now);
                    trace!(task = id, stage = task.stage, status = ?task.status, "task released");
                }
                TaskStatus::Ready => {
                    task.remaining = task.remaining.saturating_sub(1);
                    if task.remaining == 0 {
                        task.finish(now);
                        trace!(task = id, stage = task.stage, "deferred task finished");
                    }
                }
                _ => {}
            }
        }
    }

    /// Finish a task now with its scripted outcome.
    ///
    /// # Panics
    ///
    /// Panics if the task is unknown.
    pub fn complete_task(&mut self, task: TaskId) {
        let now = self.clock;
        match self.tasks.get_mut(&task) {
            Some(t) => t.finish(now),
            None => panic!("unknown scripted task {task}"),
        }
    }

    /// Finish every running task. Returns how many were finished.
    pub fn complete_active(&mut self) -> usize {
        let now = self.clock;
        let mut finished = 0;
        for task in self.tasks.values_mut() {
            if task.status.is_active() {
                task.finish(now);
                finished += 1;
            }
        }
        finished
    }

    /// A due date at or before the clock releases the task at once, so a
    /// delay that nets out negative behaves like no delay.
    fn materialise(&mut self, stage: &Stage<StandardKind>, delay: &Delay) -> TaskSnapshot {
        let id = self.next_task;
        self.next_task += 1;

        let effective = delay.add(&stage.delay);
        let due = effective.apply_to(self.clock);
        let mut task = ScriptedTask {
            stage: stage.id,
            script: self.script_for(stage.id),
            status: TaskStatus::Initialized,
            result: TaskResult::Success,
            date: due,
            remaining: 0,
        };

        if due <= self.clock {
            task.release(self.clock);
        }

        debug!(
            task = id,
            stage = stage.id,
            delay = %effective,
            status = ?task.status,
            "materialised scripted task"
        );

        let snapshot = task.snapshot(id);
        self.tasks.insert(id, task);
        snapshot
    }
}

impl StageCallbacks<StandardKind> for ScriptedDispatcher {
    fn on_dependencies_updated(
        &mut self,
        wave: &mut WaveHandle<'_>,
        stage: &Stage<StandardKind>,
        dependencies: &[StageId],
    ) -> DependencyDecision {
        self.rules.on_dependencies_updated(wave, stage, dependencies)
    }

    fn on_backward_link(
        &mut self,
        wave: &Wave,
        stage: &Stage<StandardKind>,
        incomings: &[Link],
        source: StageId,
    ) -> Option<WaveStart> {
        self.rules.on_backward_link(wave, stage, incomings, source)
    }

    fn schedule_task(
        &mut self,
        _wave: &Wave,
        stage: &Stage<StandardKind>,
        _incomings: &[Link],
        delay: &Delay,
    ) -> TaskSnapshot {
        self.materialise(stage, delay)
    }
}

impl Dispatcher<StandardKind> for ScriptedDispatcher {
    fn callbacks_for(&mut self, _kind: &StandardKind) -> &mut dyn StageCallbacks<StandardKind> {
        self
    }

    /// # Panics
    ///
    /// Panics if the task was not materialised by this dispatcher.
    fn take_snapshot(&mut self, _wave: &Wave, _stage: &Stage<StandardKind>, task: TaskId) -> TaskSnapshot {
        match self.tasks.get(&task) {
            Some(t) => t.snapshot(task),
            None => panic!("unknown scripted task {task}"),
        }
    }
}
