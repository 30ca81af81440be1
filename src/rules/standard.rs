// src/rules/standard.rs

//! Dependency and backward-link decisions for [`StandardKind`] stages.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::engine::DependencyDecision;
use crate::plan::{Link, Plan, Stage, StageId};
use crate::rules::kind::StandardKind;
use crate::wave::{
    DependenciesInfo, TaskResult, TaskSnapshot, TaskStatus, Wave, WaveHandle, WaveStart,
};

/// What a rule concluded from the current dependency outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Activate,
    /// Not enough dependencies resolved yet.
    Wait,
    /// Every dependency resolved and the rule can no longer be met.
    Skip,
}

/// Evaluate the rule of `kind` against `info`.
pub fn evaluate(kind: StandardKind, info: &DependenciesInfo) -> Verdict {
    let accepted = match kind {
        StandardKind::Start => return Verdict::Activate,
        StandardKind::End => info.all_did_resolve(),
        StandardKind::AllSucceeded => info.all_did_resolve_as(TaskResult::Success),
        StandardKind::AllFailed => info.all_did_fail(),
        StandardKind::AnySucceeded => info.any_did_resolve_as(TaskResult::Success),
        StandardKind::AnyFailed => info.any_did_fail(),
    };

    if accepted {
        Verdict::Activate
    } else if info.all_did_resolve() {
        Verdict::Skip
    } else {
        Verdict::Wait
    }
}

/// Rule set shared by every [`StandardKind`].
///
/// Backward links spawn at most `max_forks_per_stage` waves per target stage
/// over the scheduler's lifetime, which bounds how often a cycle re-runs.
///
/// Sources of the plan's backward links are not in-wave dependencies for
/// these rules: they are only reached by forking a new wave. The links are
/// learnt with [`StandardRules::with_backward_links`].
#[derive(Debug, Clone)]
pub struct StandardRules {
    forks: HashMap<StageId, usize>,
    max_forks_per_stage: usize,
    backward: HashSet<(StageId, StageId)>,
}

impl Default for StandardRules {
    fn default() -> Self {
        Self::new(1)
    }
}

impl StandardRules {
    pub fn new(max_forks_per_stage: usize) -> Self {
        Self {
            forks: HashMap::new(),
            max_forks_per_stage,
            backward: HashSet::new(),
        }
    }

    /// Remember which links of `plan` close a cycle.
    pub fn with_backward_links<K>(mut self, plan: &Plan<K>) -> Self {
        self.backward = plan
            .links()
            .iter()
            .filter(|l| plan.is_backward(l))
            .map(|l| (l.from, l.to))
            .collect();
        self
    }

    pub fn is_backward(&self, from: StageId, to: StageId) -> bool {
        self.backward.contains(&(from, to))
    }

    pub fn max_forks_per_stage(&self) -> usize {
        self.max_forks_per_stage
    }

    /// Waves already spawned towards `stage`.
    pub fn forks_of(&self, stage: StageId) -> usize {
        self.forks.get(&stage).copied().unwrap_or(0)
    }

    /// Decide whether `stage` may activate. An unreachable rule records a
    /// `Skipped` snapshot in the wave. Stages that already ran or were
    /// skipped in this wave are left alone.
    pub fn on_dependencies_updated(
        &mut self,
        wave: &mut WaveHandle<'_>,
        stage: &Stage<StandardKind>,
        dependencies: &[StageId],
    ) -> DependencyDecision {
        let settled = wave.has_related_task(stage.id)
            || wave
                .latest_for_stage(stage.id)
                .is_some_and(|s| s.status == TaskStatus::Skipped);
        if settled {
            return DependencyDecision::hold();
        }

        let forward: Vec<StageId> = dependencies
            .iter()
            .copied()
            .filter(|&dep| !self.is_backward(dep, stage.id))
            .collect();
        let info = wave.query_dependencies_info(&forward);
        match evaluate(stage.kind, &info) {
            Verdict::Activate => DependencyDecision::activate(),
            Verdict::Wait => DependencyDecision::hold(),
            Verdict::Skip => {
                debug!(
                    wave = wave.id(),
                    stage = stage.id,
                    kind = %stage.kind,
                    "dependencies resolved unfavourably; skipping stage"
                );
                wave.add_snapshot(TaskSnapshot::skipped(stage.id));
                DependencyDecision::hold()
            }
        }
    }

    /// Re-run `stage` in a new wave when its rule accepts the outcome of
    /// `source` alone and the fork budget allows it.
    ///
    /// The new wave is delayed by the incoming-link delay selected with the
    /// stage's policy for the source's result.
    pub fn on_backward_link(
        &mut self,
        wave: &Wave,
        stage: &Stage<StandardKind>,
        incomings: &[Link],
        source: StageId,
    ) -> Option<WaveStart> {
        let info = wave.query_dependencies_info(&[source]);
        if evaluate(stage.kind, &info) != Verdict::Activate {
            return None;
        }

        let spent = self.forks_of(stage.id);
        if spent >= self.max_forks_per_stage {
            debug!(
                wave = wave.id(),
                stage = stage.id,
                spent,
                "fork budget exhausted; ignoring backward link"
            );
            return None;
        }
        self.forks.insert(stage.id, spent + 1);

        let result = wave.snapshot_of_stage(source).result;
        let delay = wave.select_delay_for(stage, stage.delay_policy, incomings, result);
        Some(WaveStart::prepare(wave.id(), delay, [stage.id]))
    }
}
