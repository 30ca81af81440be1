#![allow(dead_code)]

use std::collections::HashMap;

use wavedag::delay::Delay;
use wavedag::engine::Scheduler;
use wavedag::exec::{ScriptedDispatcher, StageScript};
use wavedag::plan::{Plan, PlanBuilder, Stage, StageId};
use wavedag::rules::{StandardKind, StandardRules};
use wavedag::types::DelayPolicy;
use wavedag::wave::TaskResult;

/// Builder for a plan of `StandardKind` stages plus the scripts that drive
/// the `ScriptedDispatcher`, to simplify test setup.
pub struct ScenarioBuilder {
    plan: PlanBuilder<StandardKind>,
    scripts: HashMap<StageId, StageScript>,
    max_forks: usize,
}

impl ScenarioBuilder {
    pub fn new(title: &str) -> Self {
        Self {
            plan: PlanBuilder::new(title),
            scripts: HashMap::new(),
            max_forks: 1,
        }
    }

    pub fn stage(self, id: StageId, kind: StandardKind) -> Self {
        self.stage_with(Stage::new(id, kind))
    }

    /// Add a stage with its own delay and policy.
    pub fn stage_with(mut self, stage: Stage<StandardKind>) -> Self {
        self.plan = self.plan.stage(stage);
        self
    }

    pub fn delayed_stage(
        self,
        id: StageId,
        kind: StandardKind,
        delay: Delay,
        policy: DelayPolicy,
    ) -> Self {
        self.stage_with(Stage::new(id, kind).with_delay(delay).with_policy(policy))
    }

    pub fn link(mut self, from: StageId, to: StageId) -> Self {
        self.plan = self.plan.link(from, to);
        self
    }

    pub fn link_with_delay(mut self, from: StageId, to: StageId, delay: Delay) -> Self {
        self.plan = self.plan.link_with_delay(from, to, delay);
        self
    }

    pub fn start(mut self, id: StageId) -> Self {
        self.plan = self.plan.start(id);
        self
    }

    pub fn script(mut self, id: StageId, script: StageScript) -> Self {
        self.scripts.insert(id, script);
        self
    }

    /// The task of `id` fails immediately.
    pub fn fails(self, id: StageId) -> Self {
        self.script(id, StageScript::immediate(TaskResult::Fail))
    }

    /// The task of `id` stays `Ready` for `ticks` ticks, then ends with `outcome`.
    pub fn deferred(self, id: StageId, outcome: TaskResult, ticks: u32) -> Self {
        self.script(id, StageScript::deferred(outcome, ticks))
    }

    pub fn max_forks(mut self, max: usize) -> Self {
        self.max_forks = max;
        self
    }

    pub fn build(self) -> (Plan<StandardKind>, ScriptedDispatcher) {
        let plan = self
            .plan
            .build()
            .expect("Failed to build valid plan from builder");
        let rules = StandardRules::new(self.max_forks).with_backward_links(&plan);
        let dispatcher = ScriptedDispatcher::new(rules, self.scripts);
        (plan, dispatcher)
    }

    pub fn kickoff(self) -> Scheduler<StandardKind, ScriptedDispatcher> {
        let (plan, dispatcher) = self.build();
        Scheduler::kickoff(plan, dispatcher)
    }
}
