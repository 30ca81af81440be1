// src/config/model.rs

use std::collections::HashMap;

use serde::Deserialize;

use crate::delay::Delay;
use crate::errors::Result;
use crate::exec::{ScriptedDispatcher, StageScript};
use crate::plan::{Plan, PlanBuilder, Stage, StageId};
use crate::rules::{StandardKind, StandardRules};
use crate::types::DelayPolicy;

/// Plan file as read from TOML, before validation.
///
/// ```toml
/// [plan]
/// title = "nightly"
/// start = [1]
///
/// [defaults]
/// policy = "shortest"
/// max_forks_per_stage = 1
///
/// [[stage]]
/// id = 1
/// kind = "start"
///
/// [[stage]]
/// id = 2
/// kind = "all_succeeded"
/// delay = { days = 2 }
/// script = { outcome = "fail", mode = "deferred", ticks = 2 }
///
/// [[link]]
/// from = 1
/// to = 2
/// ```
///
/// Every section except `[[stage]]` is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawPlanFile {
    #[serde(default)]
    pub plan: PlanSection,

    #[serde(default)]
    pub defaults: DefaultsSection,

    #[serde(default)]
    pub stage: Vec<StageConfig>,

    #[serde(default)]
    pub link: Vec<LinkConfig>,
}

/// `[plan]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanSection {
    #[serde(default = "default_title")]
    pub title: String,

    /// Explicit start set. Empty means "every stage without incoming links".
    #[serde(default)]
    pub start: Vec<StageId>,
}

fn default_title() -> String {
    "plan".to_string()
}

impl Default for PlanSection {
    fn default() -> Self {
        Self {
            title: default_title(),
            start: Vec::new(),
        }
    }
}

/// `[defaults]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsSection {
    /// Delay policy for stages that do not set one.
    #[serde(default)]
    pub policy: DelayPolicy,

    /// How many waves a backward link may spawn towards the same stage.
    #[serde(default = "default_max_forks_per_stage")]
    pub max_forks_per_stage: usize,
}

fn default_max_forks_per_stage() -> usize {
    1
}

impl Default for DefaultsSection {
    fn default() -> Self {
        Self {
            policy: DelayPolicy::default(),
            max_forks_per_stage: default_max_forks_per_stage(),
        }
    }
}

/// `[[stage]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageConfig {
    pub id: StageId,
    pub kind: StandardKind,

    #[serde(default)]
    pub delay: Delay,

    /// Overrides `[defaults].policy`.
    #[serde(default)]
    pub policy: Option<DelayPolicy>,

    /// How the simulated task of this stage behaves.
    #[serde(default)]
    pub script: StageScript,
}

/// `[[link]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkConfig {
    pub from: StageId,
    pub to: StageId,

    #[serde(default)]
    pub delay: Delay,
}

/// Validated plan file. Only obtainable through `TryFrom<RawPlanFile>`.
#[derive(Debug, Clone)]
pub struct PlanFile {
    pub plan: PlanSection,
    pub defaults: DefaultsSection,
    pub stage: Vec<StageConfig>,
    pub link: Vec<LinkConfig>,
}

impl PlanFile {
    pub(crate) fn new_unchecked(
        plan: PlanSection,
        defaults: DefaultsSection,
        stage: Vec<StageConfig>,
        link: Vec<LinkConfig>,
    ) -> Self {
        Self {
            plan,
            defaults,
            stage,
            link,
        }
    }

    pub fn title(&self) -> &str {
        &self.plan.title
    }

    /// Build the immutable plan graph.
    pub fn build_plan(&self) -> Result<Plan<StandardKind>> {
        let mut builder = PlanBuilder::new(&self.plan.title);

        for sc in self.stage.iter() {
            let stage = Stage::new(sc.id, sc.kind)
                .with_delay(sc.delay.clone())
                .with_policy(sc.policy.unwrap_or(self.defaults.policy));
            builder = builder.stage(stage);
        }
        for lc in self.link.iter() {
            builder = builder.link_with_delay(lc.from, lc.to, lc.delay.clone());
        }
        for id in self.plan.start.iter() {
            builder = builder.start(*id);
        }

        builder.build()
    }

    pub fn scripts(&self) -> HashMap<StageId, StageScript> {
        self.stage.iter().map(|sc| (sc.id, sc.script)).collect()
    }

    /// Rules for `plan`, which should come from [`PlanFile::build_plan`].
    pub fn rules(&self, plan: &Plan<StandardKind>) -> StandardRules {
        StandardRules::new(self.defaults.max_forks_per_stage).with_backward_links(plan)
    }

    /// Scripted backend configured from the `[[stage]]` scripts.
    pub fn dispatcher(&self, plan: &Plan<StandardKind>) -> ScriptedDispatcher {
        ScriptedDispatcher::new(self.rules(plan), self.scripts())
    }
}
