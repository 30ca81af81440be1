// src/plan/stage.rs

//! Plan nodes and edges.

use crate::delay::Delay;
use crate::types::DelayPolicy;

/// Stage identifier, unique within a plan.
pub type StageId = u64;

/// A node in the plan.
///
/// `kind` is an open, caller-defined key used only to pick the callbacks
/// that govern the stage; the engine never inspects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage<K> {
    pub id: StageId,
    pub kind: K,
    /// Stage-local delay applied when the stage is materialised.
    pub delay: Delay,
    /// How competing incoming-link delays are resolved for this stage.
    pub delay_policy: DelayPolicy,
}

impl<K> Stage<K> {
    pub fn new(id: StageId, kind: K) -> Self {
        Self {
            id,
            kind,
            delay: Delay::none(),
            delay_policy: DelayPolicy::default(),
        }
    }

    pub fn with_delay(mut self, delay: Delay) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_policy(mut self, policy: DelayPolicy) -> Self {
        self.delay_policy = policy;
        self
    }
}

/// A directed edge `from -> to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub from: StageId,
    pub to: StageId,
    /// Delay applied when the link is traversed; `Delay::none()` if the link
    /// carries no annotation.
    pub delay: Delay,
}

impl Link {
    pub fn new(from: StageId, to: StageId) -> Self {
        Self {
            from,
            to,
            delay: Delay::none(),
        }
    }

    pub fn with_delay(from: StageId, to: StageId, delay: Delay) -> Self {
        Self { from, to, delay }
    }
}
