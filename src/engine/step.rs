// src/engine/step.rs

//! Result type for one advancement pass.

use crate::plan::StageId;
use crate::wave::WaveId;

/// What changed during one [`Scheduler::update_waves`](crate::engine::Scheduler::update_waves)
/// pass.
///
/// Useful for tests that want to step the engine manually and make
/// assertions about each pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateStep {
    /// Stages that got a task (and a cursor) during the pass.
    pub activated: Vec<(WaveId, StageId)>,
    /// Waves committed during the pass.
    pub forked: Vec<WaveId>,
    /// Waves whose cursor list became empty during the pass.
    pub finished: Vec<WaveId>,
}

impl UpdateStep {
    /// Nothing happened.
    pub fn is_idle(&self) -> bool {
        self.activated.is_empty() && self.forked.is_empty() && self.finished.is_empty()
    }
}
