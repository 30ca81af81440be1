// src/wave/start.rs

use crate::delay::Delay;
use crate::plan::StageId;
use crate::wave::state::WaveId;

/// Request to kick off a new wave, returned by backward-link callbacks.
///
/// The scheduler commits it with the same routine used for wave 0: each
/// start stage is materialised with `delay`, everything not reachable from
/// the start set is skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveStart {
    pub parent: Option<WaveId>,
    pub delay: Delay,
    pub start_set: Vec<StageId>,
}

impl WaveStart {
    pub fn prepare(parent: WaveId, delay: Delay, start_set: impl IntoIterator<Item = StageId>) -> Self {
        Self {
            parent: Some(parent),
            delay,
            start_set: start_set.into_iter().collect(),
        }
    }
}
