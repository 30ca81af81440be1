// src/wave/handle.rs

use std::ops::Deref;

use crate::wave::snapshot::TaskSnapshot;
use crate::wave::state::Wave;

/// Mutable access to a wave handed to dependency callbacks.
///
/// Reads go through `Deref<Target = Wave>`. The only mutation available is
/// [`WaveHandle::add_snapshot`], typically used to record a `Skipped`
/// snapshot when a stage's dependencies resolved unfavourably.
#[derive(Debug)]
pub struct WaveHandle<'a> {
    wave: &'a mut Wave,
}

impl<'a> WaveHandle<'a> {
    pub fn new(wave: &'a mut Wave) -> Self {
        Self { wave }
    }

    /// Idempotent: re-adding a snapshot equal to the stage's latest one is a
    /// no-op and returns `false`.
    pub fn add_snapshot(&mut self, snapshot: TaskSnapshot) -> bool {
        self.wave.add_snapshot(snapshot)
    }
}

impl Deref for WaveHandle<'_> {
    type Target = Wave;

    fn deref(&self) -> &Wave {
        self.wave
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wave::snapshot::TaskStatus;
    use crate::wave::state::PendingWave;

    #[test]
    fn handle_reads_through_and_records_snapshots() {
        let mut wave = PendingWave::root().commit(0);
        {
            let mut handle = WaveHandle::new(&mut wave);
            assert_eq!(handle.id(), 0);
            assert!(handle.add_snapshot(TaskSnapshot::skipped(2)));
            assert!(!handle.add_snapshot(TaskSnapshot::skipped(2)));
            assert_eq!(handle.snapshot_of_stage(2).status, TaskStatus::Skipped);
        }
        assert_eq!(wave.history().len(), 1);
    }
}
