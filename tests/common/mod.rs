#![allow(dead_code)]

pub use wavedag_test_utils::builders;
pub use wavedag_test_utils::forking;
pub use wavedag_test_utils::init_tracing;

use wavedag::engine::{Dispatcher, Scheduler};
use wavedag::plan::StageId;
use wavedag::wave::{TaskResult, TaskStatus, WaveId};

/// Latest status of `stage` in wave `wave`.
pub fn status_of<K, D>(scheduler: &Scheduler<K, D>, wave: WaveId, stage: StageId) -> TaskStatus
where
    D: Dispatcher<K>,
{
    scheduler.wave(wave).snapshot_of_stage(stage).status
}

/// Assert that `stage` completed with `result` in wave `wave`.
pub fn assert_completed<K, D>(
    scheduler: &Scheduler<K, D>,
    wave: WaveId,
    stage: StageId,
    result: TaskResult,
) where
    D: Dispatcher<K>,
{
    let snapshot = scheduler.wave(wave).snapshot_of_stage(stage);
    assert_eq!(
        (snapshot.status, snapshot.result),
        (TaskStatus::Completed, result),
        "stage {stage} in wave {wave}"
    );
}

/// Assert that every stage of the plan has a finished snapshot in every wave.
pub fn assert_all_finished<K, D>(scheduler: &Scheduler<K, D>)
where
    D: Dispatcher<K>,
{
    for wave in scheduler.waves() {
        for stage in scheduler.plan().stages() {
            let snapshot = wave.snapshot_of_stage(stage.id);
            assert!(
                snapshot.is_finished(),
                "stage {} in wave {} is {:?}",
                stage.id,
                wave.id(),
                snapshot.status
            );
        }
    }
}
