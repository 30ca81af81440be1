// src/engine/scheduler.rs

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::delay::Delay;
use crate::engine::dispatcher::Dispatcher;
use crate::engine::step::UpdateStep;
use crate::plan::{Plan, StageId};
use crate::wave::{
    PendingWave, TaskId, TaskSnapshot, TaskStatus, Wave, WaveHandle, WaveId, WaveStart,
};

/// Scheduler owns the immutable plan, the dispatcher and every wave.
///
/// It is responsible for:
/// - kicking off wave 0 from the plan's start set
/// - walking each wave's cursors and asking the dispatcher what to do when a
///   cursor's task finishes
/// - committing forked waves at the end of the wave list
/// - pulling fresh task snapshots from the dispatcher when polled
///
/// The scheduler never moves on its own; callers alternate
/// [`poll_snapshot_updates`](Self::poll_snapshot_updates) and
/// [`update_waves`](Self::update_waves) until [`is_complete`](Self::is_complete).
#[derive(Debug)]
pub struct Scheduler<K, D> {
    plan: Plan<K>,
    dispatcher: D,
    waves: Vec<Wave>,
}

/// Wave requested while another wave was being advanced.
enum Fork {
    Start(WaveStart),
    Pending(PendingWave),
}

impl<K, D> Scheduler<K, D>
where
    D: Dispatcher<K>,
{
    /// Create wave 0 from the start set and run one advancement pass.
    pub fn kickoff(plan: Plan<K>, dispatcher: D) -> Self {
        let mut scheduler = Self {
            plan,
            dispatcher,
            waves: Vec::new(),
        };

        let start_set = scheduler.plan.start_ids().to_vec();
        let wave = kickoff_wave(
            &scheduler.plan,
            &mut scheduler.dispatcher,
            0,
            None,
            &Delay::none(),
            &start_set,
        );
        info!(
            plan = %scheduler.plan.title(),
            start = ?start_set,
            "scheduler: kicked off wave 0"
        );
        scheduler.waves.push(wave);
        scheduler.update_waves();

        scheduler
    }

    /// `true` once no wave has cursors left.
    pub fn is_complete(&self) -> bool {
        self.waves.iter().all(|w| !w.has_unresolved_tasks())
    }

    pub fn waves(&self) -> &[Wave] {
        &self.waves
    }

    pub fn running_waves(&self) -> impl Iterator<Item = &Wave> + '_ {
        self.waves.iter().filter(|w| w.has_unresolved_tasks())
    }

    /// # Panics
    ///
    /// Panics if no wave has this id.
    pub fn wave(&self, id: WaveId) -> &Wave {
        match self.waves.get(id) {
            Some(wave) => wave,
            None => panic!("unknown wave id {id} ({} waves)", self.waves.len()),
        }
    }

    /// # Panics
    ///
    /// Panics if no wave has this id.
    pub fn wave_mut(&mut self, id: WaveId) -> &mut Wave {
        let count = self.waves.len();
        match self.waves.get_mut(id) {
            Some(wave) => wave,
            None => panic!("unknown wave id {id} ({count} waves)"),
        }
    }

    /// Start date of wave 0.
    pub fn started_at(&self) -> NaiveDate {
        self.wave(0).started_at()
    }

    pub fn plan(&self) -> &Plan<K> {
        &self.plan
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut D {
        &mut self.dispatcher
    }

    /// Advance every unresolved wave once.
    ///
    /// Waves are visited by index, so waves committed during the pass are
    /// visited in the same pass.
    pub fn update_waves(&mut self) -> UpdateStep {
        let mut step = UpdateStep::default();
        let mut index = 0;

        while index < self.waves.len() {
            if self.waves[index].has_unresolved_tasks() {
                self.advance_wave(index, &mut step);
            }
            index += 1;
        }

        step
    }

    /// Ask the dispatcher for the current state of every task that is not
    /// finished yet, and record the snapshots whose status changed.
    ///
    /// Returns the number of snapshots recorded.
    pub fn poll_snapshot_updates(&mut self) -> usize {
        let Self {
            plan,
            dispatcher,
            waves,
        } = self;
        let mut recorded = 0;

        for wave in waves.iter_mut() {
            let live: Vec<(TaskId, StageId, TaskStatus)> = wave
                .latest_snapshot_by_task()
                .into_iter()
                .filter(|(_, s)| !s.is_finished())
                .map(|(task, s)| (task, s.stage_id, s.status))
                .collect();

            for (task, stage_id, status) in live {
                let stage = plan.stage_by_id(stage_id);
                let fresh = dispatcher.take_snapshot(wave, stage, task);
                if fresh.status != status && wave.add_snapshot(fresh) {
                    debug!(wave = wave.id(), stage = stage_id, task, "task status changed");
                    recorded += 1;
                }
            }
        }

        recorded
    }

    /// Walk the cursors of one wave, then commit whatever it forked.
    fn advance_wave(&mut self, index: usize, step: &mut UpdateStep) {
        let mut forks = Vec::new();

        {
            let Self {
                plan,
                dispatcher,
                waves,
            } = self;
            let wave = &mut waves[index];
            let wave_id = wave.id();

            // Cursors appended while walking land behind `i` and are reached
            // in this same loop.
            let mut i = 0;
            while let Some(cursor) = wave.cursor_at(i) {
                let stage = plan.stage_by_id(cursor);

                if !wave.has_related_task(stage.id) {
                    warn!(wave = wave_id, stage = stage.id, "dropping cursor without a task");
                    wave.remove_cursor_at(i);
                    continue;
                }

                let status = wave.snapshot_of_stage(stage.id).status;
                if !status.is_finished() {
                    i += 1;
                    continue;
                }

                debug!(wave = wave_id, stage = stage.id, ?status, "cursor finished");

                for link in plan.outgoings(stage.id) {
                    let next = plan.follow_to(link);
                    let incomings = plan.incomings(next.id);

                    if plan.is_backward(link) {
                        let callbacks = dispatcher.callbacks_for(&next.kind);
                        if let Some(start) = callbacks.on_backward_link(wave, next, incomings, link.from) {
                            debug!(
                                wave = wave_id,
                                from = link.from,
                                to = link.to,
                                "backward link requested a new wave"
                            );
                            forks.push(Fork::Start(start));
                        }
                        continue;
                    }

                    let dependencies: Vec<StageId> = incomings.iter().map(|l| l.from).collect();

                    let callbacks = dispatcher.callbacks_for(&next.kind);
                    let decision =
                        callbacks.on_dependencies_updated(&mut WaveHandle::new(wave), next, &dependencies);

                    // One live task per stage per wave; a fork request still stands.
                    if decision.can_activate && wave.has_related_task(next.id) {
                        debug!(wave = wave_id, stage = next.id, "stage already has a task");
                    } else if decision.can_activate {
                        let snapshot = callbacks.schedule_task(wave, next, incomings, &link.delay);
                        debug!(
                            wave = wave_id,
                            stage = next.id,
                            status = ?snapshot.status,
                            "activated stage"
                        );
                        wave.add_snapshot(snapshot);
                        wave.add_cursor(next.id);
                        step.activated.push((wave_id, next.id));
                    }

                    if let Some(pending) = decision.fork {
                        forks.push(Fork::Pending(pending));
                    }
                }

                wave.remove_cursor_at(i);
            }

            if !wave.has_unresolved_tasks() {
                let skipped = wave.skip_fill(plan);
                info!(wave = wave_id, skipped, "scheduler: wave finished");
                step.finished.push(wave_id);
            }
        }

        for fork in forks {
            let id = self.commit_fork(fork);
            step.forked.push(id);
        }
    }

    /// Append a forked wave with the next free id.
    fn commit_fork(&mut self, fork: Fork) -> WaveId {
        let id = self.waves.len();

        let wave = match fork {
            Fork::Start(start) => kickoff_wave(
                &self.plan,
                &mut self.dispatcher,
                id,
                start.parent,
                &start.delay,
                &start.start_set,
            ),
            Fork::Pending(pending) => {
                let mut wave = pending.commit(id);
                if !wave.has_unresolved_tasks() {
                    wave.skip_fill(&self.plan);
                }
                wave
            }
        };

        info!(
            wave = id,
            parent = ?wave.parent_id(),
            cursors = ?wave.cursors(),
            "scheduler: committed forked wave"
        );
        self.waves.push(wave);

        id
    }
}

/// Build a wave from a start set: materialise every start stage with
/// `delay`, and skip every stage not forward-reachable from the start set.
fn kickoff_wave<K, D>(
    plan: &Plan<K>,
    dispatcher: &mut D,
    id: WaveId,
    parent: Option<WaveId>,
    delay: &Delay,
    start_set: &[StageId],
) -> Wave
where
    D: Dispatcher<K>,
{
    let pending = match parent {
        Some(parent) => PendingWave::child_of(parent),
        None => PendingWave::root(),
    };
    let mut wave = pending.commit(id);

    let reachable = plan.reachable_from(start_set);
    let mut seen = HashSet::new();

    for &stage_id in start_set {
        if !seen.insert(stage_id) {
            continue;
        }
        let stage = plan.stage_by_id(stage_id);
        let snapshot = dispatcher
            .callbacks_for(&stage.kind)
            .schedule_task(&wave, stage, &[], delay);
        debug!(wave = id, stage = stage_id, status = ?snapshot.status, "initial snapshot");
        wave.add_snapshot(snapshot);
        wave.add_cursor(stage_id);
    }

    for stage in plan.stages() {
        if !reachable.contains(&stage.id) {
            wave.add_snapshot(TaskSnapshot::skipped(stage.id));
        }
    }

    if !wave.has_unresolved_tasks() {
        wave.skip_fill(plan);
    }

    wave
}
