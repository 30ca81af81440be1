#![allow(dead_code)]

use tracing::debug;

use wavedag::delay::Delay;
use wavedag::engine::{DependencyDecision, Dispatcher, StageCallbacks};
use wavedag::exec::ScriptedDispatcher;
use wavedag::plan::{Link, Stage, StageId};
use wavedag::rules::StandardKind;
use wavedag::wave::{PendingWave, TaskId, TaskSnapshot, Wave, WaveHandle, WaveStart};

/// Dispatcher that forks a sibling wave the first time one chosen stage is
/// allowed to activate, or on a chosen call for that stage when built with
/// [`ForkingDispatcher::on_call`].
///
/// The forked wave is a child of the wave being advanced and is seeded with
/// a fresh task for the stage. Whether the stage also activates in place is
/// controlled by `activate_in_place`. Everything else is delegated to the
/// wrapped `ScriptedDispatcher`.
pub struct ForkingDispatcher {
    inner: ScriptedDispatcher,
    fork_stage: StageId,
    activate_in_place: bool,
    fork_on_call: Option<usize>,
    calls: usize,
    forked: bool,
}

impl ForkingDispatcher {
    pub fn new(inner: ScriptedDispatcher, fork_stage: StageId, activate_in_place: bool) -> Self {
        Self {
            inner,
            fork_stage,
            activate_in_place,
            fork_on_call: None,
            calls: 0,
            forked: false,
        }
    }

    /// Fork on the `n`th dependency update of the fork stage (1-based),
    /// whatever the wrapped rules decide.
    pub fn on_call(mut self, n: usize) -> Self {
        self.fork_on_call = Some(n);
        self
    }

    /// Dependency updates seen for the fork stage so far.
    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn has_forked(&self) -> bool {
        self.forked
    }

    pub fn inner(&self) -> &ScriptedDispatcher {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut ScriptedDispatcher {
        &mut self.inner
    }
}

impl StageCallbacks<StandardKind> for ForkingDispatcher {
    fn on_dependencies_updated(
        &mut self,
        wave: &mut WaveHandle<'_>,
        stage: &Stage<StandardKind>,
        dependencies: &[StageId],
    ) -> DependencyDecision {
        let decision = self.inner.on_dependencies_updated(wave, stage, dependencies);
        if stage.id != self.fork_stage || self.forked {
            return decision;
        }
        self.calls += 1;
        let due = match self.fork_on_call {
            Some(n) => self.calls == n,
            None => decision.can_activate,
        };
        if !due {
            return decision;
        }

        self.forked = true;
        let snapshot = self.inner.schedule_task(&**wave, stage, &[], &Delay::none());
        debug!(wave = wave.id(), stage = stage.id, "test dispatcher forking");

        let fork = PendingWave::child_of(wave.id())
            .with_scratch("forked_from", stage.id as i64)
            .seed(snapshot);
        let base = if self.activate_in_place && decision.can_activate {
            DependencyDecision::activate()
        } else {
            DependencyDecision::hold()
        };
        base.with_fork(fork)
    }

    fn on_backward_link(
        &mut self,
        wave: &Wave,
        stage: &Stage<StandardKind>,
        incomings: &[Link],
        source: StageId,
    ) -> Option<WaveStart> {
        self.inner.on_backward_link(wave, stage, incomings, source)
    }

    fn schedule_task(
        &mut self,
        wave: &Wave,
        stage: &Stage<StandardKind>,
        incomings: &[Link],
        delay: &Delay,
    ) -> TaskSnapshot {
        self.inner.schedule_task(wave, stage, incomings, delay)
    }
}

impl Dispatcher<StandardKind> for ForkingDispatcher {
    fn callbacks_for(&mut self, _kind: &StandardKind) -> &mut dyn StageCallbacks<StandardKind> {
        self
    }

    fn take_snapshot(&mut self, wave: &Wave, stage: &Stage<StandardKind>, task: TaskId) -> TaskSnapshot {
        self.inner.take_snapshot(wave, stage, task)
    }
}
