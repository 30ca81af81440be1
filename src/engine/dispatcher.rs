// src/engine/dispatcher.rs

//! Callback contracts between the scheduler and the outside world.
//!
//! The scheduler never decides anything about a stage on its own: it asks
//! the [`Dispatcher`] for the [`StageCallbacks`] registered for the stage's
//! kind, and asks the dispatcher again for fresh task snapshots when polling.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::delay::Delay;
use crate::plan::{Link, Stage, StageId};
use crate::wave::{PendingWave, TaskId, TaskSnapshot, Wave, WaveHandle, WaveStart};

/// Outcome of a dependency evaluation.
///
/// The two fields are independent: a callback may activate the stage in the
/// current wave, request a sibling wave, do both, or neither.
#[derive(Debug, Clone, Default)]
pub struct DependencyDecision {
    pub can_activate: bool,
    pub fork: Option<PendingWave>,
}

impl DependencyDecision {
    pub fn activate() -> Self {
        Self {
            can_activate: true,
            fork: None,
        }
    }

    pub fn hold() -> Self {
        Self::default()
    }

    pub fn with_fork(mut self, fork: PendingWave) -> Self {
        self.fork = Some(fork);
        self
    }
}

/// Decision logic for one kind of stage.
pub trait StageCallbacks<K> {
    /// Called when a forward predecessor of `stage` finished, once per
    /// traversed link, even if the stage already has a task in this wave.
    /// `can_activate` is ignored in that case; `fork` is not.
    ///
    /// `dependencies` are the sources of every incoming link of the stage,
    /// cycle-closing ones included.
    /// The callback may record snapshots through `wave` (typically a
    /// `Skipped` marker when the dependencies resolved unfavourably); that is
    /// the only mutation it can perform.
    fn on_dependencies_updated(
        &mut self,
        wave: &mut WaveHandle<'_>,
        stage: &Stage<K>,
        dependencies: &[StageId],
    ) -> DependencyDecision;

    /// Called when a backward (cycle-closing) link into `stage` is traversed.
    /// Returning a [`WaveStart`] spawns a new wave.
    fn on_backward_link(
        &mut self,
        wave: &Wave,
        stage: &Stage<K>,
        incomings: &[Link],
        source: StageId,
    ) -> Option<WaveStart>;

    /// Materialise the task for `stage`.
    ///
    /// A non-zero `delay` must produce a snapshot that is not yet active
    /// (e.g. [`TaskSnapshot::later`]).
    fn schedule_task(
        &mut self,
        wave: &Wave,
        stage: &Stage<K>,
        incomings: &[Link],
        delay: &Delay,
    ) -> TaskSnapshot;
}

/// Entry point the scheduler talks to.
pub trait Dispatcher<K> {
    /// Callbacks for a stage kind.
    fn callbacks_for(&mut self, kind: &K) -> &mut dyn StageCallbacks<K>;

    /// Current externally known state of `task`.
    fn take_snapshot(&mut self, wave: &Wave, stage: &Stage<K>, task: TaskId) -> TaskSnapshot;
}

/// Where a [`CallbackTable`] gets fresh task snapshots from.
pub trait SnapshotSource<K> {
    fn take_snapshot(&mut self, wave: &Wave, stage: &Stage<K>, task: TaskId) -> TaskSnapshot;
}

impl<K, F> SnapshotSource<K> for F
where
    F: FnMut(&Wave, &Stage<K>, TaskId) -> TaskSnapshot,
{
    fn take_snapshot(&mut self, wave: &Wave, stage: &Stage<K>, task: TaskId) -> TaskSnapshot {
        self(wave, stage, task)
    }
}

/// Dispatcher backed by a map from kind to callbacks.
pub struct CallbackTable<K, S> {
    callbacks: HashMap<K, Box<dyn StageCallbacks<K>>>,
    source: S,
}

impl<K, S> CallbackTable<K, S>
where
    K: Eq + Hash + Debug,
    S: SnapshotSource<K>,
{
    pub fn new(source: S) -> Self {
        Self {
            callbacks: HashMap::new(),
            source,
        }
    }

    pub fn with(mut self, kind: K, callbacks: impl StageCallbacks<K> + 'static) -> Self {
        self.register(kind, callbacks);
        self
    }

    /// Register (or replace) the callbacks for `kind`.
    pub fn register(&mut self, kind: K, callbacks: impl StageCallbacks<K> + 'static) {
        self.callbacks.insert(kind, Box::new(callbacks));
    }

    pub fn handles(&self, kind: &K) -> bool {
        self.callbacks.contains_key(kind)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<K, S> Dispatcher<K> for CallbackTable<K, S>
where
    K: Eq + Hash + Debug,
    S: SnapshotSource<K>,
{
    /// # Panics
    ///
    /// Panics if no callbacks were registered for `kind`.
    fn callbacks_for(&mut self, kind: &K) -> &mut dyn StageCallbacks<K> {
        match self.callbacks.get_mut(kind) {
            Some(callbacks) => callbacks.as_mut(),
            None => panic!("no callbacks registered for stage kind {kind:?}"),
        }
    }

    fn take_snapshot(&mut self, wave: &Wave, stage: &Stage<K>, task: TaskId) -> TaskSnapshot {
        self.source.take_snapshot(wave, stage, task)
    }
}

impl<K: Debug, S> Debug for CallbackTable<K, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackTable")
            .field("kinds", &self.callbacks.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
