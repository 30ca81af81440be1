// src/exec/driver.rs

//! Tick-driven simulation loop.

use tracing::{debug, info, warn};

use crate::engine::Scheduler;
use crate::exec::scripted::ScriptedDispatcher;
use crate::rules::StandardKind;

/// Knobs for [`simulate`].
#[derive(Debug, Clone, Copy)]
pub struct SimulationOptions {
    /// Give up after this many ticks.
    pub max_ticks: u32,
    /// Calendar days the virtual clock moves per tick.
    pub tick_days: u32,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            max_ticks: 1000,
            tick_days: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationReport {
    pub ticks: u32,
    pub complete: bool,
    pub waves: usize,
}

/// Drive the scheduler until every wave is resolved or `max_ticks` is hit.
///
/// Each tick moves the dispatcher's clock, polls task snapshots, then runs
/// one update pass.
pub fn simulate(
    scheduler: &mut Scheduler<StandardKind, ScriptedDispatcher>,
    options: SimulationOptions,
) -> SimulationReport {
    let mut ticks = 0;

    while !scheduler.is_complete() && ticks < options.max_ticks {
        scheduler.dispatcher_mut().tick(options.tick_days);
        ticks += 1;

        let changed = scheduler.poll_snapshot_updates();
        let step = scheduler.update_waves();
        debug!(
            tick = ticks,
            changed,
            activated = step.activated.len(),
            forked = step.forked.len(),
            finished = step.finished.len(),
            "simulation tick"
        );
    }

    let complete = scheduler.is_complete();
    if complete {
        info!(ticks, waves = scheduler.waves().len(), "simulation complete");
    } else {
        warn!(
            ticks,
            running = scheduler.running_waves().count(),
            "simulation stopped before every wave resolved"
        );
    }

    SimulationReport {
        ticks,
        complete,
        waves: scheduler.waves().len(),
    }
}
