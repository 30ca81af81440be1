// src/lib.rs

pub mod cli;
pub mod config;
pub mod delay;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod plan;
pub mod rules;
pub mod types;
pub mod wave;

use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::engine::Scheduler;
use crate::exec::{simulate, ScriptedDispatcher, SimulationOptions, SimulationReport};
use crate::plan::Plan;
use crate::rules::StandardKind;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - plan file loading and validation
/// - the scheduler with the scripted backend
/// - the simulation loop (or the dry-run analysis)
pub fn run(args: CliArgs) -> Result<()> {
    let plan_path = PathBuf::from(&args.plan);
    let file = load_and_validate(&plan_path)?;
    let plan = file.build_plan()?;

    if args.dry_run {
        print_dry_run(&plan);
        return Ok(());
    }

    info!(plan = %plan.title(), path = %plan_path.display(), "starting simulation");

    let dispatcher = file.dispatcher(&plan);
    let mut scheduler = Scheduler::kickoff(plan, dispatcher);
    let options = SimulationOptions {
        max_ticks: args.max_ticks,
        tick_days: args.tick_days,
    };
    let report = simulate(&mut scheduler, options);

    print_summary(&scheduler, &report);

    if !report.complete {
        anyhow::bail!(
            "plan '{}' did not complete within {} ticks",
            scheduler.plan().title(),
            report.ticks
        );
    }

    Ok(())
}

/// Dry-run output: stages with sequence numbers, links, cycles.
fn print_dry_run(plan: &Plan<StandardKind>) {
    println!("wavedag dry-run: {}", plan.title());
    println!("  start = {:?}", plan.start_ids());
    println!();

    println!("stages ({}):", plan.stages().len());
    for stage in plan.stages() {
        let seq = match plan.sequence_of(stage.id) {
            Some(n) => n.to_string(),
            None => "unreachable".to_string(),
        };
        println!("  - {} [{}] seq={}", stage.id, stage.kind, seq);
        if !stage.delay.is_none() {
            println!("      delay: {}", stage.delay);
        }
        println!("      policy: {:?}", stage.delay_policy);
    }

    println!("links ({}):", plan.links().len());
    for link in plan.links() {
        let marker = if plan.is_backward(link) { " (backward)" } else { "" };
        if link.delay.is_none() {
            println!("  - {} -> {}{}", link.from, link.to, marker);
        } else {
            println!("  - {} -> {}{} delay: {}", link.from, link.to, marker, link.delay);
        }
    }

    let cycles = plan.cycles();
    if !cycles.is_empty() {
        println!("cycles ({}):", cycles.len());
        for cycle in cycles {
            println!("  - {:?}", cycle);
        }
    }

    debug!("dry-run complete (no simulation)");
}

/// Per-wave summary after a simulation.
fn print_summary(
    scheduler: &Scheduler<StandardKind, ScriptedDispatcher>,
    report: &SimulationReport,
) {
    println!(
        "wavedag: {} ({} ticks, {} waves, {})",
        scheduler.plan().title(),
        report.ticks,
        report.waves,
        if report.complete { "complete" } else { "incomplete" }
    );

    for wave in scheduler.waves() {
        let parent = match wave.parent_id() {
            Some(p) => format!(" (parent {p})"),
            None => String::new(),
        };
        println!("wave {}{}:", wave.id(), parent);
        for (stage, snapshot) in wave.latest_snapshot_by_stage() {
            println!(
                "  - {stage}: {:?} {:?} at {}",
                snapshot.status, snapshot.result, snapshot.taken_at
            );
        }
    }
}
