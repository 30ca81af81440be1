// tests/config_loading.rs

mod common;

use std::io::Write;

use crate::common::{assert_completed, init_tracing, status_of};
use clap::Parser;
use tempfile::NamedTempFile;
use wavedag::config::load_and_validate;
use wavedag::delay::Delay;
use wavedag::engine::Scheduler;
use wavedag::errors::WavedagError;
use wavedag::exec::{simulate, SimulationOptions};
use wavedag::rules::StandardKind;
use wavedag::types::{DelayPolicy, ExecutionMode};
use wavedag::wave::{TaskResult, TaskStatus};

fn plan_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

const RETRY_PLAN: &str = r#"
[plan]
title = "nightly"

[defaults]
policy = "longest"
max_forks_per_stage = 2

[[stage]]
id = 1
kind = "start"

[[stage]]
id = 2
kind = "all_succeeded"
script = { outcome = "fail", mode = "deferred", ticks = 1 }

[[stage]]
id = 3
kind = "any_failed"
policy = "shortest"
delay = { days = 1 }

[[link]]
from = 1
to = 2

[[link]]
from = 2
to = 3

[[link]]
from = 3
to = 2
delay = { days = 2 }
"#;

#[test]
fn test_plan_file_builds_plan_and_dispatcher() {
    let file = plan_file(RETRY_PLAN);
    let config = load_and_validate(file.path()).unwrap();

    assert_eq!(config.title(), "nightly");
    assert_eq!(config.defaults.max_forks_per_stage, 2);

    let plan = config.build_plan().unwrap();
    assert_eq!(plan.start_ids(), &[1]);
    assert_eq!(plan.stage_by_id(2).kind, StandardKind::AllSucceeded);
    assert_eq!(plan.stage_by_id(2).delay_policy, DelayPolicy::LongestDelay);
    assert_eq!(plan.stage_by_id(3).delay_policy, DelayPolicy::ShortestDelay);
    assert_eq!(plan.stage_by_id(3).delay, Delay::days(1));

    let dispatcher = config.dispatcher(&plan);
    let script = dispatcher.script_for(2);
    assert_eq!(script.mode, ExecutionMode::Deferred);
    assert_eq!(script.outcome, TaskResult::Fail);
    assert_eq!(dispatcher.rules().max_forks_per_stage(), 2);
    assert!(dispatcher.rules().is_backward(3, 2));
}

#[test]
fn test_plan_file_runs_to_completion() {
    init_tracing();

    let file = plan_file(RETRY_PLAN);
    let config = load_and_validate(file.path()).unwrap();
    let plan = config.build_plan().unwrap();
    let dispatcher = config.dispatcher(&plan);
    let mut scheduler = Scheduler::kickoff(plan, dispatcher);

    let report = simulate(&mut scheduler, SimulationOptions::default());

    assert!(report.complete);
    assert_eq!(report.waves, 3);
    for wave in 1..3 {
        assert_eq!(status_of(&scheduler, wave, 1), TaskStatus::Skipped);
        assert_completed(&scheduler, wave, 2, TaskResult::Fail);
    }
}

#[test]
fn test_missing_file_is_io_error() {
    let result = load_and_validate("/definitely/not/here/Wavedag.toml");
    assert!(matches!(result, Err(WavedagError::IoError(_))));
}

#[test]
fn test_unknown_link_target_returns_config_error() {
    let file = plan_file(
        r#"
[[stage]]
id = 1
kind = "start"

[[link]]
from = 1
to = 4
"#,
    );

    match load_and_validate(file.path()) {
        Err(WavedagError::ConfigError(msg)) => {
            assert!(msg.contains("unknown stage 4"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_unknown_kind_returns_toml_error() {
    let file = plan_file(
        r#"
[[stage]]
id = 1
kind = "sometimes"
"#,
    );

    let result = load_and_validate(file.path());
    assert!(matches!(result, Err(WavedagError::TomlError(_))));
}

#[test]
fn test_default_plan_path_matches_cli_default() {
    let args = wavedag::cli::CliArgs::parse_from(["wavedag"]);
    assert_eq!(
        wavedag::config::default_plan_path(),
        std::path::PathBuf::from(args.plan)
    );
}
