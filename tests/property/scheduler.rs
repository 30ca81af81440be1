use proptest::prelude::*;
use wavedag::exec::{simulate, SimulationOptions, StageScript};
use wavedag::rules::StandardKind;
use wavedag::wave::TaskResult;
use wavedag_test_utils::builders::ScenarioBuilder;

const KINDS: [StandardKind; 6] = [
    StandardKind::Start,
    StandardKind::End,
    StandardKind::AllSucceeded,
    StandardKind::AllFailed,
    StandardKind::AnySucceeded,
    StandardKind::AnyFailed,
];

#[derive(Debug, Clone)]
struct StageShape {
    kind: usize,
    parent: usize,
    fails: bool,
    deferred_ticks: u32,
}

// Every stage after the first hangs off an earlier one, so the plan is
// connected from stage 1. Extra links may point anywhere, which closes
// cycles and produces backward links.
fn scenario_strategy(
    max_stages: usize,
) -> impl Strategy<Value = (Vec<StageShape>, Vec<(usize, usize)>)> {
    (1..=max_stages).prop_flat_map(|n| {
        let stages = proptest::collection::vec(
            (0..KINDS.len(), any::<usize>(), any::<bool>(), 0..3u32).prop_map(
                |(kind, parent, fails, deferred_ticks)| StageShape {
                    kind,
                    parent,
                    fails,
                    deferred_ticks,
                },
            ),
            n,
        );
        let extra = proptest::collection::vec((0..n, 0..n), 0..n);
        (stages, extra)
    })
}

fn build(
    stages: &[StageShape],
    extra: &[(usize, usize)],
    max_forks: usize,
) -> ScenarioBuilder {
    let mut builder = ScenarioBuilder::new("random").start(1).max_forks(max_forks);

    for (i, shape) in stages.iter().enumerate() {
        let id = i as u64 + 1;
        let kind = if i == 0 { StandardKind::Start } else { KINDS[shape.kind] };
        let outcome = if shape.fails { TaskResult::Fail } else { TaskResult::Success };
        let script = if shape.deferred_ticks == 0 {
            StageScript::immediate(outcome)
        } else {
            StageScript::deferred(outcome, shape.deferred_ticks)
        };
        builder = builder.stage(id, kind).script(id, script);
        if i > 0 {
            builder = builder.link((shape.parent % i) as u64 + 1, id);
        }
    }

    for &(from, to) in extra {
        builder = builder.link(from as u64 + 1, to as u64 + 1);
    }

    builder
}

proptest! {
    #[test]
    fn test_random_plans_always_resolve(
        (stages, extra) in scenario_strategy(8),
        max_forks in 0..3usize,
    ) {
        let stage_count = stages.len();
        let mut scheduler = build(&stages, &extra, max_forks).kickoff();

        let report = simulate(&mut scheduler, SimulationOptions::default());
        prop_assert!(report.complete);

        // Each target stage may be re-entered at most `max_forks` times.
        prop_assert!(report.waves <= 1 + stage_count * max_forks);

        for wave in scheduler.waves() {
            prop_assert!(wave.cursors().is_empty());
            for stage in scheduler.plan().stages() {
                let snapshot = wave.snapshot_of_stage(stage.id);
                prop_assert!(
                    snapshot.is_finished(),
                    "stage {} in wave {} is {:?}",
                    stage.id,
                    wave.id(),
                    snapshot.status
                );
            }
        }
    }

    #[test]
    fn test_child_waves_point_to_earlier_parents(
        (stages, extra) in scenario_strategy(6),
    ) {
        let mut scheduler = build(&stages, &extra, 1).kickoff();
        simulate(&mut scheduler, SimulationOptions::default());

        prop_assert_eq!(scheduler.wave(0).parent_id(), None);
        for wave in scheduler.waves().iter().skip(1) {
            let parent = wave.parent_id();
            prop_assert!(parent.is_some_and(|p| p < wave.id()));
        }
    }
}
