// tests/property_scheduler.rs
//
// Property tests for the scheduler: any acyclic stage graph terminates, and
// after a failure nothing new is ever dispatched.

mod common;
use crate::common::builders::{ConfigFileBuilder, StageConfigBuilder};

use std::collections::HashSet;

use proptest::prelude::*;

use shipit::config::ConfigFile;
use shipit::dag::Scheduler;
use shipit::engine::InstanceOutcome;

// Strategy to generate a valid DAG configuration.
// We ensure acyclicity by only allowing stage N to depend on stages 0..N-1.
fn dag_config_strategy(max_stages: usize) -> impl Strategy<Value = ConfigFile> {
    (1..=max_stages).prop_flat_map(|num_stages| {
        let deps_strat = proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_stages),
            num_stages,
        );

        deps_strat.prop_map(move |raw_deps| {
            let mut builder = ConfigFileBuilder::new().with_max_parallel_per_target(3);
            for (i, potential_deps) in raw_deps.into_iter().enumerate() {
                let name = format!("stage_{}", i);
                let mut stage_builder = StageConfigBuilder::new(&format!("echo {}", name));

                // Sanitize dependencies: only allow deps < i.
                let mut valid_deps = HashSet::new();
                for dep_idx in potential_deps {
                    if i > 0 {
                        valid_deps.insert(dep_idx % i);
                    }
                }

                for dep_idx in valid_deps {
                    stage_builder = stage_builder.needs(&format!("stage_{}", dep_idx));
                }
                builder = builder.with_stage(&name, stage_builder.build());
            }
            builder.build()
        })
    })
}

proptest! {
    #[test]
    fn scheduler_terminates_on_any_acyclic_graph(
        cfg in dag_config_strategy(10),
        // A simple way to determine outcome: a set of "failing" stages.
        failing_indices in proptest::collection::vec(0..10usize, 0..5)
    ) {
        let mut scheduler = Scheduler::from_config(&cfg);
        let stage_names: Vec<String> =
            scheduler.stage_names().map(|s| s.to_string()).collect();

        let failing: HashSet<String> = failing_indices.iter()
            .filter(|&&i| i < stage_names.len())
            .map(|&i| stage_names[i].clone())
            .collect();

        // Queue of instances currently "executing".
        let mut executing: Vec<(String, String)> = scheduler
            .start()
            .into_iter()
            .map(|i| (i.stage, i.target))
            .collect();

        let mut dispatched_after_failure = false;
        let mut steps = 0;
        let max_steps = 1000; // safety bound for the test loop itself

        while let Some((stage, target)) = executing.pop() {
            steps += 1;
            prop_assert!(steps < max_steps, "simulation did not terminate");

            let failure_already_observed = scheduler.failure_observed();
            let outcome = if failing.contains(&stage) {
                InstanceOutcome::Failed(1)
            } else {
                InstanceOutcome::Success
            };

            let step = scheduler.step_completion(&stage, &target, outcome);

            if failure_already_observed && !step.newly_scheduled.is_empty() {
                dispatched_after_failure = true;
            }

            executing.extend(
                step.newly_scheduled
                    .into_iter()
                    .map(|i| (i.stage, i.target)),
            );
        }

        // Nothing in flight and nothing left to dispatch: the run must be
        // over, one way or the other.
        prop_assert!(scheduler.is_finished(), "scheduler stuck with empty executor queue");
        prop_assert!(!dispatched_after_failure, "fail-fast dispatched new work after a failure");

        // A failure-free simulation must leave no skipped instances.
        if failing.is_empty() {
            prop_assert!(!scheduler.failure_observed());
            for (stage, target, state) in scheduler.instance_states() {
                prop_assert_eq!(
                    state,
                    shipit::dag::InstanceState::DoneSuccess,
                    "instance {}@{} not successful in all-green run",
                    stage,
                    target
                );
            }
        }
    }
}
