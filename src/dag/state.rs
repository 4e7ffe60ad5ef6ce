// src/dag/state.rs

//! Per-run state transitions for stage instances in the scheduler.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::graph::StageGraph;
use crate::dag::stage_info::{InstanceState, ScheduledInstance, StageInfo};
use crate::engine::{StageName, TargetName};

/// Per-target concurrency pools: a pool's limit caps how many instances may
/// be `Running` on that target at once.
#[derive(Debug, Clone)]
pub struct TargetPools {
    limits: HashMap<TargetName, usize>,
    /// Extra env applied to every instance on a target.
    env: HashMap<TargetName, Vec<(String, String)>>,
}

impl TargetPools {
    pub fn new(
        limits: HashMap<TargetName, usize>,
        env: HashMap<TargetName, Vec<(String, String)>>,
    ) -> Self {
        Self { limits, env }
    }

    pub fn limit_for(&self, target: &str) -> usize {
        self.limits.get(target).copied().unwrap_or(1)
    }

    pub fn env_for(&self, target: &str) -> &[(String, String)] {
        self.env.get(target).map(|e| e.as_slice()).unwrap_or(&[])
    }
}

/// Manages state transitions for all instances of the run.
pub struct StateMachine<'a> {
    graph: &'a StageGraph,
    stages: &'a mut HashMap<StageName, StageInfo>,
    pools: &'a TargetPools,
}

impl<'a> StateMachine<'a> {
    pub fn new(
        graph: &'a StageGraph,
        stages: &'a mut HashMap<StageName, StageInfo>,
        pools: &'a TargetPools,
    ) -> Self {
        Self {
            graph,
            stages,
            pools,
        }
    }

    /// Determine whether all dependencies of the given stage are satisfied,
    /// meaning every instance of every dependency is `DoneSuccess`.
    pub fn deps_satisfied(&self, info: &StageInfo) -> bool {
        for dep_name in &info.deps {
            let dep = match self.stages.get(dep_name) {
                Some(d) => d,
                None => {
                    warn!(
                        stage = %info.name,
                        dep = %dep_name,
                        "dependency missing from stages map"
                    );
                    return false;
                }
            };

            if !dep.succeeded() {
                return false;
            }
        }

        true
    }

    /// Mark all transitive dependents of a failed stage as `Skipped`,
    /// touching only instances that have not started.
    ///
    /// Returns the (stage, target) pairs that were newly skipped.
    pub fn skip_dependents_of(&mut self, failed_stage: &str) -> Vec<(StageName, TargetName)> {
        let mut stack: Vec<StageName> = self
            .graph
            .dependents_of(failed_stage)
            .iter()
            .cloned()
            .collect();

        let mut newly_skipped = Vec::new();

        while let Some(name) = stack.pop() {
            if let Some(info) = self.stages.get_mut(&name) {
                let mut touched = false;
                for (target, state) in info.instances.iter_mut() {
                    if matches!(state, InstanceState::Pending) {
                        *state = InstanceState::Skipped;
                        debug!(
                            stage = %name,
                            target = %target,
                            "skipping instance due to upstream failure"
                        );
                        newly_skipped.push((name.clone(), target.clone()));
                        touched = true;
                    }
                }

                if touched {
                    stack.extend(self.graph.dependents_of(&name).iter().cloned());
                }
            }
        }

        newly_skipped
    }

    /// Mark every remaining `Pending` instance as `Skipped`.
    ///
    /// Used when fail-fast has engaged and the last in-flight instance has
    /// finished: independent branches that never started are not launched
    /// after a failure.
    pub fn skip_all_pending(&mut self) -> Vec<(StageName, TargetName)> {
        let mut newly_skipped = Vec::new();

        for info in self.stages.values_mut() {
            for (target, state) in info.instances.iter_mut() {
                if matches!(state, InstanceState::Pending) {
                    *state = InstanceState::Skipped;
                    debug!(
                        stage = %info.name,
                        target = %target,
                        "skipping instance; run is failing fast"
                    );
                    newly_skipped.push((info.name.clone(), target.clone()));
                }
            }
        }

        newly_skipped
    }

    /// Collect instances that are `Pending`, whose stage dependencies are all
    /// satisfied, and whose target pool has free capacity. Mark them
    /// `Running` and return them as `ScheduledInstance`s.
    pub fn collect_new_ready(&mut self) -> Vec<ScheduledInstance> {
        let mut ready = Vec::new();

        // Count what is already running per target pool.
        let mut running: HashMap<TargetName, usize> = HashMap::new();
        for info in self.stages.values() {
            for (target, state) in info.instances.iter() {
                if matches!(state, InstanceState::Running) {
                    *running.entry(target.clone()).or_insert(0) += 1;
                }
            }
        }

        // Decide first, then mutate to avoid borrowing issues.
        let candidates: Vec<(StageName, TargetName)> = self
            .stages
            .values()
            .flat_map(|info| {
                info.instances
                    .iter()
                    .filter(|(_, state)| matches!(state, InstanceState::Pending))
                    .map(|(target, _)| (info.name.clone(), target.clone()))
                    .collect::<Vec<_>>()
            })
            .collect();

        for (name, target) in candidates {
            let satisfied = self
                .stages
                .get(&name)
                .map(|info| self.deps_satisfied(info))
                .unwrap_or(false);
            if !satisfied {
                continue;
            }

            let in_flight = running.entry(target.clone()).or_insert(0);
            if *in_flight >= self.pools.limit_for(&target) {
                debug!(
                    stage = %name,
                    target = %target,
                    limit = self.pools.limit_for(&target),
                    "instance ready but target pool is full; deferring"
                );
                continue;
            }
            *in_flight += 1;

            if let Some(info) = self.stages.get_mut(&name) {
                info!(
                    stage = %name,
                    target = %target,
                    "dependencies satisfied; dispatching instance"
                );

                if let Some(state) = info.instances.get_mut(&target) {
                    *state = InstanceState::Running;
                }
                ready.push(ScheduledInstance::new(
                    info,
                    &target,
                    self.pools.env_for(&target),
                ));
            }
        }

        ready
    }

    /// Check if any instance is currently running.
    pub fn any_running(&self) -> bool {
        self.stages.values().any(|info| {
            info.instances
                .values()
                .any(|s| matches!(s, InstanceState::Running))
        })
    }

    /// Check if all instances are in a terminal state.
    pub fn all_terminal(&self) -> bool {
        self.stages
            .values()
            .all(|info| info.instances.values().all(|s| s.is_terminal()))
    }
}
