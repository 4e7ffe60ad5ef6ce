// src/dag/scheduler.rs

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::config::model::ConfigFile;
use crate::dag::graph::StageGraph;
use crate::dag::stage_info::{InstanceState, ScheduledInstance, StageInfo};
use crate::dag::state::{StateMachine, TargetPools};
use crate::dag::step::SchedulerStep;
use crate::engine::{InstanceOutcome, StageName, TargetName};

/// Scheduler holds the immutable stage graph plus mutable per-run state.
///
/// It is responsible for:
/// - deciding when an instance is ready to run (all deps fully succeeded,
///   target pool has capacity)
/// - recording instance outcomes as they arrive from the executor
/// - skipping dependents of failed stages
/// - engaging fail-fast: after the first failure nothing new is launched,
///   but in-flight instances are allowed to finish and are still recorded
#[derive(Debug)]
pub struct Scheduler {
    graph: StageGraph,
    stages: HashMap<StageName, StageInfo>,
    pools: TargetPools,
    /// Set on the first failed instance; once set, no new dispatches happen.
    failure_observed: bool,
    /// Set on a shutdown request; in-flight instances still report, but
    /// nothing new is launched.
    halted: bool,
    finished: bool,
}

impl Scheduler {
    /// Construct a scheduler from a validated [`ConfigFile`].
    ///
    /// Every declared (stage, target) instance starts `Pending`; the whole
    /// graph participates in the single run.
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let graph = StageGraph::from_config(cfg);

        let mut stages = HashMap::new();
        for (name, sc) in cfg.stage.iter() {
            stages.insert(name.clone(), StageInfo::from_config(name.clone(), sc));
        }

        // One pool per target that any stage actually uses.
        let mut limits: HashMap<TargetName, usize> = HashMap::new();
        let mut env: HashMap<TargetName, Vec<(String, String)>> = HashMap::new();
        for info in stages.values() {
            for target in info.instances.keys() {
                limits
                    .entry(target.clone())
                    .or_insert_with(|| cfg.max_parallel_for_target(target));
                env.entry(target.clone()).or_insert_with(|| {
                    cfg.target
                        .get(target)
                        .map(|t| t.env.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                        .unwrap_or_default()
                });
            }
        }
        let pools = TargetPools::new(limits, env);

        Self {
            graph,
            stages,
            pools,
            failure_observed: false,
            halted: false,
            finished: false,
        }
    }

    /// Dispatch the initial wave of instances: roots of the graph, bounded
    /// by pool capacity.
    pub fn start(&mut self) -> Vec<ScheduledInstance> {
        debug!(
            stages = self.stages.len(),
            "scheduler: starting pipeline run"
        );
        let mut machine = StateMachine::new(&self.graph, &mut self.stages, &self.pools);
        machine.collect_new_ready()
    }

    /// Returns `true` once every instance is in a terminal state.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether any instance has failed so far.
    pub fn failure_observed(&self) -> bool {
        self.failure_observed
    }

    /// Whether a shutdown request halted the run.
    pub fn halted(&self) -> bool {
        self.halted
    }

    /// Begin a graceful shutdown: stop launching new instances.
    ///
    /// In-flight instances keep running and their completions are still
    /// recorded through [`Scheduler::step_completion`]; once the last one
    /// reports, the remaining pending instances are skipped and the run
    /// finishes.
    pub fn begin_shutdown(&mut self) -> SchedulerStep {
        let mut step = SchedulerStep::empty();
        if self.finished {
            return step;
        }

        info!("scheduler: shutdown requested; draining in-flight instances");
        self.halted = true;

        let mut machine = StateMachine::new(&self.graph, &mut self.stages, &self.pools);
        if !machine.any_running() {
            step.newly_skipped.extend(machine.skip_all_pending());
        }

        let machine = StateMachine::new(&self.graph, &mut self.stages, &self.pools);
        if machine.all_terminal() {
            self.finished = true;
            step.run_finished = true;
        }

        step
    }

    /// Read-only view of one instance's state, or `None` if unknown.
    pub fn instance_state_of(&self, stage: &str, target: &str) -> Option<InstanceState> {
        self.stages
            .get(stage)?
            .instances
            .get(target)
            .copied()
    }

    /// All (stage, target, state) triples, for reporting.
    pub fn instance_states(&self) -> Vec<(StageName, TargetName, InstanceState)> {
        let mut out = Vec::new();
        for info in self.stages.values() {
            for (target, state) in info.instances.iter() {
                out.push((info.name.clone(), target.clone(), *state));
            }
        }
        out.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
        out
    }

    /// Stage names known to the scheduler, for diagnostics and dry-run output.
    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.graph.stages()
    }

    /// Handle completion of one instance process with a concrete outcome.
    pub fn step_completion(
        &mut self,
        stage: &str,
        target: &str,
        outcome: InstanceOutcome,
    ) -> SchedulerStep {
        if self.finished {
            warn!(
                stage = %stage,
                target = %target,
                "completion after run finished; ignoring"
            );
            return SchedulerStep::empty();
        }

        let mut step = SchedulerStep::empty();

        let Some(state) = self
            .stages
            .get_mut(stage)
            .and_then(|info| info.instances.get_mut(target))
        else {
            warn!(
                stage = %stage,
                target = %target,
                "completion for unknown instance; ignoring"
            );
            return step;
        };

        match outcome {
            InstanceOutcome::Success => {
                *state = InstanceState::DoneSuccess;
                debug!(stage = %stage, target = %target, "instance completed successfully");
            }
            InstanceOutcome::Failed(code) => {
                *state = InstanceState::DoneFailed(code);
                warn!(
                    stage = %stage,
                    target = %target,
                    exit_code = code,
                    "instance failed; engaging fail-fast and skipping dependents"
                );
                self.failure_observed = true;

                let mut machine =
                    StateMachine::new(&self.graph, &mut self.stages, &self.pools);
                step.newly_skipped.extend(machine.skip_dependents_of(stage));
            }
        }

        let mut machine = StateMachine::new(&self.graph, &mut self.stages, &self.pools);

        if self.failure_observed || self.halted {
            // Fail-fast or shutdown: nothing new starts. Once the last
            // in-flight instance has reported, park every untouched
            // instance as skipped so the run can terminate.
            if !machine.any_running() {
                step.newly_skipped.extend(machine.skip_all_pending());
            }
        } else {
            step.newly_scheduled.extend(machine.collect_new_ready());
        }

        let machine = StateMachine::new(&self.graph, &mut self.stages, &self.pools);
        if machine.all_terminal() {
            self.finished = true;
            step.run_finished = true;
            info!(
                failed = self.failure_observed,
                "scheduler: all instances terminal; run finished"
            );
        }

        step
    }
}
