// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use crate::dag::{ScheduledInstance, Scheduler};
use crate::engine::{InstanceOutcome, StageName, TargetName};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these instances to the executor.
    DispatchInstances(Vec<ScheduledInstance>),
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

/// Seed the run by dispatching the root instances.
pub fn handle_run_start(scheduler: &mut Scheduler) -> CoreStep {
    let mut commands = Vec::new();

    let initial = scheduler.start();
    if !initial.is_empty() {
        commands.push(CoreCommand::DispatchInstances(initial));
    }

    CoreStep {
        commands,
        // A validated config always has at least one root instance, so the
        // run cannot be finished before anything completed.
        keep_running: !scheduler.is_finished(),
    }
}

/// Handle a shutdown request.
///
/// Dispatching stops, but the loop stays alive until every in-flight
/// instance has reported its outcome, so nothing that actually ran is lost
/// from the report.
pub fn handle_shutdown_request(scheduler: &mut Scheduler) -> CoreStep {
    let _ = scheduler.begin_shutdown();
    CoreStep {
        commands: Vec::new(),
        keep_running: !scheduler.is_finished(),
    }
}

/// Handle an instance completion event.
pub fn handle_instance_completion(
    scheduler: &mut Scheduler,
    stage: StageName,
    target: TargetName,
    outcome: InstanceOutcome,
) -> CoreStep {
    let mut commands = Vec::new();

    let step = scheduler.step_completion(&stage, &target, outcome);
    if !step.newly_scheduled.is_empty() {
        commands.push(CoreCommand::DispatchInstances(step.newly_scheduled));
    }

    CoreStep {
        commands,
        keep_running: !step.run_finished,
    }
}
