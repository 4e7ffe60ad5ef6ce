// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - sending `ScheduledInstance`s to the executor
//! - handling Ctrl+C / shutdown
//!
//! The core is intended to be extensively unit tested without any Tokio,
//! channels, or processes.

use crate::dag::{InstanceState, Scheduler};
use crate::engine::event_handlers::{
    handle_instance_completion, handle_run_start, handle_shutdown_request, CoreStep,
};
use crate::engine::{RuntimeEvent, StageName, TargetName};

/// Pure core runtime state.
///
/// This owns the stage scheduler. It has **no** channels, no Tokio types,
/// and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler) -> Self {
        Self { scheduler }
    }

    /// Expose whether the run has finished (for tests and reporting).
    pub fn is_finished(&self) -> bool {
        self.scheduler.is_finished()
    }

    /// Whether any instance has failed so far.
    pub fn failure_observed(&self) -> bool {
        self.scheduler.failure_observed()
    }

    /// Whether a shutdown request halted the run.
    pub fn halted(&self) -> bool {
        self.scheduler.halted()
    }

    /// Final (or current) state of every instance, for reporting.
    pub fn instance_states(&self) -> Vec<(StageName, TargetName, InstanceState)> {
        self.scheduler.instance_states()
    }

    /// Produce the initial dispatch commands for the run.
    pub fn start_run(&mut self) -> CoreStep {
        handle_run_start(&mut self.scheduler)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::InstanceCompleted {
                stage,
                target,
                outcome,
            } => handle_instance_completion(&mut self.scheduler, stage, target, outcome),
            RuntimeEvent::ShutdownRequested => handle_shutdown_request(&mut self.scheduler),
        }
    }
}
