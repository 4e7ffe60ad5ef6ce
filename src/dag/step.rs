// src/dag/step.rs

//! Step-by-step execution result types for the scheduler.

use crate::dag::stage_info::ScheduledInstance;
use crate::engine::{StageName, TargetName};

/// Structured result of a single scheduler "step".
///
/// This is useful for tests that want to manually step the DAG and make
/// assertions about what changed.
#[derive(Debug, Clone)]
pub struct SchedulerStep {
    /// Instances that became ready to run as a result of this step.
    pub newly_scheduled: Vec<ScheduledInstance>,
    /// Instances that were newly marked as skipped in this step (dependents
    /// of a failed stage, or leftovers skipped when fail-fast drains).
    pub newly_skipped: Vec<(StageName, TargetName)>,
    /// Whether this step caused the run to finish (every instance terminal).
    pub run_finished: bool,
}

impl SchedulerStep {
    pub fn empty() -> Self {
        Self {
            newly_scheduled: Vec::new(),
            newly_skipped: Vec::new(),
            run_finished: false,
        }
    }
}
