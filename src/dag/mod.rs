// src/dag/mod.rs

//! Stage graph representation and scheduling.
//!
//! - [`graph`] holds a simple directed acyclic graph of stages.
//! - [`scheduler`] contains the per-run state machine that decides
//!   which instances are ready to run, and when fail-fast engages.
//! - [`stage_info`] provides stage metadata and scheduled instance types.
//! - [`step`] defines the result type for scheduler steps.
//! - [`state`] manages per-instance state transitions and target pools.

pub mod graph;
pub mod scheduler;
pub mod stage_info;
pub mod state;
pub mod step;

pub use graph::StageGraph;
pub use scheduler::Scheduler;
pub use stage_info::{InstanceState, ScheduledInstance};
pub use step::SchedulerStep;
