// src/engine/mod.rs

//! Orchestration engine for shipit.
//!
//! This module ties together:
//! - the stage scheduler
//! - the main runtime event loop that reacts to:
//!   - instance completion events from the executor
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`]; the final per-instance summary lives in
//! [`report`].

/// Canonical stage name type used throughout the engine.
pub type StageName = String;

/// Canonical execution target name type used throughout the engine.
pub type TargetName = String;

/// Outcome of one instance process for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceOutcome {
    Success,
    Failed(i32),
}

/// Events flowing into the runtime from the executor and signal handlers.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// An instance process exited with a concrete outcome.
    InstanceCompleted {
        stage: StageName,
        target: TargetName,
        outcome: InstanceOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod report;
pub mod runtime;

pub use self::core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use report::{InstanceStatus, PublishStatus, RunReport};
pub use runtime::Runtime;
