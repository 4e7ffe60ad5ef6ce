// src/engine/report.rs

//! Final per-instance report for a pipeline run.

use std::collections::BTreeMap;
use std::fmt;

use crate::dag::InstanceState;
use crate::engine::{StageName, TargetName};
use crate::release::RunContext;

/// Final status of one (stage, target) instance as reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceStatus {
    Success,
    Failed(i32),
    Skipped,
}

impl From<InstanceState> for InstanceStatus {
    fn from(state: InstanceState) -> Self {
        match state {
            InstanceState::DoneSuccess => InstanceStatus::Success,
            InstanceState::DoneFailed(code) => InstanceStatus::Failed(code),
            // Pending/Running only remain if the event channel closed
            // before the run finished; those instances never produced a
            // result that reached the scheduler.
            InstanceState::Skipped | InstanceState::Pending | InstanceState::Running => {
                InstanceStatus::Skipped
            }
        }
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceStatus::Success => write!(f, "success"),
            InstanceStatus::Failed(code) => write!(f, "failed (exit {code})"),
            InstanceStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Status of the final publish step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStatus {
    /// Publish command ran and succeeded.
    Published,
    /// Publish never ran because a stage failed or the run was aborted.
    Skipped,
    /// Publish was disabled via `--skip-publish`; the release stays a draft.
    SkippedByFlag,
    /// Publish command ran and failed; the release stays a draft.
    Failed,
}

impl fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishStatus::Published => write!(f, "published"),
            PublishStatus::Skipped => write!(f, "skipped"),
            PublishStatus::SkippedByFlag => write!(f, "skipped (--skip-publish)"),
            PublishStatus::Failed => write!(f, "failed (release left in draft)"),
        }
    }
}

/// Immutable record of one pipeline run: the resolved identifiers, the final
/// state of every stage instance, and what happened to the publish step.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub version: String,
    pub release_id: String,
    pub instances: BTreeMap<(StageName, TargetName), InstanceStatus>,
    pub publish: PublishStatus,
}

impl RunReport {
    pub fn new(
        context: &RunContext,
        states: Vec<(StageName, TargetName, InstanceState)>,
    ) -> Self {
        let instances = states
            .into_iter()
            .map(|(stage, target, state)| ((stage, target), InstanceStatus::from(state)))
            .collect();

        Self {
            version: context.version.clone(),
            release_id: context.release_id.clone(),
            instances,
            publish: PublishStatus::Skipped,
        }
    }

    /// All stage instances succeeded. Says nothing about the publish step.
    pub fn stages_succeeded(&self) -> bool {
        self.instances
            .values()
            .all(|s| matches!(s, InstanceStatus::Success))
    }

    /// Overall run success: every instance succeeded and the release was
    /// either published or deliberately left in draft via `--skip-publish`.
    pub fn succeeded(&self) -> bool {
        self.stages_succeeded()
            && matches!(
                self.publish,
                PublishStatus::Published | PublishStatus::SkippedByFlag
            )
    }

    /// Instances that failed, with their exit codes. Used for error output
    /// detailed enough to re-run manually.
    pub fn failed_instances(&self) -> Vec<(&StageName, &TargetName, i32)> {
        self.instances
            .iter()
            .filter_map(|((stage, target), status)| match status {
                InstanceStatus::Failed(code) => Some((stage, target, *code)),
                _ => None,
            })
            .collect()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "run report")?;
        writeln!(f, "  version:    {}", self.version)?;
        writeln!(f, "  release id: {}", self.release_id)?;
        for ((stage, target), status) in self.instances.iter() {
            writeln!(f, "  {stage}@{target}: {status}")?;
        }
        write!(f, "  publish: {}", self.publish)
    }
}
