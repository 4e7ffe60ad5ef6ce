// src/dag/stage_info.rs

//! Stage metadata and per-instance run state.

use std::collections::BTreeMap;

use crate::config::model::StageConfig;
use crate::engine::{StageName, TargetName};

/// State of one (stage, target) instance within a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    /// Instance is waiting on dependencies or pool capacity.
    Pending,
    /// Instance has been dispatched to the executor and is currently running.
    Running,
    /// Instance process exited with code 0.
    DoneSuccess,
    /// Instance process exited with the given non-zero code (or could not be
    /// spawned, recorded as -1).
    DoneFailed(i32),
    /// Instance never started because an upstream stage failed or the run
    /// was aborted.
    Skipped,
}

impl InstanceState {
    /// Terminal means the scheduler will never change this state again.
    pub fn is_terminal(self) -> bool {
        !matches!(self, InstanceState::Pending | InstanceState::Running)
    }
}

/// Static stage information derived from config, plus per-instance state.
#[derive(Debug, Clone)]
pub struct StageInfo {
    pub name: StageName,
    pub cmd: String,
    /// Direct dependencies for this stage (names in `needs = [...]`).
    pub deps: Vec<StageName>,
    /// Stage-specific environment entries.
    pub env: Vec<(String, String)>,
    /// Host environment variables forwarded to this stage's instances.
    pub pass_env: Vec<String>,
    /// One entry per effective target, all starting `Pending`.
    pub instances: BTreeMap<TargetName, InstanceState>,
}

impl StageInfo {
    pub fn from_config(name: StageName, cfg: &StageConfig) -> Self {
        let mut instances = BTreeMap::new();
        for target in cfg.effective_targets() {
            instances.insert(target, InstanceState::Pending);
        }

        // Target env is layered under stage env at dispatch time, so keep
        // only the stage-level entries here.
        let env = cfg
            .env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Self {
            name,
            cmd: cfg.cmd.clone(),
            deps: cfg.needs.clone(),
            env,
            pass_env: cfg.pass_env.clone(),
            instances,
        }
    }

    /// A stage counts as succeeded only when every instance succeeded.
    pub fn succeeded(&self) -> bool {
        self.instances
            .values()
            .all(|s| matches!(s, InstanceState::DoneSuccess))
    }
}

/// Description of an instance that the scheduler wants the executor to run now.
#[derive(Debug, Clone)]
pub struct ScheduledInstance {
    pub stage: StageName,
    pub target: TargetName,
    pub cmd: String,
    /// Target env layered under stage env, already merged in that order.
    pub env: Vec<(String, String)>,
    /// Host environment variables to forward into the process.
    pub pass_env: Vec<String>,
}

impl ScheduledInstance {
    pub fn new(info: &StageInfo, target: &str, target_env: &[(String, String)]) -> Self {
        let mut env: Vec<(String, String)> = target_env.to_vec();
        env.extend(info.env.iter().cloned());

        Self {
            stage: info.name.clone(),
            target: target.to_string(),
            cmd: info.cmd.clone(),
            env,
            pass_env: info.pass_env.clone(),
        }
    }
}
