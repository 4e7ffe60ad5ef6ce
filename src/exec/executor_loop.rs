// src/exec/executor_loop.rs

//! Main executor loop that manages running instance processes.

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dag::ScheduledInstance;
use crate::engine::RuntimeEvent;
use crate::exec::instance_runner::run_instance;

/// Spawn the background executor loop.
///
/// The returned `mpsc::Sender<ScheduledInstance>` is what the runtime (or
/// `RealExecutorBackend`) uses to dispatch work. Each scheduled instance is
/// executed in its own Tokio task. The scheduler guarantees at most one
/// instance per (stage, target) pair per run, so no deduplication or
/// cancellation bookkeeping is needed here; instances that are already in
/// flight simply run to completion.
///
/// `run_env` carries the run-scoped context (version, release id), injected
/// into every instance's environment unchanged.
pub fn spawn_executor(
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    run_env: Vec<(String, String)>,
) -> mpsc::Sender<ScheduledInstance> {
    let (tx, mut rx) = mpsc::channel::<ScheduledInstance>(32);

    tokio::spawn(async move {
        info!("executor loop started");

        while let Some(instance) = rx.recv().await {
            let rt_tx = runtime_tx.clone();
            let env = run_env.clone();
            let label = format!("{}@{}", instance.stage, instance.target);

            tokio::spawn(async move {
                run_instance(instance, env, rt_tx).await;
                debug!(instance = %label, "instance runner future finished");
            });
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}
