// src/exec/instance_runner.rs

//! Individual instance process runner.

use anyhow::{Context, Result};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dag::ScheduledInstance;
use crate::engine::{InstanceOutcome, RuntimeEvent};
use crate::exec::shell_command;

/// Run a single instance process and emit an `InstanceCompleted` event with
/// its outcome.
///
/// Environment layering, lowest to highest precedence:
/// 1. inherited host environment
/// 2. run context (`run_env`: version, release id)
/// 3. target env, then stage env (pre-merged into `instance.env`)
/// 4. `pass_env` host variables forwarded explicitly
///
/// The command's stdout is logged at info, stderr at debug. Whatever the
/// command does beyond that (artifact uploads etc.) is opaque here; only
/// the exit status feeds back into the scheduler.
pub async fn run_instance(
    instance: ScheduledInstance,
    run_env: Vec<(String, String)>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    let stage = instance.stage.clone();
    let target = instance.target.clone();

    if let Err(err) = run_instance_inner(instance, run_env, &runtime_tx).await {
        error!(
            stage = %stage,
            target = %target,
            error = %err,
            "instance execution error"
        );
        let _ = runtime_tx
            .send(RuntimeEvent::InstanceCompleted {
                stage,
                target,
                outcome: InstanceOutcome::Failed(-1),
            })
            .await;
    }
}

async fn run_instance_inner(
    instance: ScheduledInstance,
    run_env: Vec<(String, String)>,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) -> Result<()> {
    info!(
        stage = %instance.stage,
        target = %instance.target,
        cmd = %instance.cmd,
        "starting instance process"
    );

    let mut cmd = shell_command(&instance.cmd);

    for (key, value) in run_env.iter() {
        cmd.env(key, value);
    }
    for (key, value) in instance.env.iter() {
        cmd.env(key, value);
    }
    for key in instance.pass_env.iter() {
        match std::env::var(key) {
            Ok(value) => {
                cmd.env(key, value);
            }
            Err(_) => {
                warn!(
                    stage = %instance.stage,
                    target = %instance.target,
                    var = %key,
                    "pass_env variable not set in host environment; not forwarding"
                );
            }
        }
    }

    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().with_context(|| {
        format!(
            "spawning process for instance '{}@{}'",
            instance.stage, instance.target
        )
    })?;

    // Consume stdout and stderr so buffers don't fill.
    if let Some(stdout) = child.stdout.take() {
        let stage = instance.stage.clone();
        let target = instance.target.clone();
        tokio::spawn(async move {
            let reader = BufReader::new(stdout);
            let mut lines = reader.lines();

            while let Ok(Some(line)) = lines.next_line().await {
                info!(stage = %stage, target = %target, "stdout: {}", line);
            }
        });
    }

    if let Some(stderr) = child.stderr.take() {
        let stage = instance.stage.clone();
        let target = instance.target.clone();
        tokio::spawn(async move {
            let reader = BufReader::new(stderr);
            let mut lines = reader.lines();

            while let Ok(Some(line)) = lines.next_line().await {
                debug!(stage = %stage, target = %target, "stderr: {}", line);
            }
        });
    }

    let status = child.wait().await.with_context(|| {
        format!(
            "waiting for process of instance '{}@{}'",
            instance.stage, instance.target
        )
    })?;

    let code = status.code().unwrap_or(-1);
    let outcome = if status.success() {
        InstanceOutcome::Success
    } else {
        InstanceOutcome::Failed(code)
    };

    info!(
        stage = %instance.stage,
        target = %instance.target,
        exit_code = code,
        success = status.success(),
        "instance process exited"
    );

    runtime_tx
        .send(RuntimeEvent::InstanceCompleted {
            stage: instance.stage.clone(),
            target: instance.target.clone(),
            outcome,
        })
        .await
        .with_context(|| {
            format!(
                "sending InstanceCompleted event for '{}@{}' to runtime",
                instance.stage, instance.target
            )
        })?;

    Ok(())
}
