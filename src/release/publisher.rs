// src/release/publisher.rs

//! Final publish step: flip the draft release to published.

use std::process::Stdio;

use tracing::{debug, info, warn};

use crate::config::model::PublishSection;
use crate::errors::{PipelineError, Result};
use crate::exec::shell_command;
use crate::release::context::RunContext;

/// Run the publish command exactly once with the run context and forwarded
/// credentials injected.
///
/// This only runs after every stage instance succeeded. A spawn error or a
/// non-zero exit is fatal with no retry; the release stays in draft state
/// for manual resolution. Idempotence for repeated invocations with the
/// same release id is the external tool's responsibility; shipit guarantees
/// at most one invocation per run.
pub async fn publish(cfg: &PublishSection, context: &RunContext) -> Result<()> {
    info!(
        cmd = %cfg.cmd,
        release_id = %context.release_id,
        "publishing release"
    );

    let mut cmd = shell_command(&cfg.cmd);

    for (key, value) in context.env_vars() {
        cmd.env(key, value);
    }
    for key in cfg.pass_env.iter() {
        match std::env::var(key) {
            Ok(value) => {
                cmd.env(key, value);
            }
            Err(_) => {
                warn!(
                    var = %key,
                    "publish pass_env variable not set in host environment; not forwarding"
                );
            }
        }
    }

    let output = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| PipelineError::Publish(format!("spawning publish command: {e}")))?;

    for line in String::from_utf8_lossy(&output.stdout).lines() {
        debug!("publish stdout: {}", line);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in stderr.lines() {
        debug!("publish stderr: {}", line);
    }

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        return Err(PipelineError::Publish(format!(
            "publish command exited with code {code} (release '{}' left in draft): {}",
            context.release_id,
            stderr.trim()
        )));
    }

    info!(release_id = %context.release_id, "release published");
    Ok(())
}
