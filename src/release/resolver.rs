// src/release/resolver.rs

//! Version/release resolver: runs once per pipeline run, before any stage.

use std::process::Stdio;

use tracing::{debug, info};

use crate::config::model::ResolverSection;
use crate::errors::{PipelineError, Result};
use crate::exec::shell_command;
use crate::release::context::RunContext;

/// Run the resolver command and parse its declared outputs into a
/// [`RunContext`].
///
/// A spawn error, a non-zero exit, or a missing output key aborts the whole
/// run before any stage starts. There are no retries.
pub async fn resolve(cfg: &ResolverSection) -> Result<RunContext> {
    info!(cmd = %cfg.cmd, "running resolver");

    let output = shell_command(&cfg.cmd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| PipelineError::Resolver(format!("spawning resolver command: {e}")))?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in stderr.lines() {
        debug!("resolver stderr: {}", line);
    }

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        return Err(PipelineError::Resolver(format!(
            "resolver command exited with code {code}: {}",
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let context = parse_outputs(&stdout, cfg)?;

    info!(
        version = %context.version,
        release_id = %context.release_id,
        "resolver produced run context"
    );

    Ok(context)
}

/// Scan resolver stdout for `NAME=value` lines matching the configured
/// output variable names. The last occurrence of each wins.
fn parse_outputs(stdout: &str, cfg: &ResolverSection) -> Result<RunContext> {
    let mut version: Option<String> = None;
    let mut release_id: Option<String> = None;

    for line in stdout.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        if key == cfg.version_var {
            version = Some(value.to_string());
        } else if key == cfg.release_id_var {
            release_id = Some(value.to_string());
        }
    }

    let version = version.ok_or_else(|| {
        PipelineError::Resolver(format!(
            "resolver output is missing '{}='",
            cfg.version_var
        ))
    })?;
    let release_id = release_id.ok_or_else(|| {
        PipelineError::Resolver(format!(
            "resolver output is missing '{}='",
            cfg.release_id_var
        ))
    })?;

    Ok(RunContext {
        version,
        release_id,
        version_var: cfg.version_var.clone(),
        release_id_var: cfg.release_id_var.clone(),
    })
}
