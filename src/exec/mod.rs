// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the commands behind the
//! pipeline's stage instances, using `tokio::process::Command`, and
//! reporting back to the orchestration runtime via `RuntimeEvent`s.
//!
//! - [`executor_loop`] owns the main executor loop which manages instance
//!   processes.
//! - [`instance_runner`] handles individual instance process execution.
//! - [`backend`] provides the `ExecutorBackend` trait and a concrete
//!   `RealExecutorBackend` that the runtime uses in production, and which
//!   tests can replace with a fake implementation.

pub mod backend;
pub mod executor_loop;
pub mod instance_runner;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use executor_loop::spawn_executor;

use tokio::process::Command;

/// Build a shell command appropriate for the platform.
pub(crate) fn shell_command(cmd_line: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd_line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd_line);
        c
    }
}
