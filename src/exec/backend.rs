// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of a raw mpsc sender.
//! This makes it easy to swap in a fake executor in tests while keeping the
//! production executor implementation in [`executor_loop`].
//!
//! - `RealExecutorBackend` is the default implementation used by `shipit`.
//!   It wraps the executor loop and just forwards scheduled instances over
//!   an mpsc channel.
//! - Tests can provide their own `ExecutorBackend` that, for example,
//!   records which instances were scheduled and directly emits
//!   `InstanceCompleted` events.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::dag::ScheduledInstance;
use crate::engine::RuntimeEvent;
use crate::errors::{Error, Result};

use super::executor_loop::spawn_executor;

/// Trait abstracting how scheduled instances are executed.
///
/// Production code uses [`RealExecutorBackend`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait ExecutorBackend: Send {
    /// Dispatch the given instances for execution.
    ///
    /// The implementation is free to:
    /// - spawn OS processes (production)
    /// - simulate completion and emit `RuntimeEvent`s (tests)
    fn spawn_ready_instances(
        &mut self,
        instances: Vec<ScheduledInstance>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Real executor backend used in production.
///
/// Internally, this just wraps the executor loop in [`spawn_executor`]. The
/// runtime calls `spawn_ready_instances`, which forwards the instances to
/// the background executor via an mpsc channel. The run context environment
/// (version, release id) is captured once at construction and injected into
/// every instance, so stages all see identical values.
pub struct RealExecutorBackend {
    tx: mpsc::Sender<ScheduledInstance>,
}

impl RealExecutorBackend {
    /// Create a new real executor backend, wiring it to the given runtime
    /// event sender.
    ///
    /// This spawns the background executor loop immediately.
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, run_env: Vec<(String, String)>) -> Self {
        let tx = spawn_executor(runtime_tx, run_env);
        Self { tx }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn spawn_ready_instances(
        &mut self,
        instances: Vec<ScheduledInstance>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            for instance in instances {
                tx.send(instance).await.map_err(Error::from)?;
            }
            Ok(())
        })
    }
}
