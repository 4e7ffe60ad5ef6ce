// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dag::ScheduledInstance;
use crate::errors::Result;
use crate::exec::ExecutorBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent};

/// Drives the stage scheduler in response to `RuntimeEvent`s,
/// and delegates actual command execution to an `ExecutorBackend`.
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// runtime semantics. This struct handles async IO: reading events from
/// channels and dispatching instances to the executor.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Main event loop.
    ///
    /// - Dispatches the root instances.
    /// - Consumes `RuntimeEvent`s from `event_rx`.
    /// - Feeds them into the core runtime.
    /// - Executes commands returned by the core.
    ///
    /// Returns the core so the caller can build a [`super::RunReport`] from
    /// the final instance states.
    pub async fn run(mut self) -> Result<CoreRuntime> {
        info!("shipit runtime started");

        let start = self.core.start_run();
        for command in start.commands {
            self.execute_command(command).await?;
        }

        if start.keep_running {
            loop {
                let event = match self.event_rx.recv().await {
                    Some(e) => e,
                    None => {
                        info!("runtime event channel closed; exiting");
                        break;
                    }
                };

                debug!(?event, "runtime received event");

                // Feed the event into the pure core and get commands back.
                let step = self.core.step(event);

                // Execute the commands.
                for command in step.commands {
                    self.execute_command(command).await?;
                }

                // If the core says to stop, break out of the loop.
                if !step.keep_running {
                    info!("core requested exit; stopping runtime");
                    break;
                }
            }
        }

        info!("runtime exiting");
        Ok(self.core)
    }

    /// Execute a single command from the core.
    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchInstances(instances) => {
                self.spawn_ready(instances).await?;
            }
        }
        Ok(())
    }

    async fn spawn_ready(&mut self, instances: Vec<ScheduledInstance>) -> Result<()> {
        if instances.is_empty() {
            return Ok(());
        }

        let names: Vec<_> = instances
            .iter()
            .map(|i| format!("{}@{}", i.stage, i.target))
            .collect();
        debug!(?names, "spawning ready instances");

        self.executor.spawn_ready_instances(instances).await
    }
}
