use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use shipit::dag::ScheduledInstance;
use shipit::engine::{InstanceOutcome, RuntimeEvent};
use shipit::errors::Result;
use shipit::exec::ExecutorBackend;

/// A fake executor that:
/// - records which (stage, target) instances were "run", in dispatch order
/// - immediately reports `InstanceCompleted` for each scheduled instance,
///   failing the ones whose stage name is in `failing_stages` and
///   succeeding the rest.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<(String, String)>>>,
    failing_stages: HashSet<String>,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        executed: Arc<Mutex<Vec<(String, String)>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            failing_stages: HashSet::new(),
        }
    }

    /// Instances of these stages complete with `Failed(1)`.
    pub fn failing_stages(mut self, stages: &[&str]) -> Self {
        self.failing_stages = stages.iter().map(|s| s.to_string()).collect();
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_instances(
        &mut self,
        instances: Vec<ScheduledInstance>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let failing = self.failing_stages.clone();

        Box::pin(async move {
            for instance in instances {
                {
                    let mut guard = executed.lock().unwrap();
                    guard.push((instance.stage.clone(), instance.target.clone()));
                }

                let outcome = if failing.contains(&instance.stage) {
                    InstanceOutcome::Failed(1)
                } else {
                    InstanceOutcome::Success
                };

                tx.send(RuntimeEvent::InstanceCompleted {
                    stage: instance.stage.clone(),
                    target: instance.target.clone(),
                    outcome,
                })
                .await
                .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
