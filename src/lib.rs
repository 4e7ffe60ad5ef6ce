// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod release;

use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::cli::CliArgs;
use crate::config::loader::{default_config_path, load_and_validate};
use crate::config::model::ConfigFile;
use crate::dag::Scheduler;
use crate::engine::{CoreRuntime, PublishStatus, Runtime, RuntimeEvent, RunReport};
use crate::errors::{PipelineError, Result};
use crate::exec::RealExecutorBackend;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the version/release resolver
/// - scheduler / runtime
/// - executor
/// - the publish step
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args
        .config
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    // Resolve version + draft release first; a resolver failure aborts the
    // run before any stage starts.
    let context = release::resolve(&cfg.resolver).await?;

    let scheduler = Scheduler::from_config(&cfg);

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    // Process executor backend; the run context is injected into every
    // instance it spawns.
    let executor = RealExecutorBackend::new(rt_tx.clone(), context.env_vars());

    // Ctrl-C → graceful shutdown: stop dispatching, report what we have.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    // Construct the pure core runtime (single source of truth for semantics)
    // and the async IO shell around it.
    let core = CoreRuntime::new(scheduler);
    let runtime = Runtime::new(core, rt_rx, executor);
    let core = runtime.run().await?;

    let mut report = RunReport::new(&context, core.instance_states());

    if core.halted() {
        info!("run was interrupted; the release stays a draft");
    } else if report.stages_succeeded() {
        if args.skip_publish {
            info!(release_id = %context.release_id, "--skip-publish set; release stays a draft");
            report.publish = PublishStatus::SkippedByFlag;
        } else {
            match release::publish(&cfg.publish, &context).await {
                Ok(()) => report.publish = PublishStatus::Published,
                Err(err) => {
                    error!(error = %err, "publish step failed");
                    report.publish = PublishStatus::Failed;
                    println!("{report}");
                    return Err(err);
                }
            }
        }
    }

    println!("{report}");

    if report.succeeded() {
        Ok(())
    } else {
        Err(PipelineError::RunFailed(report.to_string()))
    }
}

/// Simple dry-run output: print resolver, stages, deps, targets and the
/// publish command.
fn print_dry_run(cfg: &ConfigFile) {
    println!("shipit dry-run");
    println!(
        "  pipeline.max_parallel_per_target = {}",
        cfg.pipeline.max_parallel_per_target
    );
    println!("  resolver: {}", cfg.resolver.cmd);
    println!(
        "  resolver outputs: {}, {}",
        cfg.resolver.version_var, cfg.resolver.release_id_var
    );
    println!();

    println!("stages ({}):", cfg.stage.len());
    for (name, stage) in cfg.stage.iter() {
        println!("  - {name}");
        println!("      cmd: {}", stage.cmd);
        if !stage.needs.is_empty() {
            println!("      needs: {:?}", stage.needs);
        }
        println!("      targets: {:?}", stage.effective_targets());
        if !stage.env.is_empty() {
            println!("      env: {:?}", stage.env);
        }
        if !stage.pass_env.is_empty() {
            println!("      pass_env: {:?}", stage.pass_env);
        }
    }

    println!();
    println!("publish: {}", cfg.publish.cmd);
    if !cfg.publish.pass_env.is_empty() {
        println!("  pass_env: {:?}", cfg.publish.pass_env);
    }
}
