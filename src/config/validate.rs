// src/config/validate.rs

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile, LOCAL_TARGET};
use crate::errors::{PipelineError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PipelineError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_stages(cfg)?;
    validate_pipeline_section(cfg)?;
    validate_release_commands(cfg)?;
    validate_stage_dependencies(cfg)?;
    validate_stage_targets(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_stages(cfg: &RawConfigFile) -> Result<()> {
    if cfg.stage.is_empty() {
        return Err(PipelineError::Config(
            "pipeline must contain at least one [stage.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_pipeline_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.pipeline.max_parallel_per_target == 0 {
        return Err(PipelineError::Config(
            "[pipeline].max_parallel_per_target must be >= 1 (got 0)".to_string(),
        ));
    }

    for (name, target) in cfg.target.iter() {
        if target.max_parallel == Some(0) {
            return Err(PipelineError::Config(format!(
                "[target.{name}].max_parallel must be >= 1 (got 0)"
            )));
        }
    }

    Ok(())
}

fn validate_release_commands(cfg: &RawConfigFile) -> Result<()> {
    if cfg.resolver.cmd.trim().is_empty() {
        return Err(PipelineError::Config(
            "[resolver].cmd must not be empty".to_string(),
        ));
    }
    if cfg.publish.cmd.trim().is_empty() {
        return Err(PipelineError::Config(
            "[publish].cmd must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_stage_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, stage) in cfg.stage.iter() {
        for dep in stage.needs.iter() {
            if !cfg.stage.contains_key(dep) {
                return Err(PipelineError::Config(format!(
                    "stage '{}' has unknown dependency '{}' in `needs`",
                    name, dep
                )));
            }
            if dep == name {
                return Err(PipelineError::Config(format!(
                    "stage '{}' cannot depend on itself in `needs`",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn validate_stage_targets(cfg: &RawConfigFile) -> Result<()> {
    for (name, stage) in cfg.stage.iter() {
        let mut seen = HashSet::new();
        for target in stage.targets.iter() {
            if !seen.insert(target.as_str()) {
                return Err(PipelineError::Config(format!(
                    "stage '{}' lists target '{}' more than once in `targets`",
                    name, target
                )));
            }
            if target != LOCAL_TARGET && !cfg.target.contains_key(target) {
                return Err(PipelineError::Config(format!(
                    "stage '{}' runs on unknown target '{}' (declare a [target.{}] section)",
                    name, target, target
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Build a petgraph graph from the stages and their dependencies.
    //
    // Edge direction: dep -> stage
    // For:
    //   [stage.ide]
    //   needs = ["engine"]
    // we add edge engine -> ide.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.stage.keys() {
        graph.add_node(name.as_str());
    }

    for (name, stage) in cfg.stage.iter() {
        for dep in stage.needs.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    // A topological sort will fail if there is a cycle.
    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(PipelineError::StageCycle(format!(
                "cycle detected in stage graph involving stage '{}'",
                node
            )))
        }
    }
}
