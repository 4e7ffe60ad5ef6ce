// src/dag/graph.rs

use std::collections::HashMap;

use crate::config::model::ConfigFile;

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone)]
struct StageNode {
    /// Direct dependencies: stages that must succeed before this one can run.
    deps: Vec<String>,
    /// Direct dependents: stages that depend on this one.
    dependents: Vec<String>,
}

/// Simple in-memory DAG representation keyed by stage name.
///
/// This is intentionally lightweight; we already validate acyclicity in
/// `config::validate`, so here we just keep adjacency information for
/// scheduling and diagnostics.
#[derive(Debug, Clone)]
pub struct StageGraph {
    nodes: HashMap<String, StageNode>,
}

impl StageGraph {
    /// Build a stage graph from a validated [`ConfigFile`].
    ///
    /// Assumes that:
    /// - all `needs` references are valid
    /// - there are no cycles
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let mut nodes: HashMap<String, StageNode> = HashMap::new();

        // First pass: create nodes with their dependency lists.
        for (name, stage) in cfg.stage.iter() {
            nodes.insert(
                name.clone(),
                StageNode {
                    deps: stage.needs.clone(),
                    dependents: Vec::new(),
                },
            );
        }

        // Second pass: populate dependents based on deps.
        let stage_names: Vec<String> = nodes.keys().cloned().collect();
        for stage_name in stage_names {
            // clone to avoid borrowing issues while mutating
            let deps = nodes
                .get(&stage_name)
                .map(|n| n.deps.clone())
                .unwrap_or_default();

            for dep in deps {
                if let Some(dep_node) = nodes.get_mut(&dep) {
                    dep_node.dependents.push(stage_name.clone());
                }
            }
        }

        Self { nodes }
    }

    /// Return all stage names.
    pub fn stages(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    /// Immediate dependents of a stage (stages that list this one in their `needs`).
    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }
}
