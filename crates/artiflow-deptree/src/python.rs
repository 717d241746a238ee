//! pip, Pipenv and Poetry: `pipdeptree --json` output.

use std::collections::HashSet;

use artiflow_core::technology::{Technology, PYPI_PREFIX};
use artiflow_util::errors::ArtiflowError;
use serde::{Deserialize, Serialize};

use crate::assembler::{build_dependency_tree, DependencyTrees};
use crate::graph::DependencyGraph;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipPackage {
    pub key: String,
    #[serde(default)]
    pub package_name: String,
    pub installed_version: String,
}

impl PipPackage {
    pub fn id(&self) -> String {
        format!("{}:{}", self.key, self.installed_version)
    }
}

/// One installed package and its direct requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipDepTreeEntry {
    pub package: PipPackage,
    #[serde(default)]
    pub dependencies: Vec<PipPackage>,
}

/// Parse `pipdeptree --json` into an adjacency graph plus the top-level
/// packages (those nothing else depends on), in input order.
pub fn parse_pipdeptree(
    content: &str,
    technology: Technology,
) -> miette::Result<(DependencyGraph, Vec<String>)> {
    let entries: Vec<PipDepTreeEntry> = serde_json::from_str(content).map_err(|e| {
        ArtiflowError::tree_build(technology, format!("invalid pipdeptree output: {e}"))
    })?;

    let mut graph = DependencyGraph::new();
    let mut required = HashSet::new();
    for entry in &entries {
        let parent = format!("{PYPI_PREFIX}{}", entry.package.id());
        graph.add_node(&parent);
        for dependency in &entry.dependencies {
            let child = format!("{PYPI_PREFIX}{}", dependency.id());
            graph.add_edge(&parent, &child);
            required.insert(child);
        }
    }

    let top_level = entries
        .iter()
        .map(|entry| format!("{PYPI_PREFIX}{}", entry.package.id()))
        .filter(|id| !required.contains(id))
        .collect();
    Ok((graph, top_level))
}

/// Build one tree per top-level package.
pub fn build_python_trees(graph: &DependencyGraph, top_level: &[String]) -> DependencyTrees {
    let mut trees = DependencyTrees::new();
    for root in top_level {
        let (tree, unique_deps) = build_dependency_tree(graph, root);
        trees.push(tree, unique_deps);
    }
    trees
}
