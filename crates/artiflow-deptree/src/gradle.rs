//! Gradle: nested `children` documents, one or more per build file.

use std::collections::{BTreeMap, BTreeSet};

use artiflow_core::graph::{node_has_loop, GraphNode};
use artiflow_core::technology::{Technology, GAV_PREFIX};
use artiflow_util::errors::ArtiflowError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assembler::{DependencyTrees, MAX_TREE_DEPTH};

/// A dependency and its children, keyed by GAV.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependenciesPaths {
    #[serde(default, rename = "children")]
    pub paths: BTreeMap<String, DependenciesPaths>,
}

impl DependenciesPaths {
    /// Merge `other` into `self`, unioning children at every level.
    pub fn merge(&mut self, other: DependenciesPaths) {
        for (gav, children) in other.paths {
            self.paths.entry(gav).or_default().merge(children);
        }
    }
}

/// Dependency documents gathered per build file.
#[derive(Debug, Clone, Default)]
pub struct GradleDepTrees {
    tree: BTreeMap<String, DependenciesPaths>,
}

impl GradleDepTrees {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one document and merge it into the entry for `build_file`.
    pub fn append(&mut self, build_file: &str, content: &str) -> miette::Result<()> {
        let paths: DependenciesPaths = serde_json::from_str(content).map_err(|e| {
            ArtiflowError::tree_build(
                Technology::Gradle,
                format!("invalid dependency document for '{build_file}': {e}"),
            )
        })?;
        self.tree.entry(build_file.to_string()).or_default().merge(paths);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// One tree per build file, in build-file name order.
    pub fn into_trees(self) -> DependencyTrees {
        let mut trees = DependencyTrees::new();
        for (build_file, paths) in self.tree {
            let mut root = GraphNode::new(format!("{GAV_PREFIX}{build_file}"));
            let mut unique_deps = BTreeSet::new();
            unique_deps.insert(root.id.clone());
            let mut path = vec![root.id.clone()];
            populate(&mut root, &paths, &mut path, &mut unique_deps);
            trees.push(root, unique_deps);
        }
        trees
    }
}

fn populate(
    node: &mut GraphNode,
    children: &DependenciesPaths,
    path: &mut Vec<String>,
    unique_deps: &mut BTreeSet<String>,
) {
    if path.len() >= MAX_TREE_DEPTH {
        debug!("Truncating {} at depth {MAX_TREE_DEPTH}", node.id);
        return;
    }
    for (gav, grandchildren) in &children.paths {
        let child_id = format!("{GAV_PREFIX}{gav}");
        if node_has_loop(path, &child_id) {
            continue;
        }
        let mut child = GraphNode::new(child_id.clone());
        unique_deps.insert(child_id.clone());
        path.push(child_id);
        populate(&mut child, grandchildren, path, unique_deps);
        path.pop();
        node.nodes.push(child);
    }
}
