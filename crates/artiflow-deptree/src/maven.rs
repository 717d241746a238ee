//! Maven: build-info modules or dependency-tree plugin documents.

use std::collections::BTreeMap;

use artiflow_core::buildinfo::{Dependency, Module};
use artiflow_core::technology::{Technology, GAV_PREFIX};
use artiflow_util::errors::ArtiflowError;
use serde::{Deserialize, Serialize};

use crate::assembler::{build_dependency_tree, DependencyTrees};
use crate::graph::DependencyGraph;

/// One module's dependency tree as written by the dependency-tree plugins:
/// `{"root": "g:a:v", "nodes": {"g:a:v": {"children": [...]}}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepTreeDocument {
    pub root: String,
    #[serde(default)]
    pub nodes: BTreeMap<String, DepTreeNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepTreeNode {
    #[serde(default)]
    pub children: Vec<String>,
}

impl DepTreeDocument {
    pub fn parse(content: &str, technology: Technology) -> miette::Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            ArtiflowError::tree_build(technology, format!("invalid dependency-tree document: {e}"))
                .into()
        })
    }
}

/// A dependency is direct when nothing requested it or when any of its
/// requested-by chains starts at the module itself.
pub fn is_direct_dependency(module_id: &str, dependency: &Dependency) -> bool {
    let mut parents = dependency.direct_parents().peekable();
    if parents.peek().is_none() {
        return true;
    }
    parents.any(|parent| parent == module_id)
}

/// Build one tree per build-info module.
pub fn build_maven_trees(modules: &[Module]) -> DependencyTrees {
    let mut trees = DependencyTrees::new();
    for module in modules {
        let module_node = format!("{GAV_PREFIX}{}", module.id);
        let mut graph = DependencyGraph::new();
        graph.add_node(&module_node);
        for dependency in &module.dependencies {
            let dependency_id = format!("{GAV_PREFIX}{}", dependency.id);
            if is_direct_dependency(&module.id, dependency) {
                graph.add_edge(&module_node, &dependency_id);
                continue;
            }
            for parent in dependency.direct_parents() {
                graph.add_edge(&format!("{GAV_PREFIX}{parent}"), &dependency_id);
            }
        }
        let (tree, unique_deps) = build_dependency_tree(&graph, &module_node);
        trees.push(tree, unique_deps);
    }
    trees
}

/// Build one tree per dependency-tree plugin document.
pub fn build_trees_from_documents(documents: &[DepTreeDocument]) -> DependencyTrees {
    let mut trees = DependencyTrees::new();
    for document in documents {
        let mut graph = DependencyGraph::new();
        for (id, node) in &document.nodes {
            for child in &node.children {
                graph.add_edge(&format!("{GAV_PREFIX}{id}"), &format!("{GAV_PREFIX}{child}"));
            }
        }
        let (tree, unique_deps) =
            build_dependency_tree(&graph, &format!("{GAV_PREFIX}{}", document.root));
        trees.push(tree, unique_deps);
    }
    trees
}
