//! npm: a flat dependency list annotated with requested-by chains.

use artiflow_core::buildinfo::Dependency;
use artiflow_core::technology::NPM_PREFIX;

use crate::assembler::{build_dependency_tree, DependencyTrees};
use crate::graph::DependencyGraph;

/// Parent to child adjacency. The parent of each requested-by chain is its
/// first element; a repeated parent yields a single edge.
pub fn npm_dependency_graph(dependencies: &[Dependency]) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for dependency in dependencies {
        let dependency_id = format!("{NPM_PREFIX}{}", dependency.id);
        for parent in dependency.direct_parents() {
            graph.add_edge(&format!("{NPM_PREFIX}{parent}"), &dependency_id);
        }
    }
    graph
}

/// Build the tree of the package whose module id is `module_id` (`name:version`).
pub fn build_npm_tree(module_id: &str, dependencies: &[Dependency]) -> DependencyTrees {
    let graph = npm_dependency_graph(dependencies);
    let (tree, unique_deps) = build_dependency_tree(&graph, &format!("{NPM_PREFIX}{module_id}"));
    let mut trees = DependencyTrees::new();
    trees.push(tree, unique_deps);
    trees
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dep(id: &str, requested_by: &[&[&str]]) -> Dependency {
        Dependency {
            id: id.to_string(),
            requested_by: requested_by
                .iter()
                .map(|chain| chain.iter().map(|s| s.to_string()).collect())
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn repeated_parent_yields_single_child() {
        let deps = vec![dep(
            "ms:2.1.3",
            &[&["debug:4.3.4", "app:1.0.0"], &["debug:4.3.4", "express:4.18.2", "app:1.0.0"]],
        )];
        let graph = npm_dependency_graph(&deps);
        assert_eq!(graph.children("npm://debug:4.3.4"), vec!["npm://ms:2.1.3"]);
    }

    #[test]
    fn builds_tree_from_requested_by() {
        let deps = vec![
            dep("express:4.18.2", &[&["app:1.0.0"]]),
            dep("debug:4.3.4", &[&["express:4.18.2", "app:1.0.0"], &["app:1.0.0"]]),
            dep("ms:2.1.3", &[&["debug:4.3.4", "express:4.18.2", "app:1.0.0"]]),
        ];
        let trees = build_npm_tree("app:1.0.0", &deps);
        let tree = &trees.trees[0];
        assert_eq!(tree.id, "npm://app:1.0.0");
        assert_eq!(
            tree.child_ids().collect::<Vec<_>>(),
            vec!["npm://express:4.18.2", "npm://debug:4.3.4"]
        );
        let express = tree.find("npm://express:4.18.2").unwrap();
        assert_eq!(express.nodes[0].nodes[0].id, "npm://ms:2.1.3");
        assert_eq!(trees.unique_deps.len(), 4);
    }

    #[test]
    fn peer_dependency_cycle_is_pruned() {
        let deps = vec![
            dep("a:1.0.0", &[&["app:1.0.0"], &["b:1.0.0"]]),
            dep("b:1.0.0", &[&["a:1.0.0"]]),
        ];
        let trees = build_npm_tree("app:1.0.0", &deps);
        let b = trees.trees[0].find("npm://b:1.0.0").unwrap();
        assert!(b.nodes.is_empty());
    }
}
