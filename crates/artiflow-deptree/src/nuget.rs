//! NuGet: one tree per project of a solution.

use artiflow_core::buildinfo::Module;
use artiflow_core::technology::NUGET_PREFIX;

use crate::assembler::{build_dependency_tree, DependencyTrees};
use crate::graph::DependencyGraph;

/// Build one tree per module. A dependency's parent is the first element of
/// its first requested-by chain, or the module itself when it has none.
pub fn build_nuget_trees(modules: &[Module]) -> DependencyTrees {
    let mut trees = DependencyTrees::new();
    for module in modules {
        let module_node = format!("{NUGET_PREFIX}{}", module.id);
        let mut graph = DependencyGraph::new();
        for dependency in &module.dependencies {
            let parent = match dependency.direct_parents().next() {
                Some(parent) => format!("{NUGET_PREFIX}{parent}"),
                None => module_node.clone(),
            };
            graph.add_edge(&parent, &format!("{NUGET_PREFIX}{}", dependency.id));
        }
        let (tree, unique_deps) = build_dependency_tree(&graph, &module_node);
        trees.push(tree, unique_deps);
    }
    trees
}
