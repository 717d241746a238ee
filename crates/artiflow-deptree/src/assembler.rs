//! Loop-safe tree assembly shared by every ecosystem builder.

use std::collections::{BTreeSet, HashMap};

use artiflow_core::graph::{node_has_loop, GraphNode};
use tracing::debug;

use crate::graph::DependencyGraph;

/// Longest root-to-leaf path kept in a tree, counted in nodes.
pub const MAX_TREE_DEPTH: usize = 20;

/// A single id is expanded at most this many times across one tree.
pub const MAX_UNIQUE_APPEARANCES: usize = 10;

/// Trees produced for one technology, plus every id placed in any of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyTrees {
    pub trees: Vec<GraphNode>,
    pub unique_deps: BTreeSet<String>,
}

impl DependencyTrees {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tree along with the ids it contains.
    pub fn push(&mut self, tree: GraphNode, unique_deps: BTreeSet<String>) {
        self.trees.push(tree);
        self.unique_deps.extend(unique_deps);
    }

    /// Ids of the direct children of every root, first occurrence wins.
    pub fn direct_dependencies(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.trees
            .iter()
            .flat_map(|tree| tree.child_ids())
            .filter(|id| seen.insert(id.to_string()))
            .map(str::to_string)
            .collect()
    }

    pub fn is_multi_root(&self) -> bool {
        self.trees.len() > 1
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// A single synthetic `root` whose children are all unique dependencies.
    pub fn flat_tree(&self) -> GraphNode {
        GraphNode::with_children(
            "root",
            self.unique_deps.iter().map(GraphNode::new).collect(),
        )
    }
}

/// Assemble the tree rooted at `root_id` from `graph`.
///
/// A child already present on the current ancestry path is skipped, as is any
/// id that has been expanded [`MAX_UNIQUE_APPEARANCES`] times. Branches stop
/// growing once a path holds [`MAX_TREE_DEPTH`] nodes. Returns the tree and
/// the set of ids it contains, root included.
pub fn build_dependency_tree(
    graph: &DependencyGraph,
    root_id: &str,
) -> (GraphNode, BTreeSet<String>) {
    let mut root = GraphNode::new(root_id);
    let mut appearances: HashMap<String, usize> = HashMap::new();
    let mut path = Vec::new();
    populate(&mut root, graph, &mut path, &mut appearances);
    let unique_deps = appearances.into_keys().collect();
    (root, unique_deps)
}

fn populate(
    node: &mut GraphNode,
    graph: &DependencyGraph,
    path: &mut Vec<String>,
    appearances: &mut HashMap<String, usize>,
) {
    *appearances.entry(node.id.clone()).or_default() += 1;
    if path.len() + 1 >= MAX_TREE_DEPTH {
        if !graph.children(&node.id).is_empty() {
            debug!("Truncating {} at depth {MAX_TREE_DEPTH}", node.id);
        }
        return;
    }

    path.push(node.id.clone());
    for child_id in graph.children(&node.id) {
        if node_has_loop(path, child_id) {
            debug!("Skipping {child_id} under {}: dependency loop", node.id);
            continue;
        }
        if appearances.get(child_id).copied().unwrap_or(0) >= MAX_UNIQUE_APPEARANCES {
            continue;
        }
        let mut child = GraphNode::new(child_id);
        populate(&mut child, graph, path, appearances);
        node.nodes.push(child);
    }
    path.pop();
}
