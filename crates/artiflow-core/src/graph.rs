use serde::{Deserialize, Serialize};

/// A node in a dependency tree, in the shape Xray's graph scan accepts.
///
/// Children are exclusively owned. There is no parent link: builders track
/// ancestry with an explicit path while recursing (see [`node_has_loop`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    #[serde(rename = "component_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<GraphNode>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nodes: Vec::new(),
        }
    }

    /// Builder-style constructor used mostly by tests and fixtures.
    pub fn with_children(id: impl Into<String>, nodes: Vec<GraphNode>) -> Self {
        Self {
            id: id.into(),
            nodes,
        }
    }

    /// Depth-first search for the first node with the given id.
    pub fn find(&self, id: &str) -> Option<&GraphNode> {
        if self.id == id {
            return Some(self);
        }
        self.nodes.iter().find_map(|child| child.find(id))
    }

    /// Total number of nodes in this tree, including the root.
    pub fn count(&self) -> usize {
        1 + self.nodes.iter().map(GraphNode::count).sum::<usize>()
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        1 + self.nodes.iter().map(GraphNode::depth).max().unwrap_or(0)
    }

    /// Ids of the direct children, in order.
    pub fn child_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.id.as_str())
    }
}

/// Returns `true` if `id` already appears on the ancestry `path`.
///
/// `path` holds the ids from the tree root down to the would-be parent.
/// Every recursive builder checks this before appending a child and prunes
/// the branch when it returns `true`.
pub fn node_has_loop(path: &[String], id: &str) -> bool {
    path.iter().any(|ancestor| ancestor == id)
}
