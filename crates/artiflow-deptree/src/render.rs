use artiflow_core::graph::GraphNode;

use crate::assembler::DependencyTrees;

/// Render a tree with box-drawing connectors, one node per line.
///
/// With `max_depth`, nodes deeper than that many levels below the root are omitted.
pub fn render_tree(tree: &GraphNode, max_depth: Option<usize>) -> String {
    let mut output = format!("{}\n", tree.id);
    let count = tree.nodes.len();
    for (i, child) in tree.nodes.iter().enumerate() {
        render_subtree(&mut output, child, "", i == count - 1, 1, max_depth);
    }
    output
}

/// Render every tree, separated by blank lines.
pub fn render_trees(trees: &DependencyTrees, max_depth: Option<usize>) -> String {
    trees
        .trees
        .iter()
        .map(|tree| render_tree(tree, max_depth))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_subtree(
    output: &mut String,
    node: &GraphNode,
    prefix: &str,
    is_last: bool,
    depth: usize,
    max_depth: Option<usize>,
) {
    let connector = if is_last { "└── " } else { "├── " };
    output.push_str(&format!("{prefix}{connector}{}\n", node.id));

    if let Some(max) = max_depth {
        if depth >= max {
            return;
        }
    }

    let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
    let count = node.nodes.len();
    for (i, child) in node.nodes.iter().enumerate() {
        render_subtree(output, child, &child_prefix, i == count - 1, depth + 1, max_depth);
    }
}
