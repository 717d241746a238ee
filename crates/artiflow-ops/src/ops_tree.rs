//! Operation: display dependency trees built from package manager output.

use artiflow_deptree::render::render_trees;
use artiflow_deptree::DependencyTrees;
use artiflow_util::errors::ArtiflowError;

use crate::inputs::{build_trees, TreeInputs};

/// Options for `artiflow tree`.
#[derive(Debug, Clone, Default)]
pub struct TreeOptions {
    /// Maximum tree depth to display.
    pub depth: Option<usize>,
    /// Print the trees in Xray graph JSON instead of text.
    pub json: bool,
    /// Show a single root holding every unique dependency.
    pub flat: bool,
    /// List only the direct dependencies of every root.
    pub direct: bool,
}

/// Display the dependency trees described by `inputs`.
pub fn tree(inputs: &TreeInputs, opts: &TreeOptions) -> miette::Result<()> {
    let trees = build_trees(inputs)?;
    if trees.is_empty() {
        artiflow_util::progress::status_warn("Tree", "no dependency trees were built");
        return Ok(());
    }
    println!("{}", render(&trees, opts)?.trim_end());
    if trees.is_multi_root() {
        artiflow_util::progress::status(
            "Built",
            &format!(
                "{} roots, {} unique dependencies",
                trees.trees.len(),
                trees.unique_deps.len()
            ),
        );
    }
    Ok(())
}

/// Format trees according to `opts`.
pub fn render(trees: &DependencyTrees, opts: &TreeOptions) -> miette::Result<String> {
    if opts.direct {
        return Ok(trees.direct_dependencies().join("\n"));
    }
    let flat_trees;
    let shown = if opts.flat {
        flat_trees = DependencyTrees {
            trees: vec![trees.flat_tree()],
            unique_deps: trees.unique_deps.clone(),
        };
        &flat_trees
    } else {
        trees
    };

    if opts.json {
        let value = if shown.trees.len() == 1 {
            serde_json::to_string_pretty(&shown.trees[0])
        } else {
            serde_json::to_string_pretty(&shown.trees)
        };
        return value.map_err(|e| {
            ArtiflowError::Generic {
                message: format!("Failed to serialize dependency tree: {e}"),
            }
            .into()
        });
    }
    Ok(render_trees(shown, opts.depth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use artiflow_core::graph::GraphNode;
    use std::collections::BTreeSet;

    fn sample() -> DependencyTrees {
        let mut trees = DependencyTrees::new();
        let tree = GraphNode::with_children(
            "npm://app:1",
            vec![
                GraphNode::with_children("npm://a:1", vec![GraphNode::new("npm://c:1")]),
                GraphNode::new("npm://b:1"),
            ],
        );
        let ids: BTreeSet<String> = ["npm://app:1", "npm://a:1", "npm://b:1", "npm://c:1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        trees.push(tree, ids);
        trees
    }

    #[test]
    fn renders_text_tree() {
        let out = render(&sample(), &TreeOptions::default()).unwrap();
        assert!(out.starts_with("npm://app:1"));
        assert!(out.contains("npm://c:1"));
    }

    #[test]
    fn depth_limit_hides_grandchildren() {
        let opts = TreeOptions {
            depth: Some(1),
            ..Default::default()
        };
        let out = render(&sample(), &opts).unwrap();
        assert!(out.contains("npm://a:1"));
        assert!(!out.contains("npm://c:1"));
    }

    #[test]
    fn json_uses_component_id() {
        let opts = TreeOptions {
            json: true,
            ..Default::default()
        };
        let out = render(&sample(), &opts).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["component_id"], "npm://app:1");
        assert_eq!(value["nodes"][1]["component_id"], "npm://b:1");
    }

    #[test]
    fn direct_lists_root_children() {
        let opts = TreeOptions {
            direct: true,
            ..Default::default()
        };
        assert_eq!(render(&sample(), &opts).unwrap(), "npm://a:1\nnpm://b:1");
    }

    #[test]
    fn flat_tree_has_synthetic_root() {
        let opts = TreeOptions {
            flat: true,
            json: true,
            ..Default::default()
        };
        let out = render(&sample(), &opts).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["component_id"], "root");
        assert_eq!(value["nodes"].as_array().unwrap().len(), 4);
    }
}
