//! Go modules: `go mod graph` output filtered by the `go list -m all` module list.

use std::collections::HashSet;

use artiflow_core::graph::GraphNode;
use artiflow_core::technology::{Technology, GO_PREFIX};
use artiflow_util::errors::ArtiflowError;
use tracing::debug;

use crate::assembler::{build_dependency_tree, DependencyTrees};
use crate::graph::DependencyGraph;

const GO_SOURCE_PREFIX: &str = "github.com/golang/go:v";

/// Parse `go mod graph` output. Each line is `parent@version child@version`;
/// the main module appears without a version. Ids use `path:version`.
pub fn parse_mod_graph(output: &str) -> miette::Result<DependencyGraph> {
    let mut graph = DependencyGraph::new();
    for (line_no, line) in output.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(parent), Some(child), None) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(ArtiflowError::tree_build(
                Technology::Go,
                format!("malformed 'go mod graph' line {}: {line}", line_no + 1),
            )
            .into());
        };
        graph.add_edge(&module_id(parent), &module_id(child));
    }
    Ok(graph)
}

/// Parse the authoritative module list (`go list -m all`). Lines are either
/// `path version` or `path:version`; the main module is a bare path.
pub fn parse_module_list(output: &str) -> HashSet<String> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let path = fields.next()?;
            Some(match fields.next() {
                Some(version) if version != "=>" => format!("{path}:{version}"),
                _ => path.to_string(),
            })
        })
        .collect()
}

/// Read the module path from `go.mod` content.
pub fn parse_module_name(go_mod: &str) -> miette::Result<String> {
    go_mod
        .lines()
        .map(|line| line.split("//").next().unwrap_or("").trim())
        .find_map(|line| {
            let rest = line.strip_prefix("module")?;
            rest.starts_with(|c: char| c.is_whitespace() || c == '"')
                .then_some(rest)
        })
        .map(|rest| rest.trim().trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            ArtiflowError::tree_build(Technology::Go, "no module directive in go.mod").into()
        })
}

/// The Go toolchain as a dependency node: `go1.21.3` or `1.21.3` becomes
/// `go://github.com/golang/go:v1.21.3`.
pub fn go_version_node(version: &str) -> GraphNode {
    let version = version.trim();
    let version = version.strip_prefix("go").unwrap_or(version);
    GraphNode::new(format!("{GO_PREFIX}{GO_SOURCE_PREFIX}{version}"))
}

/// Build the single tree for module `module_name`.
///
/// Edges whose child is missing from `module_list` are dropped: `go mod graph`
/// reports modules that the build list later prunes.
pub fn build_go_tree(
    module_name: &str,
    mod_graph: &DependencyGraph,
    module_list: &HashSet<String>,
    go_version: Option<&str>,
) -> DependencyTrees {
    let mut filtered = DependencyGraph::new();
    let mut dropped = 0usize;
    for parent in mod_graph.node_ids() {
        for child in mod_graph.children(parent) {
            if module_list.contains(child) {
                filtered.add_edge(
                    &format!("{GO_PREFIX}{parent}"),
                    &format!("{GO_PREFIX}{child}"),
                );
            } else {
                dropped += 1;
            }
        }
    }
    if dropped > 0 {
        debug!("Dropped {dropped} go graph edges absent from the module list");
    }

    let (mut root, mut unique_deps) =
        build_dependency_tree(&filtered, &format!("{GO_PREFIX}{module_name}"));
    if let Some(version) = go_version {
        let node = go_version_node(version);
        unique_deps.insert(node.id.clone());
        root.nodes.push(node);
    }

    let mut trees = DependencyTrees::new();
    trees.push(root, unique_deps);
    trees
}

fn module_id(module: &str) -> String {
    module.replacen('@', ":", 1)
}
