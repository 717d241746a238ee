//! Dependency tree construction for Xray graph scans.
//!
//! Package managers report dependencies as flat lists or adjacency maps that
//! may contain cycles. This crate turns them into loop-free [`GraphNode`]
//! trees, one builder per ecosystem, all sharing the same assembler, and
//! attaches impact paths to scan results using those trees.
//!
//! [`GraphNode`]: artiflow_core::graph::GraphNode

pub mod assembler;
pub mod golang;
pub mod gradle;
pub mod graph;
pub mod impact;
pub mod maven;
pub mod npm;
pub mod nuget;
pub mod python;
pub mod render;

pub use assembler::{build_dependency_tree, DependencyTrees};
pub use graph::DependencyGraph;
