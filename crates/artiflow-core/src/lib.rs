//! Core data types for artiflow.
//!
//! This crate defines the types shared by tree building, scanning and
//! build-info collection: dependency graph nodes, the supported package
//! manager technologies, build-info entities and partial fragments, Xray
//! scan responses, and the global configuration.
//!
//! This crate is intentionally free of async code and network I/O.

/// Agent name recorded in published build-info documents.
pub const AGENT_NAME: &str = "artiflow";

pub mod buildinfo;
pub mod config;
pub mod graph;
pub mod scan;
pub mod technology;
