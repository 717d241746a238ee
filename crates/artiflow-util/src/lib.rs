//! Shared utilities for artiflow.
//!
//! This crate provides cross-cutting concerns used by all other artiflow crates:
//! the unified error type, filesystem helpers, artifact checksums, and
//! Cargo-style terminal status output.

pub mod errors;
pub mod fs;
pub mod hash;
pub mod progress;
