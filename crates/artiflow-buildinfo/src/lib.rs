//! Build-info collection.
//!
//! Every command that contributes to a build (adding artifacts, dependencies,
//! VCS details, the environment) persists a [`Partial`] fragment. At publish
//! time the fragments are read back, merged into modules with duplicates
//! removed, and assembled into a single [`BuildInfo`] document.
//!
//! [`Partial`]: artiflow_core::buildinfo::Partial
//! [`BuildInfo`]: artiflow_core::buildinfo::BuildInfo

pub mod filter;
pub mod merge;
pub mod publish;
pub mod store;

pub use merge::{extract_build_info_data, ExtractError, ExtractedBuildInfo};
pub use store::{BuildKey, BuildStore};
