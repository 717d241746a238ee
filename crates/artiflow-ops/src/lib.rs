pub mod inputs;
pub mod ops_audit;
pub mod ops_build;
pub mod ops_tree;
pub mod xray;
