//! CLI command implementations

pub mod pods;
pub mod refresh;
