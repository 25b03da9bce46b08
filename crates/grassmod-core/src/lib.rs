//! Shared types and utilities for grassmod crates.

mod merge;
mod paths;

pub use merge::Merge;
pub use paths::{global_config_dir, project_dir};
