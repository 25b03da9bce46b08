//! `Merge` trait and derive, re-exported for config types.

pub use grassmod_core::Merge;
pub use grassmod_derive::Merge;
