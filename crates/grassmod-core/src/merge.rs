//! Layered configuration merging.
//!
//! Config is loaded from several files (global, then per-project). Later
//! layers override earlier ones field by field, so a project file that only
//! sets `[run] quiet` keeps every other value from the global file.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Combine two configuration layers. `other` is the higher-priority layer.
///
/// Derive it for config structs with `#[derive(Merge)]`; every field must
/// implement `Merge` itself.
pub trait Merge {
    fn merge(self, other: Self) -> Self;
}

/// `None` means "not specified", so it never clobbers an explicit value.
impl<T> Merge for Option<T> {
    fn merge(self, other: Self) -> Self {
        other.or(self)
    }
}

impl Merge for bool {
    fn merge(self, other: Self) -> Self {
        other
    }
}

impl Merge for String {
    fn merge(self, other: Self) -> Self {
        other
    }
}

/// Lists are replaced wholesale, not appended.
impl<T> Merge for Vec<T> {
    fn merge(self, other: Self) -> Self {
        if other.is_empty() { self } else { other }
    }
}

impl<K: Eq + Hash, V> Merge for HashMap<K, V> {
    fn merge(mut self, other: Self) -> Self {
        self.extend(other);
        self
    }
}

impl<K: Ord, V> Merge for BTreeMap<K, V> {
    fn merge(mut self, other: Self) -> Self {
        self.extend(other);
        self
    }
}
