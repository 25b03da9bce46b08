//! Command registry: a lazily populated, shared cache of command names.
//!
//! Listing every installed module means walking several directories, so the
//! result is cached and shared by every namespace built on the same registry.
//! The cache fills on first use and only changes on an explicit [`refresh`].
//!
//! [`refresh`]: CommandRegistry::refresh

use crate::{CommandSource, DiscoveryError, PathSource};
use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Sorted, de-duplicated set of fully qualified command names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSet {
    names: Vec<String>,
}

impl CommandSet {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        let mut names: Vec<String> = names.into_iter().collect();
        names.sort();
        names.dedup();
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names
            .binary_search_by(|n| n.as_str().cmp(name))
            .is_ok()
    }

    /// All names, in ascending order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Index range of the names starting with `prefix`.
    ///
    /// Names sharing a prefix are contiguous in sorted order, so two binary
    /// searches bound the range.
    pub fn prefix_range(&self, prefix: &str) -> Range<usize> {
        let start = self.names.partition_point(|n| n.as_str() < prefix);
        let len = self.names[start..].partition_point(|n| n.starts_with(prefix));
        start..start + len
    }

    /// Names starting with `prefix`, in ascending order.
    pub fn with_prefix(&self, prefix: &str) -> &[String] {
        &self.names[self.prefix_range(prefix)]
    }
}

type Outcome = Result<Arc<CommandSet>, DiscoveryError>;

/// Shared cache of installed command names.
///
/// Not a global: build one, wrap it in an `Arc`, and hand it to every
/// namespace that should share it.
///
/// Refreshes are serialized by a single lock. A caller that arrives while a
/// refresh is running waits for it and receives its outcome instead of
/// starting another discovery.
pub struct CommandRegistry {
    source: Box<dyn CommandSource>,
    current: RwLock<Option<Arc<CommandSet>>>,
    /// Held for the whole discovery call; stores the last attempt's outcome.
    refresh_lock: Mutex<Option<Outcome>>,
    /// Completed discovery attempts, successful or not.
    generation: AtomicU64,
}

impl CommandRegistry {
    pub fn new(source: impl CommandSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            current: RwLock::new(None),
            refresh_lock: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Registry backed by the installation named in `GISBASE`.
    pub fn from_env() -> Self {
        Self::new(PathSource::from_env())
    }

    /// Current contents, without triggering discovery.
    pub fn cached(&self) -> Option<Arc<CommandSet>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of discovery attempts made so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Return the cached set, running discovery first if it was never populated.
    pub fn ensure_populated(&self) -> Result<Arc<CommandSet>, DiscoveryError> {
        let seen = self.generation();
        if let Some(set) = self.cached() {
            return Ok(set);
        }
        self.refresh_from(seen, true)
    }

    /// Re-run discovery and replace the cached set.
    ///
    /// On failure the previous set stays cached and the error is returned.
    pub fn refresh(&self) -> Result<Arc<CommandSet>, DiscoveryError> {
        let seen = self.generation();
        self.refresh_from(seen, false)
    }

    /// `seen` is the generation observed when the caller arrived. If it moved
    /// by the time the lock is acquired, an attempt ran while we waited and
    /// its outcome is ours too.
    fn refresh_from(&self, seen: u64, accept_cached: bool) -> Outcome {
        let mut last = self
            .refresh_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if self.generation() != seen {
            if let Some(outcome) = last.as_ref() {
                return outcome.clone();
            }
        }
        if accept_cached {
            if let Some(set) = self.cached() {
                return Ok(set);
            }
        }

        tracing::info!("refreshing command registry");
        let outcome = self
            .source
            .discover()
            .map(|names| Arc::new(CommandSet::new(names)));

        match &outcome {
            Ok(set) => {
                tracing::debug!(commands = set.len(), "command registry populated");
                *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(set.clone());
            }
            Err(e) => tracing::warn!(error = %e, "command discovery failed"),
        }

        *last = Some(outcome.clone());
        self.generation.fetch_add(1, Ordering::Release);
        outcome
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.cached().map(|s| s.len()))
            .field("generation", &self.generation())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    type Listing = Result<Vec<String>, DiscoveryError>;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_command_set_sorts_and_dedups() {
        let set = CommandSet::new(names(&["v.import", "r.in.ascii", "g.list", "r.in.ascii"]));
        assert_eq!(set.names(), &names(&["g.list", "r.in.ascii", "v.import"])[..]);
        assert!(set.contains("g.list"));
        assert!(!set.contains("g.region"));
    }

    #[test]
    fn test_prefix_range_is_contiguous() {
        let set = CommandSet::new(names(&[
            "r.slope.aspect",
            "r3.info",
            "r.in.ascii",
            "ps.map",
            "r.info",
        ]));
        assert_eq!(set.with_prefix("r."), &names(&["r.in.ascii", "r.info", "r.slope.aspect"])[..]);
        assert_eq!(set.with_prefix("r3."), &names(&["r3.info"])[..]);
        assert!(set.with_prefix("x.").is_empty());
    }

    #[test]
    fn test_not_populated_at_construction() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let registry = CommandRegistry::new(move || -> Listing {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(names(&["g.list"]))
        });

        assert!(registry.cached().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        registry.ensure_populated().unwrap();
        registry.ensure_populated().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.generation(), 1);
    }

    #[test]
    fn test_refresh_picks_up_new_commands() {
        let installed = Arc::new(Mutex::new(names(&["g.list"])));
        let source = installed.clone();
        let registry = CommandRegistry::new(move || -> Listing { Ok(source.lock().unwrap().clone()) });

        assert_eq!(registry.ensure_populated().unwrap().len(), 1);
        installed.lock().unwrap().push("r.fill.stats".to_string());

        // Stale until refreshed
        assert_eq!(registry.ensure_populated().unwrap().len(), 1);
        assert!(registry.refresh().unwrap().contains("r.fill.stats"));
        assert!(registry.cached().unwrap().contains("r.fill.stats"));
    }

    #[test]
    fn test_failed_refresh_keeps_previous_set() {
        let fail = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = fail.clone();
        let registry = CommandRegistry::new(move || -> Listing {
            if flag.load(Ordering::SeqCst) {
                Err(DiscoveryError::Source("listing unavailable".to_string()))
            } else {
                Ok(names(&["g.list"]))
            }
        });

        registry.ensure_populated().unwrap();
        fail.store(true, Ordering::SeqCst);

        assert_eq!(
            registry.refresh(),
            Err(DiscoveryError::Source("listing unavailable".to_string()))
        );
        assert!(registry.cached().unwrap().contains("g.list"));
    }

    #[test]
    fn test_first_use_failure_propagates() {
        let registry = CommandRegistry::new(|| -> Listing { Err(DiscoveryError::GisbaseNotSet) });
        assert_eq!(registry.ensure_populated(), Err(DiscoveryError::GisbaseNotSet));
        assert!(registry.cached().is_none());
    }
}
