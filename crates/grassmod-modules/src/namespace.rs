//! Command namespaces: prefix-keyed views over the registry.
//!
//! A namespace turns short, identifier-friendly names into fully qualified
//! commands. The raster namespace (`r`) resolves `slope_aspect` to
//! `r.slope.aspect`, and lists `in_ascii` for `r.in.ascii`.
//!
//! Resolution never consults the registry: any name yields a handle, and a
//! misspelled command only fails when the handle is run. Use
//! [`Namespace::lookup`] to check against the registry first.

use crate::{CommandRegistry, CommandSet, DiscoveryError, Invoker, ModuleFactory};
use serde::Serialize;
use std::ops::Range;
use std::sync::Arc;

/// Separator between the segments of a command name.
pub const SEPARATOR: char = '.';

/// Whether a handle's command name was checked against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Validation {
    /// Built from the name alone; the command may not exist.
    Unvalidated,
    /// The command was present in the registry when the handle was built.
    Registered,
}

/// Builds the handle returned by a namespace lookup.
pub trait HandleFactory: Send + Sync {
    type Handle;

    fn create(&self, name: String, validation: Validation) -> Self::Handle;
}

impl<F, H> HandleFactory for F
where
    F: Fn(String, Validation) -> H + Send + Sync,
{
    type Handle = H;

    fn create(&self, name: String, validation: Validation) -> H {
        self(name, validation)
    }
}

/// Turn a short name into the command subname.
///
/// Strips one leading and one trailing underscore, then maps the remaining
/// underscores to separators: `import_` → `import`, `slope_aspect` →
/// `slope.aspect`.
pub fn denormalize(name: &str) -> String {
    let name = name.strip_prefix('_').unwrap_or(name);
    let name = name.strip_suffix('_').unwrap_or(name);
    name.replace('_', ".")
}

/// Turn a full command name into a short name under `prefix`, or `None` when
/// it belongs to another namespace.
pub fn normalize(prefix: &str, full: &str) -> Option<String> {
    full.strip_prefix(prefix)?
        .strip_prefix(SEPARATOR)
        .map(|rest| rest.replace(SEPARATOR, "_"))
}

/// A prefix-keyed view over a shared [`CommandRegistry`].
pub struct Namespace<F = ModuleFactory> {
    prefix: String,
    registry: Arc<CommandRegistry>,
    factory: F,
}

impl Namespace<ModuleFactory> {
    /// Namespace producing runnable [`Module`](crate::Module) handles.
    pub fn new(
        prefix: impl Into<String>,
        registry: Arc<CommandRegistry>,
        invoker: Arc<dyn Invoker>,
    ) -> Self {
        Self::with_factory(prefix, registry, ModuleFactory::new(invoker))
    }
}

impl<F: HandleFactory> Namespace<F> {
    /// No check is made that `prefix` names a real group; an unknown prefix
    /// simply enumerates nothing.
    pub fn with_factory(prefix: impl Into<String>, registry: Arc<CommandRegistry>, factory: F) -> Self {
        Self {
            prefix: prefix.into(),
            registry,
            factory,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Fully qualified command name for a short name.
    pub fn qualify(&self, name: &str) -> String {
        format!("{}{}{}", self.prefix, SEPARATOR, denormalize(name))
    }

    /// Short names of the registered commands under this prefix.
    ///
    /// Populates the registry on first use. The listing is recomputed on every
    /// call and ordered by full command name.
    pub fn enumerate(&self) -> Result<Members, DiscoveryError> {
        let set = self.registry.ensure_populated()?;
        Ok(Members::new(set, &self.prefix))
    }

    /// Handle for `prefix.denormalize(name)`. Never fails and never touches
    /// the registry.
    pub fn resolve(&self, name: &str) -> F::Handle {
        self.factory
            .create(self.qualify(name), Validation::Unvalidated)
    }

    /// Like [`resolve`](Self::resolve), but returns `None` if the command is
    /// not in the registry.
    pub fn lookup(&self, name: &str) -> Result<Option<F::Handle>, DiscoveryError> {
        let full = self.qualify(name);
        let set = self.registry.ensure_populated()?;
        Ok(set
            .contains(&full)
            .then(|| self.factory.create(full, Validation::Registered)))
    }

    /// Force the shared registry to re-run discovery.
    pub fn refresh(&self) -> Result<(), DiscoveryError> {
        self.registry.refresh().map(|_| ())
    }
}

/// Lazy iterator over the short names in one namespace.
///
/// Holds its own snapshot of the registry, so a concurrent refresh does not
/// affect an iteration in progress.
#[derive(Debug, Clone)]
pub struct Members {
    set: Arc<CommandSet>,
    range: Range<usize>,
    strip: usize,
}

impl Members {
    fn new(set: Arc<CommandSet>, prefix: &str) -> Self {
        let head = format!("{prefix}{SEPARATOR}");
        let range = set.prefix_range(&head);
        Self {
            set,
            range,
            strip: head.len(),
        }
    }
}

impl Iterator for Members {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let idx = self.range.next()?;
        let full = &self.set.names()[idx];
        Some(full[self.strip..].replace(SEPARATOR, "_"))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }
}

impl ExactSizeIterator for Members {}

#[cfg(test)]
mod tests {
    use super::*;

    type Listing = Result<Vec<String>, DiscoveryError>;

    fn registry(list: &'static [&'static str]) -> Arc<CommandRegistry> {
        Arc::new(CommandRegistry::new(move || -> Listing {
            Ok(list.iter().map(|s| s.to_string()).collect())
        }))
    }

    fn names_only(
        prefix: &str,
        registry: Arc<CommandRegistry>,
    ) -> Namespace<impl HandleFactory<Handle = String>> {
        Namespace::with_factory(prefix, registry, |name: String, _: Validation| name)
    }

    #[test]
    fn test_denormalize() {
        assert_eq!(denormalize("slope_aspect"), "slope.aspect");
        assert_eq!(denormalize("import_"), "import");
        assert_eq!(denormalize("_list"), "list");
        // Only one underscore is stripped from each end
        assert_eq!(denormalize("__x__"), ".x.");
        assert_eq!(denormalize("info"), "info");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("r", "r.slope.aspect").as_deref(), Some("slope_aspect"));
        assert_eq!(normalize("r", "r3.info"), None);
        assert_eq!(normalize("v", "r.info"), None);
    }

    #[test]
    fn test_enumerate_scenario() {
        let ns = names_only("r", registry(&["r.slope.aspect", "r.in.ascii", "v.import", "g.list"]));
        let members: Vec<String> = ns.enumerate().unwrap().collect();
        assert_eq!(members, vec!["in_ascii", "slope_aspect"]);
    }

    #[test]
    fn test_enumerate_excludes_longer_prefixes() {
        let ns = names_only("r", registry(&["r3.info", "r.info", "r3.out.vtk"]));
        let members: Vec<String> = ns.enumerate().unwrap().collect();
        assert_eq!(members, vec!["info"]);

        let ns3 = names_only("r3", ns.registry().clone());
        assert_eq!(ns3.enumerate().unwrap().len(), 2);
    }

    #[test]
    fn test_unknown_prefix_is_empty_but_still_resolves() {
        let ns = names_only("zz", registry(&["r.info"]));
        assert_eq!(ns.enumerate().unwrap().count(), 0);
        assert_eq!(ns.resolve("anything"), "zz.anything");
    }

    #[test]
    fn test_resolve_alias_for_reserved_word() {
        let ns = names_only("v", registry(&["v.import"]));
        assert_eq!(ns.resolve("import_"), "v.import");
    }

    #[test]
    fn test_resolve_does_not_populate_registry() {
        let ns = names_only("r", registry(&["r.info"]));
        let _ = ns.resolve("info");
        assert!(ns.registry().cached().is_none());
    }

    #[test]
    fn test_lookup_tags_registered_handles() {
        let ns = Namespace::with_factory(
            "g",
            registry(&["g.list"]),
            |name: String, validation: Validation| (name, validation),
        );
        assert_eq!(
            ns.lookup("list").unwrap(),
            Some(("g.list".to_string(), Validation::Registered))
        );
        assert_eq!(ns.lookup("lsit").unwrap(), None);
        assert_eq!(ns.resolve("lsit"), ("g.lsit".to_string(), Validation::Unvalidated));
    }

    #[test]
    fn test_enumerate_propagates_discovery_failure() {
        let failing = Arc::new(CommandRegistry::new(|| -> Listing {
            Err(DiscoveryError::Source("malformed listing".to_string()))
        }));
        let ns = names_only("r", failing);
        assert_eq!(
            ns.enumerate().unwrap_err(),
            DiscoveryError::Source("malformed listing".to_string())
        );
    }
}
