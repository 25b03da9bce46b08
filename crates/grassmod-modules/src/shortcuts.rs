//! The standard command groups of a GRASS installation.

use crate::{CommandRegistry, HandleFactory, Invoker, ModuleFactory, Namespace};
use std::sync::Arc;

/// Command group, as listed in the manual's full index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Display,
    Database,
    General,
    Imagery,
    Miscellaneous,
    Postscript,
    Raster,
    Raster3d,
    Temporal,
    Vector,
}

impl Group {
    pub const ALL: [Group; 10] = [
        Group::Display,
        Group::Database,
        Group::General,
        Group::Imagery,
        Group::Miscellaneous,
        Group::Postscript,
        Group::Raster,
        Group::Raster3d,
        Group::Temporal,
        Group::Vector,
    ];

    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Display => "d",
            Self::Database => "db",
            Self::General => "g",
            Self::Imagery => "i",
            Self::Miscellaneous => "m",
            Self::Postscript => "ps",
            Self::Raster => "r",
            Self::Raster3d => "r3",
            Self::Temporal => "t",
            Self::Vector => "v",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Display => "display",
            Self::Database => "database",
            Self::General => "general",
            Self::Imagery => "imagery",
            Self::Miscellaneous => "miscellaneous",
            Self::Postscript => "postscript",
            Self::Raster => "raster",
            Self::Raster3d => "raster3d",
            Self::Temporal => "temporal",
            Self::Vector => "vector",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Display => "display commands",
            Self::Database => "database commands",
            Self::General => "general commands",
            Self::Imagery => "imagery commands",
            Self::Miscellaneous => "miscellaneous commands",
            Self::Postscript => "postscript commands",
            Self::Raster => "raster commands",
            Self::Raster3d => "3D raster commands",
            Self::Temporal => "temporal commands",
            Self::Vector => "vector commands",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.prefix() == prefix)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.name() == name)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// One namespace per [`Group`], all sharing a registry.
pub struct Shortcuts<F = ModuleFactory> {
    registry: Arc<CommandRegistry>,
    namespaces: Vec<Namespace<F>>,
}

impl Shortcuts<ModuleFactory> {
    pub fn new(registry: Arc<CommandRegistry>, invoker: Arc<dyn Invoker>) -> Self {
        Self::with_factory(registry, ModuleFactory::new(invoker))
    }
}

impl<F: HandleFactory + Clone> Shortcuts<F> {
    pub fn with_factory(registry: Arc<CommandRegistry>, factory: F) -> Self {
        let namespaces = Group::ALL
            .iter()
            .map(|g| Namespace::with_factory(g.prefix(), registry.clone(), factory.clone()))
            .collect();
        Self { registry, namespaces }
    }
}

impl<F: HandleFactory> Shortcuts<F> {
    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    pub fn get(&self, group: Group) -> &Namespace<F> {
        &self.namespaces[group.index()]
    }

    /// Namespace for a group prefix (`"r3"`) or group name (`"raster3d"`).
    pub fn find(&self, key: &str) -> Option<&Namespace<F>> {
        Group::from_prefix(key)
            .or_else(|| Group::from_name(key))
            .map(|g| self.get(g))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Group, &Namespace<F>)> {
        Group::ALL.into_iter().zip(self.namespaces.iter())
    }

    pub fn display(&self) -> &Namespace<F> {
        self.get(Group::Display)
    }

    pub fn database(&self) -> &Namespace<F> {
        self.get(Group::Database)
    }

    pub fn general(&self) -> &Namespace<F> {
        self.get(Group::General)
    }

    pub fn imagery(&self) -> &Namespace<F> {
        self.get(Group::Imagery)
    }

    pub fn miscellaneous(&self) -> &Namespace<F> {
        self.get(Group::Miscellaneous)
    }

    pub fn postscript(&self) -> &Namespace<F> {
        self.get(Group::Postscript)
    }

    pub fn raster(&self) -> &Namespace<F> {
        self.get(Group::Raster)
    }

    pub fn raster3d(&self) -> &Namespace<F> {
        self.get(Group::Raster3d)
    }

    pub fn temporal(&self) -> &Namespace<F> {
        self.get(Group::Temporal)
    }

    pub fn vector(&self) -> &Namespace<F> {
        self.get(Group::Vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DiscoveryError, Validation};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_group_lookup() {
        assert_eq!(Group::from_prefix("r3"), Some(Group::Raster3d));
        assert_eq!(Group::from_name("postscript"), Some(Group::Postscript));
        assert_eq!(Group::from_prefix("x"), None);
        for (i, g) in Group::ALL.iter().enumerate() {
            assert_eq!(g.index(), i);
        }
    }

    #[test]
    fn test_groups_share_one_registry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let registry = Arc::new(CommandRegistry::new(move || -> Result<Vec<String>, DiscoveryError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["r.info".to_string(), "v.info".to_string(), "g.list".to_string()])
        }));
        let shortcuts = Shortcuts::with_factory(registry, |name: String, _: Validation| name);

        assert_eq!(shortcuts.raster().enumerate().unwrap().collect::<Vec<_>>(), vec!["info"]);
        assert_eq!(shortcuts.vector().enumerate().unwrap().collect::<Vec<_>>(), vec!["info"]);
        assert_eq!(shortcuts.find("general").unwrap().resolve("list"), "g.list");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
