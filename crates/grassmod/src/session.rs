//! Wiring from configuration to a live registry and invoker.

use crate::config::GrassConfig;
use grassmod_modules::{CommandRegistry, Invoker, PathSource, ProcessInvoker, Shortcuts};
use std::sync::Arc;

/// Everything a command needs to list and run modules.
pub struct Session {
    pub source: PathSource,
    pub invoker: Arc<dyn Invoker>,
    pub shortcuts: Shortcuts,
}

impl Session {
    /// Build from `[grass]` config, falling back to the environment for
    /// unset fields.
    pub fn from_config(config: &GrassConfig) -> Self {
        let grass = config.clone().with_env();
        let source = PathSource::default()
            .with_gisbase(grass.gisbase)
            .with_addon_base(grass.addon_base)
            .with_addon_paths(grass.addon_paths);
        tracing::debug!(dirs = ?source.search_dirs(), "module search directories");

        let invoker: Arc<dyn Invoker> = Arc::new(ProcessInvoker::for_source(&source));
        let registry = Arc::new(CommandRegistry::new(source.clone()));
        Self {
            source,
            shortcuts: Shortcuts::new(registry, invoker.clone()),
            invoker,
        }
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        self.shortcuts.registry()
    }
}
