//! Command namespaces for GRASS modules.
//!
//! A GRASS installation ships hundreds of modules as executables named
//! `group.verb[.detail]`: `r.slope.aspect`, `v.import`, `g.list`. This crate
//! exposes them grouped by prefix:
//!
//! - [`CommandRegistry`]: lazily populated, shared list of installed commands
//! - [`Namespace`]: prefix-keyed view that enumerates and resolves short names
//! - [`Module`]: handle that builds and runs one invocation
//! - [`Shortcuts`]: the ten standard groups (`d`, `db`, `g`, ... `v`)
//!
//! # Example
//!
//! ```ignore
//! use grassmod_modules::{default_shortcuts};
//!
//! let shortcuts = default_shortcuts();
//! for name in shortcuts.raster().enumerate()? {
//!     println!("{name}");
//! }
//!
//! // `import` is awkward as an identifier; a trailing underscore is dropped
//! shortcuts.vector().resolve("import_")
//!     .option("input", "roads.shp")
//!     .option("output", "roads")
//!     .run()?;
//! ```

mod discovery;
mod invoke;
mod module;
mod namespace;
pub mod raster;
mod registry;
mod shortcuts;
#[cfg(test)]
mod testing;

pub use discovery::{CommandSource, DiscoveryError, PathSource};
pub use invoke::{EnvInvoker, InvocationError, Invoker, ModuleOutput, ProcessInvoker};
pub use module::{Invocation, Module, ModuleFactory, Value};
pub use namespace::{HandleFactory, Members, Namespace, SEPARATOR, Validation, denormalize, normalize};
pub use registry::{CommandRegistry, CommandSet};
pub use shortcuts::{Group, Shortcuts};

use std::sync::Arc;

/// Shortcuts over the installation named by the environment, running modules
/// as child processes.
pub fn default_shortcuts() -> Shortcuts {
    let source = PathSource::from_env();
    let invoker = Arc::new(ProcessInvoker::for_source(&source));
    Shortcuts::new(Arc::new(CommandRegistry::new(source)), invoker)
}
