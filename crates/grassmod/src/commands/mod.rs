//! CLI command implementations - one module per top-level command.

pub mod bench;
pub mod describe;
pub mod list;
pub mod resolve;
pub mod run;

use crate::session::Session;
use grassmod_modules::{Group, Namespace, SEPARATOR};

/// Namespace for `key`: a group prefix (`r3`), a group name (`raster3d`), or
/// any other prefix over the same registry.
pub(crate) fn namespace_for(session: &Session, key: &str) -> Namespace {
    let prefix = Group::from_name(key).map_or(key, |g| g.prefix());
    Namespace::new(prefix, session.registry().clone(), session.invoker.clone())
}

/// Split a full command name into its prefix and short name:
/// `r.slope.aspect` → (`r`, `slope_aspect`).
pub(crate) fn split_command(command: &str) -> Option<(&str, String)> {
    let (prefix, rest) = command.split_once(SEPARATOR)?;
    Some((prefix, rest.replace(SEPARATOR, "_")))
}
