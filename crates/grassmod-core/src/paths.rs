//! Path utilities for grassmod configuration directories.
//!
//! The per-project directory can be relocated via the GRASSMOD_DIR
//! environment variable, for checkouts where `.grassmod` is unwanted.

use std::path::{Path, PathBuf};

/// Get the grassmod directory for a project.
///
/// Resolution order:
/// 1. If GRASSMOD_DIR is set to an absolute path, use it directly
/// 2. If GRASSMOD_DIR is set to a relative path, resolve it against `root`
/// 3. Otherwise, use <root>/.grassmod
pub fn project_dir(root: &Path) -> PathBuf {
    if let Ok(dir) = std::env::var("GRASSMOD_DIR") {
        let path = PathBuf::from(&dir);
        if path.is_absolute() {
            return path;
        }
        return root.join(path);
    }
    root.join(".grassmod")
}

/// Get the global config directory (`$XDG_CONFIG_HOME/grassmod`, falling back
/// to `~/.config/grassmod`).
pub fn global_config_dir() -> Option<PathBuf> {
    let config_home = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .ok()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))?;
    Some(config_home.join("grassmod"))
}
