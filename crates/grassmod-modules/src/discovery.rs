//! Command discovery: find the names of every installed module.
//!
//! GRASS installs modules as plain executables named after the command
//! (`r.slope.aspect`, `v.import`). Compiled modules live in `$GISBASE/bin`,
//! script modules in `$GISBASE/scripts`, and addons in the directories listed
//! by `GRASS_ADDON_PATH` or under `GRASS_ADDON_BASE`.

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error raised when the set of installed commands cannot be listed.
///
/// Cloneable so that every caller waiting on one refresh receives the same
/// outcome.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("GISBASE is not set; cannot locate installed modules")]
    GisbaseNotSet,
    #[error("failed to read command directory {}: {message}", path.display())]
    ReadDir { path: PathBuf, message: String },
    #[error("command discovery failed: {0}")]
    Source(String),
}

/// Something that can list the command names available right now.
///
/// Called exactly once per registry refresh.
pub trait CommandSource: Send + Sync {
    fn discover(&self) -> Result<Vec<String>, DiscoveryError>;
}

impl<F> CommandSource for F
where
    F: Fn() -> Result<Vec<String>, DiscoveryError> + Send + Sync,
{
    fn discover(&self) -> Result<Vec<String>, DiscoveryError> {
        self()
    }
}

/// Extensions stripped from executable names on Windows.
#[cfg(windows)]
const EXECUTABLE_EXTENSIONS: &[&str] = &["exe", "bat", "py"];

/// Scans the installation and addon directories for module executables.
#[derive(Debug, Clone, Default)]
pub struct PathSource {
    gisbase: Option<PathBuf>,
    addon_base: Option<PathBuf>,
    addon_paths: Vec<PathBuf>,
}

impl PathSource {
    pub fn new(gisbase: impl Into<PathBuf>) -> Self {
        Self {
            gisbase: Some(gisbase.into()),
            ..Default::default()
        }
    }

    /// Build from `GISBASE`, `GRASS_ADDON_BASE` and `GRASS_ADDON_PATH`.
    pub fn from_env() -> Self {
        Self {
            gisbase: std::env::var_os("GISBASE").map(PathBuf::from),
            addon_base: std::env::var_os("GRASS_ADDON_BASE").map(PathBuf::from),
            addon_paths: std::env::var_os("GRASS_ADDON_PATH")
                .map(|p| std::env::split_paths(&p).collect())
                .unwrap_or_default(),
        }
    }

    pub fn with_gisbase(mut self, gisbase: Option<PathBuf>) -> Self {
        self.gisbase = gisbase;
        self
    }

    pub fn with_addon_base(mut self, addon_base: Option<PathBuf>) -> Self {
        self.addon_base = addon_base;
        self
    }

    pub fn with_addon_paths(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.addon_paths.extend(paths);
        self
    }

    pub fn gisbase(&self) -> Option<&Path> {
        self.gisbase.as_deref()
    }

    /// Directories that may hold module executables, in lookup order.
    ///
    /// Empty when `GISBASE` is unknown.
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        let Some(gisbase) = &self.gisbase else {
            return Vec::new();
        };
        let mut dirs = vec![gisbase.join("bin"), gisbase.join("scripts")];
        dirs.extend(self.addon_paths.iter().cloned());
        if let Some(base) = &self.addon_base {
            dirs.push(base.join("bin"));
            dirs.push(base.join("scripts"));
        }
        dirs
    }
}

impl CommandSource for PathSource {
    fn discover(&self) -> Result<Vec<String>, DiscoveryError> {
        if self.gisbase.is_none() {
            return Err(DiscoveryError::GisbaseNotSet);
        }

        let per_dir: Vec<Vec<String>> = self
            .search_dirs()
            .par_iter()
            .map(|dir| scan_dir(dir))
            .collect::<Result<_, _>>()?;

        let names: Vec<String> = per_dir.into_iter().flatten().collect();
        tracing::debug!(count = names.len(), "discovered module executables");
        Ok(names)
    }
}

/// List executable names in one directory. A missing directory is empty.
fn scan_dir(dir: &Path) -> Result<Vec<String>, DiscoveryError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let read_err = |e: std::io::Error| DiscoveryError::ReadDir {
        path: dir.to_path_buf(),
        message: e.to_string(),
    };

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        // is_file follows symlinks, so linked addons count too
        if !path.is_file() {
            continue;
        }
        if let Some(name) = command_name(&path) {
            names.push(name);
        }
    }
    Ok(names)
}

#[cfg(not(windows))]
fn command_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

#[cfg(windows)]
fn command_name(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if EXECUTABLE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) => {
            path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
        }
        _ => Some(name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(name), "").unwrap();
    }

    #[test]
    fn test_missing_gisbase() {
        let source = PathSource::default();
        assert_eq!(source.discover(), Err(DiscoveryError::GisbaseNotSet));
        assert!(source.search_dirs().is_empty());
    }

    #[test]
    fn test_scans_bin_scripts_and_addons() {
        let gisbase = TempDir::new().unwrap();
        let addons = TempDir::new().unwrap();
        let extra = TempDir::new().unwrap();

        touch(&gisbase.path().join("bin"), "r.slope.aspect");
        touch(&gisbase.path().join("bin"), "g.list");
        touch(&gisbase.path().join("scripts"), "r.simple");
        touch(&addons.path().join("scripts"), "r.fill.stats");
        touch(extra.path(), "v.import");
        // Directories inside bin are not commands
        std::fs::create_dir_all(gisbase.path().join("bin").join("r.subdir")).unwrap();

        let source = PathSource::new(gisbase.path())
            .with_addon_base(Some(addons.path().to_path_buf()))
            .with_addon_paths([extra.path().to_path_buf()]);

        let mut names = source.discover().unwrap();
        names.sort();
        assert_eq!(
            names,
            vec!["g.list", "r.fill.stats", "r.simple", "r.slope.aspect", "v.import"]
        );
    }

    #[test]
    fn test_missing_directories_are_skipped() {
        let gisbase = TempDir::new().unwrap();
        touch(&gisbase.path().join("bin"), "g.region");

        let names = PathSource::new(gisbase.path()).discover().unwrap();
        assert_eq!(names, vec!["g.region"]);
    }

    #[test]
    fn test_closure_source() {
        let source = || -> Result<Vec<String>, DiscoveryError> { Ok(vec!["r.in.ascii".to_string()]) };
        assert_eq!(source.discover().unwrap(), vec!["r.in.ascii"]);
    }
}
