//! Configuration system for grassmod.
//!
//! Loads config from:
//! 1. Global: ~/.config/grassmod/config.toml
//! 2. Per-project: .grassmod/config.toml (overrides global)
//!
//! Example config.toml:
//! ```toml
//! [grass]
//! gisbase = "/usr/lib/grass84"    # default: $GISBASE
//! addon_base = "~/.grass8/addons" # default: $GRASS_ADDON_BASE
//! addon_paths = ["/opt/grass-addons/bin"]
//!
//! [run]
//! quiet = true                    # pass --q to every module run
//! overwrite = false               # pass --o to every module run
//!
//! [bench]
//! repeat = 10                     # runs per strategy
//!
//! [pretty]
//! enabled = true                  # auto-enable when TTY (default: auto)
//! colors = "auto"                 # "auto", "always", or "never"
//! ```

use crate::merge::Merge;
use crate::output::PrettyConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Where the GRASS installation lives.
#[derive(Debug, Clone, Deserialize, Merge, Default)]
#[serde(default)]
pub struct GrassConfig {
    pub gisbase: Option<PathBuf>,
    pub addon_base: Option<PathBuf>,
    /// Extra addon directories. Project entries are added to global ones.
    #[merge(append)]
    pub addon_paths: Vec<PathBuf>,
}

impl GrassConfig {
    /// Fill unset fields from `GISBASE`, `GRASS_ADDON_BASE` and
    /// `GRASS_ADDON_PATH`.
    pub fn with_env(self) -> Self {
        let env = Self {
            gisbase: std::env::var_os("GISBASE").map(PathBuf::from),
            addon_base: std::env::var_os("GRASS_ADDON_BASE").map(PathBuf::from),
            addon_paths: std::env::var_os("GRASS_ADDON_PATH")
                .map(|p| std::env::split_paths(&p).collect())
                .unwrap_or_default(),
        };
        self.fill_from(env)
    }

    /// Explicit fields win; `addon_paths` from `fallback` are only used when
    /// none are configured.
    fn fill_from(self, fallback: Self) -> Self {
        Self {
            gisbase: self.gisbase.or(fallback.gisbase),
            addon_base: self.addon_base.or(fallback.addon_base),
            addon_paths: if self.addon_paths.is_empty() {
                fallback.addon_paths
            } else {
                self.addon_paths
            },
        }
    }
}

/// Defaults for `grassmod run`.
#[derive(Debug, Clone, Deserialize, Merge, Default)]
#[serde(default)]
pub struct RunConfig {
    pub quiet: Option<bool>,
    pub overwrite: Option<bool>,
}

impl RunConfig {
    pub fn quiet(&self) -> bool {
        self.quiet.unwrap_or(false)
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Deserialize, Merge, Default)]
#[serde(default)]
pub struct BenchConfig {
    /// Runs per strategy. Default: 10
    pub repeat: Option<usize>,
}

impl BenchConfig {
    pub fn repeat(&self) -> usize {
        self.repeat.unwrap_or(10).max(1)
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Default, Merge)]
#[serde(default)]
pub struct GrassmodConfig {
    pub grass: GrassConfig,
    pub run: RunConfig,
    pub bench: BenchConfig,
    pub pretty: PrettyConfig,
}

impl GrassmodConfig {
    /// Load configuration for a project.
    ///
    /// Loads global config from ~/.config/grassmod/config.toml,
    /// then merges with per-project config from .grassmod/config.toml.
    pub fn load(root: &Path) -> Self {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::load_file(&global_path) {
                config = config.merge(global);
            }
        }

        let project_path = grassmod_core::project_dir(root).join("config.toml");
        if let Some(project) = Self::load_file(&project_path) {
            config = config.merge(project);
        }

        config
    }

    fn global_config_path() -> Option<PathBuf> {
        Some(grassmod_core::global_config_dir()?.join("config.toml"))
    }

    /// A missing file is silently absent; an unreadable or malformed one is
    /// skipped with a warning.
    fn load_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read config file");
                return None;
            }
        };
        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file");
                None
            }
        }
    }
}
