//! grassmod - browse, resolve and run GRASS GIS modules.
//!
//! The library half of the `grassmod` binary: configuration, output
//! formatting and one module per subcommand. The namespace machinery itself
//! lives in `grassmod-modules`.
//!
//! # Example
//!
//! ```ignore
//! use grassmod::config::GrassmodConfig;
//! use grassmod::session::Session;
//!
//! let config = GrassmodConfig::load(Path::new("."));
//! let session = Session::from_config(&config.grass);
//! let names: Vec<String> = session.shortcuts.raster().enumerate()?.collect();
//! ```

pub mod commands;
pub mod config;
pub mod logging;
pub mod merge;
pub mod output;
pub mod session;
