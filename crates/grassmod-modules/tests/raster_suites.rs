//! Raster module suites run against a live GRASS session.
//!
//! Skipped unless `GISBASE` and `GISRC` point at a session. Tests that need
//! the `elevation` map of the North Carolina sample location skip when it is
//! missing.

use grassmod_modules::raster::{RasterRange, UnivarStats, rasters_match};
use grassmod_modules::{
    CommandRegistry, EnvInvoker, Invoker, Module, PathSource, ProcessInvoker, Shortcuts,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const SMALL_MAP: &str = "\
north:   15
south:   10
east:    25
west:    20
rows:    5
cols:    5

100.0 150.0 150.0 100.0 100.0
100.0 150.0 150.0 100.0 100.0
100.0 150.0 150.0 150.0 150.0
100.0 150.0 150.0 100.0 100.0
100.0 150.0 150.0 100.0 100.0
";

const GAPPY_MAP: &str = "\
north:   4
south:   0
east:    4
west:    0
rows:    4
cols:    4

1 2 3 4
2 * * 5
3 * 5 6
4 5 6 7
";

static REGION_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A live session with its own saved region, so tests can change the
/// computational region without disturbing each other.
///
/// Every module run through `invoker` sees the saved region through
/// `WIND_OVERRIDE`, including the raster queries used for assertions.
struct Session {
    base: Arc<dyn Invoker>,
    invoker: Arc<dyn Invoker>,
    shortcuts: Shortcuts,
    region: String,
    maps: Vec<String>,
}

impl Session {
    fn open(required: &[&str]) -> Option<Self> {
        if std::env::var_os("GISBASE").is_none() || std::env::var_os("GISRC").is_none() {
            eprintln!("skipping: GISBASE and GISRC must point at a GRASS session");
            return None;
        }
        let source = PathSource::from_env();
        let base: Arc<dyn Invoker> = Arc::new(ProcessInvoker::for_source(&source));
        let registry = Arc::new(CommandRegistry::new(source));
        let commands = match registry.ensure_populated() {
            Ok(commands) => commands,
            Err(e) => {
                eprintln!("skipping: cannot list installed modules: {e}");
                return None;
            }
        };
        if let Some(missing) = required.iter().find(|c| !commands.contains(c)) {
            eprintln!("skipping: {missing} is not installed");
            return None;
        }

        let region = format!(
            "tmp_grassmod_region_{}_{}",
            std::process::id(),
            REGION_COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        if let Err(e) = Module::new("g.region", base.clone())
            .option("save", region.as_str())
            .overwrite(true)
            .run()
        {
            eprintln!("skipping: cannot save a temporary region: {e}");
            return None;
        }

        let invoker: Arc<dyn Invoker> =
            Arc::new(EnvInvoker::new(base.clone()).env("WIND_OVERRIDE", region.as_str()));
        Some(Self {
            shortcuts: Shortcuts::new(registry, invoker.clone()),
            base,
            invoker,
            region,
            maps: Vec::new(),
        })
    }

    fn module(&self, namespace: &str, name: &str) -> Module {
        self.shortcuts
            .find(namespace)
            .map(|ns| ns.resolve(name))
            .unwrap_or_else(|| Module::new(format!("{namespace}.{name}"), self.invoker.clone()))
    }

    /// Remove `map` when the session ends.
    fn track(&mut self, map: &str) -> String {
        self.maps.push(map.to_string());
        map.to_string()
    }

    fn has_raster(&self, map: &str) -> bool {
        RasterRange::query(&self.invoker, map).is_ok()
    }

    fn range(&self, map: &str) -> RasterRange {
        RasterRange::query(&self.invoker, map).unwrap()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.maps.is_empty() {
            let _ = Module::new("g.remove", self.base.clone())
                .flag('f')
                .option("type", "raster")
                .option("name", self.maps.clone())
                .quiet(true)
                .run();
        }
        let _ = Module::new("g.remove", self.base.clone())
            .flag('f')
            .option("type", "region")
            .option("name", self.region.as_str())
            .quiet(true)
            .run();
    }
}

#[test]
fn test_slope_aspect_limits() {
    let Some(mut session) = Session::open(&["r.slope.aspect"]) else {
        return;
    };
    if !session.has_raster("elevation") {
        eprintln!("skipping: elevation map not available");
        return;
    }
    let slope = session.track("limits_slope");
    let aspect = session.track("limits_aspect");

    session
        .module("r", "slope_aspect")
        .option("elevation", "elevation")
        .option("slope", slope.as_str())
        .option("aspect", aspect.as_str())
        .overwrite(true)
        .run()
        .unwrap();

    assert!(session.range(&slope).within(0.0, 90.0), "slope in degrees must be between 0 and 90");
    assert!(session.range(&aspect).within(0.0, 360.0), "aspect in degrees must be between 0 and 360");
}

#[test]
fn test_slope_aspect_limits_percent() {
    let Some(mut session) = Session::open(&["r.slope.aspect"]) else {
        return;
    };
    if !session.has_raster("elevation") {
        eprintln!("skipping: elevation map not available");
        return;
    }
    let slope = session.track("limits_pct_slope");
    let aspect = session.track("limits_pct_aspect");

    session
        .module("r", "slope_aspect")
        .option("elevation", "elevation")
        .option("slope", slope.as_str())
        .option("aspect", aspect.as_str())
        .option("format", "percent")
        .overwrite(true)
        .run()
        .unwrap();

    // The sample elevation has no slope steeper than 45 degrees
    assert!(session.range(&slope).within(0.0, 100.0), "slope in percent must be between 0 and 100");
    assert!(session.range(&aspect).within(0.0, 360.0));
}

#[test]
fn test_slope_aspect_together_matches_separately() {
    let Some(mut session) = Session::open(&["r.slope.aspect", "r.mapcalc", "r.univar"]) else {
        return;
    };
    if !session.has_raster("elevation") {
        eprintln!("skipping: elevation map not available");
        return;
    }
    session.module("g", "region").option("raster", "elevation").run().unwrap();

    let s_aspect = session.track("sa_separately_aspect");
    let s_slope = session.track("sa_separately_slope");
    let t_aspect = session.track("sa_together_aspect");
    let t_slope = session.track("sa_together_slope");

    let base = session
        .module("r", "slope_aspect")
        .option("elevation", "elevation")
        .overwrite(true);
    base.call([("aspect", s_aspect.as_str())]).unwrap();
    base.call([("slope", s_slope.as_str())]).unwrap();
    base.call([("slope", t_slope.as_str()), ("aspect", t_aspect.as_str())])
        .unwrap();

    let invoker = session.invoker.clone();
    assert!(rasters_match(&invoker, &t_aspect, &s_aspect, 1e-7).unwrap());
    assert!(rasters_match(&invoker, &t_slope, &s_slope, 1e-7).unwrap());
}

#[test]
fn test_slope_aspect_small_map_extremes() {
    let Some(mut session) = Session::open(&["r.slope.aspect", "r.in.ascii"]) else {
        return;
    };
    let elevation = session.track("small_elevation");
    let slope = session.track("small_slope");
    let aspect = session.track("small_aspect");

    session
        .module("r", "in_ascii")
        .option("input", "-")
        .option("output", elevation.as_str())
        .stdin(SMALL_MAP)
        .overwrite(true)
        .run()
        .unwrap();
    session
        .module("g", "region")
        .option("raster", elevation.as_str())
        .run()
        .unwrap();
    session
        .module("r", "slope_aspect")
        .option("elevation", elevation.as_str())
        .option("slope", slope.as_str())
        .option("aspect", aspect.as_str())
        .overwrite(true)
        .run()
        .unwrap();

    assert!(session.range(&slope).within(0.0, 90.0));
    assert!(session.range(&aspect).within(0.0, 360.0));
}

#[test]
fn test_fill_stats_fills_nulls() {
    let Some(mut session) = Session::open(&["r.fill.stats", "r.in.ascii", "r.univar"]) else {
        return;
    };
    let input = session.track("fill_input");
    let output = session.track("fill_stats");

    session
        .module("r", "in_ascii")
        .option("input", "-")
        .option("output", input.as_str())
        .option("type", "CELL")
        .stdin(GAPPY_MAP)
        .overwrite(true)
        .run()
        .unwrap();
    session
        .module("g", "region")
        .option("raster", input.as_str())
        .run()
        .unwrap();

    let before = UnivarStats::query(&session.invoker, &input).unwrap();
    assert_eq!(before.null_cells, 3);

    for mode in ["wmean", "mean", "median", "mode"] {
        session
            .module("r", "fill_stats")
            .option("input", input.as_str())
            .option("output", output.as_str())
            .option("distance", 1)
            .option("mode", mode)
            .option("power", 2)
            .option("cells", 2)
            .overwrite(true)
            .run()
            .unwrap();

        let after = UnivarStats::query(&session.invoker, &output).unwrap();
        assert_eq!(after.null_cells, 0, "mode {mode} left null cells");
        assert_eq!(after.n, 16);
        let range = session.range(&output);
        assert!(range.within(1.0, 7.0), "mode {mode} produced {range:?}");
        // Cells that had values keep them
        assert!(
            rasters_match(&session.invoker, &output, &input, 1e-6).unwrap(),
            "mode {mode} changed non-null input cells"
        );
    }
}
