//! Raster map queries built on module handles.
//!
//! Used to check module results: value ranges (`r.info -r`), summary
//! statistics (`r.univar -g`) and cell-by-cell comparison of two maps.

use crate::{InvocationError, Invoker, Module};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Parse shell-style `key=value` lines, as printed by modules run with `-g`.
///
/// Lines without `=` are ignored. Keys and values are trimmed.
pub fn parse_key_values(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

/// `NULL` (no data) parses as `None`.
fn parse_number(command: &str, values: &BTreeMap<String, String>, key: &str) -> Result<Option<f64>, InvocationError> {
    let raw = values
        .get(key)
        .ok_or_else(|| InvocationError::output(command, format!("missing `{key}`")))?;
    if raw.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| InvocationError::output(command, format!("`{key}` is not a number: {raw}")))
}

/// Minimum and maximum cell values of a raster map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl RasterRange {
    pub fn query(invoker: &Arc<dyn Invoker>, map: &str) -> Result<Self, InvocationError> {
        let output = Module::new("r.info", invoker.clone())
            .flag('r')
            .option("map", map)
            .run()?;
        Self::parse(&output.stdout)
    }

    fn parse(text: &str) -> Result<Self, InvocationError> {
        let values = parse_key_values(text);
        Ok(Self {
            min: parse_number("r.info", &values, "min")?,
            max: parse_number("r.info", &values, "max")?,
        })
    }

    /// Whether every cell value lies in `[refmin, refmax]`. A map with only
    /// null cells has no values and is reported as not within.
    pub fn within(&self, refmin: f64, refmax: f64) -> bool {
        match (self.min, self.max) {
            (Some(min), Some(max)) => refmin <= min && max <= refmax,
            _ => false,
        }
    }
}

/// Univariate statistics of a raster map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnivarStats {
    /// Non-null cells.
    pub n: u64,
    pub null_cells: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub range: Option<f64>,
    pub mean: Option<f64>,
    pub stddev: Option<f64>,
    pub sum: Option<f64>,
}

impl UnivarStats {
    pub fn query(invoker: &Arc<dyn Invoker>, map: &str) -> Result<Self, InvocationError> {
        let output = Module::new("r.univar", invoker.clone())
            .flag('g')
            .option("map", map)
            .run()?;
        Self::parse(&output.stdout)
    }

    fn parse(text: &str) -> Result<Self, InvocationError> {
        const CMD: &str = "r.univar";
        let values = parse_key_values(text);
        let count = |key: &str| -> Result<u64, InvocationError> {
            let raw = values.get(key).map(String::as_str).unwrap_or("0");
            raw.parse()
                .map_err(|_| InvocationError::output(CMD, format!("`{key}` is not a count: {raw}")))
        };
        let n = count("n")?;
        let null_cells = count("null_cells")?;
        // With no non-null cells the remaining keys are absent
        if n == 0 {
            return Ok(Self {
                n,
                null_cells,
                min: None,
                max: None,
                range: None,
                mean: None,
                stddev: None,
                sum: None,
            });
        }
        Ok(Self {
            n,
            null_cells,
            min: parse_number(CMD, &values, "min")?,
            max: parse_number(CMD, &values, "max")?,
            range: parse_number(CMD, &values, "range")?,
            mean: parse_number(CMD, &values, "mean")?,
            stddev: parse_number(CMD, &values, "stddev")?,
            sum: parse_number(CMD, &values, "sum")?,
        })
    }
}

static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn temp_map_name() -> String {
    format!(
        "tmp_grassmod_diff_{}_{}",
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    )
}

/// Largest absolute cell difference between two maps in the current region.
///
/// Returns `None` when the maps share no non-null cells. The temporary
/// difference map is removed even when the statistics query fails.
pub fn max_abs_difference(
    invoker: &Arc<dyn Invoker>,
    actual: &str,
    reference: &str,
) -> Result<Option<f64>, InvocationError> {
    let diff = temp_map_name();
    Module::new("r.mapcalc", invoker.clone())
        .option("expression", format!("{diff} = abs({actual} - {reference})"))
        .quiet(true)
        .run()?;

    let stats = UnivarStats::query(invoker, &diff);

    let removed = Module::new("g.remove", invoker.clone())
        .flag('f')
        .option("type", "raster")
        .option("name", diff.as_str())
        .quiet(true)
        .run();
    if let Err(e) = &removed {
        tracing::warn!(map = %diff, error = %e, "failed to remove temporary map");
    }

    Ok(stats?.max)
}

/// Whether two maps agree within `precision` on every shared non-null cell.
pub fn rasters_match(
    invoker: &Arc<dyn Invoker>,
    actual: &str,
    reference: &str,
    precision: f64,
) -> Result<bool, InvocationError> {
    Ok(max_abs_difference(invoker, actual, reference)?.is_none_or(|max| max <= precision))
}
