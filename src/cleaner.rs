//! Data cleaning: missing values, sign normalization, outlier capping and
//! duplicate removal, applied in that order.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::table::{Table, Value};

pub const OUTLIER_QUANTILE: f64 = 0.95;

/// Quantile of sorted data, interpolating linearly between the closest
/// ranks at position `(n - 1) * q`. Returns `None` for empty input.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Threshold and replacement for outlier capping, fixed for one cleaning pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierBounds {
    pub threshold: f64,
    pub median: f64,
}

impl OutlierBounds {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Some(Self {
            threshold: quantile(&sorted, OUTLIER_QUANTILE)?,
            median: quantile(&sorted, 0.5)?,
        })
    }
}

pub fn normalize_sign(v: f64) -> f64 {
    v.abs()
}

pub fn cap_outlier(v: f64, bounds: &OutlierBounds) -> f64 {
    if v >= bounds.threshold {
        bounds.median
    } else {
        v
    }
}

/// Drop rows with any missing cell, make `consumption_column` non-negative,
/// replace values at or above its 95th percentile with the median, then drop
/// exact duplicate rows keeping the first.
pub fn clean_readings(mut table: Table, consumption_column: &str) -> Result<Table> {
    let col = table.require_column(consumption_column, "clean")?;
    let loaded = table.len();

    table.retain(|row| !row.iter().any(Value::is_null));
    let complete = table.len();

    let normalized = table
        .column_values(col)
        .map(|v| {
            v.as_f64()
                .map(normalize_sign)
                .ok_or_else(|| Error::NotNumeric {
                    column: consumption_column.to_string(),
                    value: v.to_string(),
                    expected: "a number",
                })
        })
        .collect::<Result<Vec<f64>>>()?;

    if let Some(bounds) = OutlierBounds::from_values(&normalized) {
        debug!(
            "outlier threshold {} replaced by median {}",
            bounds.threshold, bounds.median
        );
        let capped = normalized
            .into_iter()
            .map(|v| Value::Float(cap_outlier(v, &bounds)))
            .collect();
        table.set_column(consumption_column, capped);
    }

    let mut seen = HashSet::new();
    table.retain(|row| seen.insert(row.clone()));

    info!(
        "cleaning kept {} of {} rows ({} incomplete, {} duplicate)",
        table.len(),
        loaded,
        loaded - complete,
        complete - table.len()
    );
    Ok(table)
}
