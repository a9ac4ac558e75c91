//! Flat-rate versus time-of-use cost comparison.

use tracing::info;

use crate::error::{Error, Result};
use crate::loader::HOUR_COLUMN;
use crate::table::{Table, Value};

pub const FLAT_COST_COLUMN: &str = "Electricity cost (£) on current flat rate tariff";
pub const TARIFF_TYPE_COLUMN: &str = "tariff_type";

/// Name of the savings column for an alternate tariff.
pub fn savings_column(tariff_name: &str) -> String {
    format!("Potential cost savings (£) if household was on an {tariff_name} tariff")
}

/// Two-band time-of-use rates per kWh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TariffSchedule {
    pub low: f64,
    pub high: f64,
}

impl TariffSchedule {
    /// Low band before `cutoff_hour`, high band from it onwards.
    pub fn rate_for_hour(&self, hour: i64, cutoff_hour: u32) -> f64 {
        if hour < i64::from(cutoff_hour) {
            self.low
        } else {
            self.high
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlternateTariff {
    pub name: String,
    pub schedule: TariffSchedule,
    pub cutoff_hour: u32,
}

pub fn flat_cost(consumption: f64, fixed_rate: f64) -> f64 {
    consumption * fixed_rate
}

pub fn alternate_cost(rate: f64, consumption: f64) -> f64 {
    rate * consumption
}

/// Append flat cost, `tariff_type`, alternate cost and savings columns.
pub fn calculate_cost(
    mut table: Table,
    consumption_column: &str,
    fixed_rate: f64,
    alternate: &AlternateTariff,
) -> Result<Table> {
    let kwh_idx = table.require_column(consumption_column, "cost")?;
    let hour_idx = table.require_column(HOUR_COLUMN, "cost")?;

    let mut flat = Vec::with_capacity(table.len());
    let mut rates = Vec::with_capacity(table.len());
    let mut other = Vec::with_capacity(table.len());
    let mut savings = Vec::with_capacity(table.len());

    for row in table.rows() {
        let kwh = row[kwh_idx].as_f64().ok_or_else(|| Error::NotNumeric {
            column: consumption_column.to_string(),
            value: row[kwh_idx].to_string(),
            expected: "a number",
        })?;
        let hour = row[hour_idx].as_i64().ok_or_else(|| Error::NotNumeric {
            column: HOUR_COLUMN.to_string(),
            value: row[hour_idx].to_string(),
            expected: "an integer hour",
        })?;

        let current = flat_cost(kwh, fixed_rate);
        let rate = alternate.schedule.rate_for_hour(hour, alternate.cutoff_hour);
        let candidate = alternate_cost(rate, kwh);

        flat.push(Value::Float(current));
        rates.push(Value::Float(rate));
        other.push(Value::Float(candidate));
        savings.push(Value::Float(current - candidate));
    }

    table.set_column(FLAT_COST_COLUMN, flat);
    table.set_column(TARIFF_TYPE_COLUMN, rates);
    table.set_column(&alternate.name, other);
    table.set_column(&savings_column(&alternate.name), savings);

    info!("costed {} rows against {}", table.len(), alternate.name);
    Ok(table)
}
