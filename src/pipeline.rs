use std::path::PathBuf;

use tracing::info;

use crate::aggregate::group_sum;
use crate::cleaner::clean_readings;
use crate::error::Result;
use crate::filter::{Constraints, filter_rows};
use crate::loader::{MONTH_COLUMN, YEAR_COLUMN, load_readings};
use crate::table::{Table, Value};
use crate::tariff::{
    AlternateTariff, FLAT_COST_COLUMN, TariffSchedule, calculate_cost, savings_column,
};

pub const METER_COLUMN: &str = "meter_id";

/// Every literal the pipeline runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub timestamp_column: String,
    pub consumption_column: String,
    pub filter_enabled: bool,
    pub constraints: Constraints,
    pub fixed_rate: f64,
    pub alternate: AlternateTariff,
    pub group_by: Vec<String>,
    /// Output columns; `None` selects the grouping keys, flat cost and savings.
    pub select: Option<Vec<String>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let constraints = [
            (MONTH_COLUMN, Value::Int(12)),
            (YEAR_COLUMN, Value::Int(2013)),
            (METER_COLUMN, Value::from("MAC000069")),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            input: PathBuf::from("ee_coding_challenge_dataset.csv"),
            timestamp_column: "DateTime".to_string(),
            consumption_column: "consumption_kwh".to_string(),
            filter_enabled: false,
            constraints,
            fixed_rate: 0.15,
            alternate: AlternateTariff {
                name: "Economy 7".to_string(),
                schedule: TariffSchedule {
                    low: 0.12,
                    high: 0.16,
                },
                cutoff_hour: 7,
            },
            group_by: [MONTH_COLUMN, YEAR_COLUMN, METER_COLUMN]
                .map(String::from)
                .to_vec(),
            select: None,
        }
    }
}

impl PipelineConfig {
    pub fn output_columns(&self) -> Vec<String> {
        match &self.select {
            Some(cols) => cols.clone(),
            None => {
                let mut cols = self.group_by.clone();
                cols.push(FLAT_COST_COLUMN.to_string());
                cols.push(savings_column(&self.alternate.name));
                cols
            }
        }
    }
}

/// Load, filter, clean, cost, group and project. The first failing step aborts the run.
pub fn run(config: &PipelineConfig) -> Result<Table> {
    info!("reading {}", config.input.display());
    let table = load_readings(&config.input, &config.timestamp_column)?;
    let table = filter_rows(table, config.filter_enabled, &config.constraints)?;
    let table = clean_readings(table, &config.consumption_column)?;
    let table = calculate_cost(
        table,
        &config.consumption_column,
        config.fixed_rate,
        &config.alternate,
    )?;
    let grouped = group_sum(&table, &config.group_by)?;
    grouped.select(&config.output_columns())
}
