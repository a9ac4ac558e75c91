//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;

use crate::filter::{Constraints, parse_constraint};
use crate::pipeline::PipelineConfig;
use crate::report::OutputFormat;
use crate::tariff::{AlternateTariff, TariffSchedule};

/// Compare smart-meter electricity costs on a flat tariff against a time-of-use tariff
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the readings CSV file
    #[arg(short, long, default_value = "ee_coding_challenge_dataset.csv")]
    pub input: PathBuf,

    /// Column holding the reading timestamp
    #[arg(long, default_value = "DateTime")]
    pub timestamp_column: String,

    /// Column holding consumption in kWh
    #[arg(long, default_value = "consumption_kwh")]
    pub consumption_column: String,

    /// Apply the --where constraints
    #[arg(short, long)]
    pub filter: bool,

    /// Keep rows where COLUMN equals VALUE (repeatable)
    #[arg(
        short = 'w',
        long = "where",
        value_name = "COLUMN=VALUE",
        default_values = ["month=12", "year=2013", "meter_id=MAC000069"]
    )]
    pub constraints: Vec<String>,

    /// Current flat rate per kWh
    #[arg(long, default_value = "0.15")]
    pub fixed_rate: f64,

    /// Name of the alternate time-of-use tariff
    #[arg(long, default_value = "Economy 7")]
    pub tariff_name: String,

    /// Alternate tariff rate before the cutoff hour
    #[arg(long, default_value = "0.12")]
    pub low_rate: f64,

    /// Alternate tariff rate from the cutoff hour onwards
    #[arg(long, default_value = "0.16")]
    pub high_rate: f64,

    /// Hour of day (0-24) at which the high rate starts
    #[arg(long, default_value = "7", value_parser = clap::value_parser!(u32).range(0..=24))]
    pub cutoff: u32,

    /// Columns to group by
    #[arg(short, long, value_delimiter = ',', default_value = "month,year,meter_id")]
    pub group_by: Vec<String>,

    /// Columns to print; defaults to the group columns, flat cost and savings
    #[arg(short, long, value_delimiter = ',')]
    pub select: Option<Vec<String>>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Decimal places for floats in table output
    #[arg(long, default_value = "2")]
    pub precision: usize,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Build the pipeline configuration, rejecting malformed constraints.
    pub fn to_config(&self) -> crate::Result<PipelineConfig> {
        let constraints = self
            .constraints
            .iter()
            .map(|c| parse_constraint(c, &self.timestamp_column))
            .collect::<crate::Result<Constraints>>()?;

        Ok(PipelineConfig {
            input: self.input.clone(),
            timestamp_column: self.timestamp_column.clone(),
            consumption_column: self.consumption_column.clone(),
            filter_enabled: self.filter,
            constraints,
            fixed_rate: self.fixed_rate,
            alternate: AlternateTariff {
                name: self.tariff_name.clone(),
                schedule: TariffSchedule {
                    low: self.low_rate,
                    high: self.high_rate,
                },
                cutoff_hour: self.cutoff,
            },
            group_by: self.group_by.clone(),
            select: self.select.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    #[test]
    fn test_defaults_match_pipeline_defaults() {
        let args = Args::parse_from(["meter_tariff"]);
        assert_eq!(args.to_config().unwrap(), PipelineConfig::default());
    }

    #[test]
    fn test_where_and_lists() {
        let args = Args::parse_from([
            "meter_tariff",
            "--filter",
            "--where",
            "meter_id=MAC000002",
            "--group-by",
            "year,meter_id",
            "--select",
            "year,meter_id",
            "--cutoff",
            "0",
        ]);
        let config = args.to_config().unwrap();
        assert!(config.filter_enabled);
        assert_eq!(config.constraints.len(), 1);
        assert_eq!(config.constraints["meter_id"], Value::from("MAC000002"));
        assert_eq!(config.group_by, vec!["year", "meter_id"]);
        assert_eq!(config.output_columns(), vec!["year", "meter_id"]);
        assert_eq!(config.alternate.cutoff_hour, 0);
    }

    #[test]
    fn test_where_on_timestamp_column() {
        let args = Args::parse_from([
            "meter_tariff",
            "--timestamp-column",
            "read_at",
            "--where",
            "read_at=2013-12-01T07:30:00",
        ]);
        let config = args.to_config().unwrap();
        assert!(matches!(config.constraints["read_at"], Value::Timestamp(_)));

        let args = Args::parse_from(["meter_tariff", "--where", "DateTime=soon"]);
        assert!(args.to_config().is_err());
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(Args::try_parse_from(["meter_tariff", "--cutoff", "25"]).is_err());
        let args = Args::parse_from(["meter_tariff", "--where", "month"]);
        assert!(args.to_config().is_err());
    }
}
