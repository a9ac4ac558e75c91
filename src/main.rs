use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use meter_tariff::{Args, report, run};
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout carries only the report.
    let default_level = if args.verbose { "info" } else { "warn" };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt().with_env_filter(env).with_writer(io::stderr).init();

    let config = args.to_config()?;
    let result = run(&config)
        .with_context(|| format!("processing {}", config.input.display()))?;

    report::write_report(&result, args.format, args.precision, io::stdout().lock())?;
    Ok(())
}
