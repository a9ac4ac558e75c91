//! Smart-meter tariff comparison.
//!
//! Loads half-hourly consumption readings from CSV, cleans them, prices each
//! reading on a flat tariff and on a two-band time-of-use tariff, and sums the
//! result per month and meter.

pub mod aggregate;
pub mod cleaner;
pub mod cli;
pub mod error;
pub mod filter;
pub mod loader;
pub mod pipeline;
pub mod report;
pub mod table;
pub mod tariff;

pub use cli::Args;
pub use error::{Error, Result};
pub use pipeline::{PipelineConfig, run};
pub use table::{Table, Value};
