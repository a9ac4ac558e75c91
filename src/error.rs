use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Input file missing or unreadable.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("line {line}: expected at most {expected} fields, found {found}")]
    RaggedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("cannot parse {value:?} in column {column:?} as a timestamp")]
    Timestamp { column: String, value: String },

    /// Required column absent at some stage of the pipeline.
    #[error("column {column:?} not found ({stage})")]
    MissingColumn { column: String, stage: &'static str },

    #[error("column {column:?} holds {value}, expected {expected}")]
    NotNumeric {
        column: String,
        value: String,
        expected: &'static str,
    },

    #[error("invalid constraint {0:?}, expected COLUMN=VALUE")]
    Constraint(String),

    #[error("failed to encode CSV output: {0}")]
    CsvOutput(#[from] csv::Error),

    #[error("failed to write output: {0}")]
    Write(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn missing(column: &str, stage: &'static str) -> Self {
        Error::MissingColumn {
            column: column.to_string(),
            stage,
        }
    }
}
