use std::collections::BTreeMap;

use tracing::info;

use crate::error::{Error, Result};
use crate::loader::parse_timestamp;
use crate::table::{Table, Value};

/// Column name mapped to the value every retained row must hold.
pub type Constraints = BTreeMap<String, Value>;

/// Parse `COLUMN=VALUE`, typing the value the way the loader types that
/// column's cells: timestamps for `timestamp_column`, inferred otherwise.
pub fn parse_constraint(s: &str, timestamp_column: &str) -> Result<(String, Value)> {
    let (column, value) = match s.split_once('=') {
        Some((column, value)) if !column.trim().is_empty() => (column.trim(), value.trim()),
        _ => return Err(Error::Constraint(s.to_string())),
    };
    let value = if column == timestamp_column {
        parse_timestamp(value)
            .map(Value::Timestamp)
            .ok_or_else(|| Error::Timestamp {
                column: column.to_string(),
                value: value.to_string(),
            })?
    } else {
        Value::parse_cell(value)
    };
    Ok((column.to_string(), value))
}

/// Keep only rows equal to every constraint. A disabled filter or an empty
/// constraint set passes the table through untouched.
pub fn filter_rows(mut table: Table, enabled: bool, constraints: &Constraints) -> Result<Table> {
    if !enabled || constraints.is_empty() {
        return Ok(table);
    }

    let checks = constraints
        .iter()
        .map(|(column, value)| table.require_column(column, "filter").map(|idx| (idx, value)))
        .collect::<Result<Vec<_>>>()?;

    let before = table.len();
    table.retain(|row| checks.iter().all(|(idx, value)| &row[*idx] == *value));
    info!("filter kept {} of {} rows", table.len(), before);
    Ok(table)
}
