use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::error::Result;
use crate::table::{Table, Value};

#[derive(Debug, Clone, Copy)]
enum Sum {
    Int(i64),
    Float(f64),
}

impl Sum {
    fn accumulate(self, v: &Value) -> Sum {
        match (self, v) {
            (Sum::Int(a), Value::Int(b)) => a
                .checked_add(*b)
                .map_or(Sum::Float(a as f64 + *b as f64), Sum::Int),
            (Sum::Int(a), Value::Float(b)) => Sum::Float(a as f64 + b),
            (Sum::Float(a), other) => Sum::Float(a + other.as_f64().unwrap_or(0.0)),
            (s, _) => s,
        }
    }

    fn into_value(self, float: bool) -> Value {
        match self {
            Sum::Int(i) if float => Value::Float(i as f64),
            Sum::Int(i) => Value::Int(i),
            Sum::Float(f) => Value::Float(f),
        }
    }
}

/// Group rows by `keys` and sum every numeric non-key column.
///
/// Groups come out sorted by key. Rows with a missing key are skipped, missing
/// values count as zero, and non-numeric columns are left out of the result.
pub fn group_sum(table: &Table, keys: &[String]) -> Result<Table> {
    let key_idx = keys
        .iter()
        .map(|k| table.require_column(k, "group"))
        .collect::<Result<Vec<_>>>()?;

    let mut sum_idx = Vec::new();
    let mut excluded = Vec::new();
    for (i, name) in table.columns().iter().enumerate() {
        if key_idx.contains(&i) {
            continue;
        }
        if table.column_values(i).all(|v| v.is_null() || v.is_numeric()) {
            sum_idx.push(i);
        } else {
            excluded.push(name.as_str());
        }
    }
    if !excluded.is_empty() {
        warn!("excluding non-numeric columns from sums: {}", excluded.join(", "));
    }
    let float_cols: Vec<bool> = sum_idx
        .iter()
        .map(|&i| table.column_values(i).any(|v| matches!(v, Value::Float(_))))
        .collect();

    let mut groups: BTreeMap<Vec<Value>, Vec<Sum>> = BTreeMap::new();
    for row in table.rows() {
        let key: Vec<Value> = key_idx.iter().map(|&i| row[i].clone()).collect();
        if key.iter().any(Value::is_null) {
            continue;
        }
        let sums = groups
            .entry(key)
            .or_insert_with(|| vec![Sum::Int(0); sum_idx.len()]);
        for (sum, &i) in sums.iter_mut().zip(&sum_idx) {
            *sum = sum.accumulate(&row[i]);
        }
    }

    let columns = keys
        .iter()
        .cloned()
        .chain(sum_idx.iter().map(|&i| table.columns()[i].clone()))
        .collect();
    let rows = groups
        .into_iter()
        .map(|(mut key, sums)| {
            key.extend(
                sums.into_iter()
                    .zip(&float_cols)
                    .map(|(s, &float)| s.into_value(float)),
            );
            key
        })
        .collect();
    let out = Table::from_rows(columns, rows);

    info!("grouped {} rows into {} groups", table.len(), out.len());
    Ok(out)
}
