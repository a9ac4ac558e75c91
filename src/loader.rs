//! CSV loading and calendar-field derivation.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use csv::{ReaderBuilder, Trim};
use tracing::info;

use crate::error::{Error, Result};
use crate::table::{Table, Value, is_missing_token};

pub const MONTH_COLUMN: &str = "month";
pub const YEAR_COLUMN: &str = "year";
pub const HOUR_COLUMN: &str = "hour";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a timestamp in one of the ISO-like layouts smart-meter exports use.
/// Offsets are dropped and the local wall-clock time kept.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()))
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Month (1-12), four-digit year and hour (0-23) of a timestamp.
pub fn calendar_fields(dt: &NaiveDateTime) -> (i64, i64, i64) {
    (
        i64::from(dt.month()),
        i64::from(dt.year()),
        i64::from(dt.hour()),
    )
}

#[derive(Clone, Copy, PartialEq)]
enum ColumnKind {
    Int,
    Float,
    Str,
}

fn infer_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut kind = ColumnKind::Int;
    for raw in cells {
        if is_missing_token(raw) {
            continue;
        }
        if kind == ColumnKind::Int && raw.parse::<i64>().is_err() {
            kind = ColumnKind::Float;
        }
        if kind == ColumnKind::Float && raw.parse::<f64>().is_err() {
            return ColumnKind::Str;
        }
    }
    kind
}

fn typed_cell(raw: Option<String>, kind: ColumnKind) -> Value {
    match raw {
        None => Value::Null,
        Some(s) if is_missing_token(&s) => Value::Null,
        Some(s) => match kind {
            ColumnKind::Int => s.parse().map(Value::Int).unwrap_or(Value::Str(s)),
            ColumnKind::Float => s.parse().map(Value::Float).unwrap_or(Value::Str(s)),
            ColumnKind::Str => Value::Str(s),
        },
    }
}

/// Read a CSV file and append `month`, `year` and `hour` columns derived from
/// `timestamp_column`, which is replaced by its parsed value.
pub fn load_readings(path: &Path, timestamp_column: &str) -> Result<Table> {
    let file = File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let csv_err = |source: csv::Error| Error::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(BufReader::new(file));

    let columns: Vec<String> = csv_reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(str::to_string)
        .collect();
    let width = columns.len();

    // Cells stay raw until every row is seen, since a column's type depends on all of them.
    let mut raw_rows: Vec<Vec<Option<String>>> = Vec::new();
    for result in csv_reader.records() {
        let record = result.map_err(csv_err)?;
        if record.len() > width {
            return Err(Error::RaggedRow {
                line: record.position().map_or(0, |p| p.line()),
                expected: width,
                found: record.len(),
            });
        }
        let mut cells: Vec<Option<String>> = record.deserialize(None).map_err(csv_err)?;
        cells.resize(width, None);
        raw_rows.push(cells);
    }

    let ts_idx = columns
        .iter()
        .position(|c| c == timestamp_column)
        .ok_or_else(|| Error::missing(timestamp_column, "load"))?;

    let kinds: Vec<ColumnKind> = (0..width)
        .map(|c| infer_kind(raw_rows.iter().filter_map(|r| r[c].as_deref())))
        .collect();

    let mut table = Table::new(columns);
    for raw in raw_rows {
        let mut row = Vec::with_capacity(width + 3);
        for (c, cell) in raw.into_iter().enumerate() {
            if c == ts_idx {
                row.push(timestamp_cell(cell, timestamp_column)?);
            } else {
                row.push(typed_cell(cell, kinds[c]));
            }
        }
        table.push_row(row);
    }

    let (mut months, mut years, mut hours) = (Vec::new(), Vec::new(), Vec::new());
    for ts in table.column_values(ts_idx) {
        match ts {
            Value::Timestamp(dt) => {
                let (m, y, h) = calendar_fields(dt);
                months.push(Value::Int(m));
                years.push(Value::Int(y));
                hours.push(Value::Int(h));
            }
            _ => {
                months.push(Value::Null);
                years.push(Value::Null);
                hours.push(Value::Null);
            }
        }
    }
    table.set_column(MONTH_COLUMN, months);
    table.set_column(YEAR_COLUMN, years);
    table.set_column(HOUR_COLUMN, hours);

    info!("loaded {} readings from {}", table.len(), path.display());
    Ok(table)
}

fn timestamp_cell(raw: Option<String>, column: &str) -> Result<Value> {
    match raw {
        None => Ok(Value::Null),
        Some(s) if is_missing_token(&s) => Ok(Value::Null),
        Some(s) => parse_timestamp(&s)
            .map(Value::Timestamp)
            .ok_or_else(|| Error::Timestamp {
                column: column.to_string(),
                value: s,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2013, 12, 1)
            .unwrap()
            .and_hms_opt(7, 0, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2013-12-01 07:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2013-12-01T07:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2013-12-01 07:00"), Some(expected));
        assert_eq!(parse_timestamp("2013-12-01 07:00:00.000"), Some(expected));
        assert_eq!(parse_timestamp("2013-12-01T07:00:00+01:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2013-12-01"),
            NaiveDate::from_ymd_opt(2013, 12, 1).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_load_derives_calendar_fields() {
        let file = write_csv(&[
            "DateTime,consumption_kwh,meter_id",
            "2013-12-01 07:00:00,-2.0,MAC000069",
            "2014-01-15 23:30:00,1,MAC000070",
        ]);
        let table = load_readings(file.path(), "DateTime").unwrap();

        assert_eq!(
            table.columns(),
            &["DateTime", "consumption_kwh", "meter_id", "month", "year", "hour"]
        );
        assert_eq!(table.value(0, "month"), Some(&Value::Int(12)));
        assert_eq!(table.value(0, "year"), Some(&Value::Int(2013)));
        assert_eq!(table.value(0, "hour"), Some(&Value::Int(7)));
        assert_eq!(table.value(1, "hour"), Some(&Value::Int(23)));
        // Mixed int/float column is promoted to float.
        assert_eq!(table.value(1, "consumption_kwh"), Some(&Value::Float(1.0)));
        assert_eq!(table.value(0, "meter_id"), Some(&Value::from("MAC000069")));
    }

    #[test]
    fn test_load_missing_values() {
        let file = write_csv(&[
            "DateTime,consumption_kwh,meter_id",
            ",0.5,MAC000069",
            "2013-12-01 08:00:00,NaN,MAC000069",
            "2013-12-01 09:00:00,0.7",
        ]);
        let table = load_readings(file.path(), "DateTime").unwrap();

        assert_eq!(table.len(), 3);
        assert!(table.value(0, "DateTime").unwrap().is_null());
        assert!(table.value(0, "hour").unwrap().is_null());
        assert!(table.value(1, "consumption_kwh").unwrap().is_null());
        assert!(table.value(2, "meter_id").unwrap().is_null());
    }

    #[test]
    fn test_load_bad_timestamp() {
        let file = write_csv(&["DateTime,consumption_kwh", "not a date,0.5"]);
        let err = load_readings(file.path(), "DateTime").unwrap_err();
        assert!(matches!(err, Error::Timestamp { ref value, .. } if value == "not a date"));
    }

    #[test]
    fn test_load_missing_timestamp_column() {
        let file = write_csv(&["When,consumption_kwh", "2013-12-01 07:00:00,0.5"]);
        let err = load_readings(file.path(), "DateTime").unwrap_err();
        assert!(matches!(err, Error::MissingColumn { ref column, .. } if column == "DateTime"));
    }

    #[test]
    fn test_load_ragged_row() {
        let file = write_csv(&[
            "DateTime,consumption_kwh",
            "2013-12-01 07:00:00,0.5",
            "2013-12-01 08:00:00,0.5,extra",
        ]);
        let err = load_readings(file.path(), "DateTime").unwrap_err();
        assert!(matches!(err, Error::RaggedRow { line: 3, expected: 2, found: 3 }));
    }

    #[test]
    fn test_ragged_row_line_after_quoted_newline() {
        let file = write_csv(&[
            "DateTime,note",
            "2013-12-01 07:00:00,\"meter swapped",
            "mid-reading\"",
            "2013-12-01 08:00:00,ok,extra",
        ]);
        let err = load_readings(file.path(), "DateTime").unwrap_err();
        assert!(matches!(err, Error::RaggedRow { line: 4, expected: 2, found: 3 }));
    }

    #[test]
    fn test_load_nan_spellings_as_missing() {
        let file = write_csv(&[
            "DateTime,consumption_kwh",
            "2013-12-01 07:00:00,1.0",
            "2013-12-01 08:00:00,NAN",
            "2013-12-01 09:00:00,+nan",
        ]);
        let table = load_readings(file.path(), "DateTime").unwrap();
        assert_eq!(table.value(0, "consumption_kwh"), Some(&Value::Float(1.0)));
        assert!(matches!(table.value(1, "consumption_kwh"), Some(Value::Null)));
        assert!(matches!(table.value(2, "consumption_kwh"), Some(Value::Null)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_readings(Path::new("/nonexistent/readings.csv"), "DateTime").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
