//! Output formatting for the aggregated result.

use std::io::Write;

use comfy_table::{Attribute, Cell, CellAlignment, Table as TextTable, presets::UTF8_FULL};

use crate::error::Result;
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
}

/// Render as a boxed text table, floats rounded to `precision` decimals.
pub fn format_table(table: &Table, precision: usize) -> String {
    let mut out = TextTable::new();
    out.load_preset(UTF8_FULL);
    out.set_header(
        table
            .columns()
            .iter()
            .map(|c| Cell::new(c).add_attribute(Attribute::Bold)),
    );
    for row in table.rows() {
        out.add_row(row.iter().map(|v| {
            let cell = Cell::new(v.display_with_precision(precision));
            if v.is_numeric() {
                cell.set_alignment(CellAlignment::Right)
            } else {
                cell
            }
        }));
    }
    out.to_string()
}

/// Write header and rows as CSV at full precision.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(table.columns())?;
    for row in table.rows() {
        wtr.serialize(row.as_slice())?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_report<W: Write>(
    table: &Table,
    format: OutputFormat,
    precision: usize,
    mut writer: W,
) -> Result<()> {
    match format {
        OutputFormat::Table => {
            writeln!(writer, "{}", format_table(table, precision))?;
            Ok(())
        }
        OutputFormat::Csv => write_csv(table, writer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::table::Value;
    use std::io;

    /// Writer whose every write fails, like a closed stdout pipe.
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn result() -> Table {
        Table::from_rows(
            vec!["month".to_string(), "meter_id".to_string(), "cost".to_string()],
            vec![
                vec![Value::Int(12), Value::from("MAC000069"), Value::Float(1.23456)],
                vec![Value::Int(11), Value::from("MAC000070"), Value::Float(0.1)],
            ],
        )
    }

    #[test]
    fn test_format_table() {
        let text = format_table(&result(), 2);
        assert!(text.contains("meter_id"));
        assert!(text.contains("MAC000069"));
        assert!(text.contains("1.23"));
        assert!(!text.contains("1.2345"));
        assert!(text.contains("0.10"));
    }

    #[test]
    fn test_write_csv() {
        let mut buf = Vec::new();
        write_csv(&result(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "month,meter_id,cost\n12,MAC000069,1.23456\n11,MAC000070,0.1\n"
        );
    }

    #[test]
    fn test_write_csv_missing_value() {
        let t = Table::from_rows(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![Value::Null, Value::Int(1)]],
        );
        let mut buf = Vec::new();
        write_csv(&t, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "a,b\n,1\n");
    }

    #[test]
    fn test_write_failure_reported_as_io() {
        let err = write_report(&result(), OutputFormat::Table, 2, BrokenPipe).unwrap_err();
        assert!(matches!(err, Error::Write(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    }
}
