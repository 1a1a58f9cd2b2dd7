use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};
use serde_json::Value;
use std::io::Cursor;
use std::path::Path;

use super::normalizer::RawRow;
use crate::errors::{ImportError, ImportResult};

/// Upload formats accepted by the importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Xlsx,
    Xls,
}

impl SourceFormat {
    /// Pick the format from the file extension (case-insensitive).
    pub fn from_file_name(file_name: &str) -> ImportResult<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "xlsx" => Ok(SourceFormat::Xlsx),
            "xls" => Ok(SourceFormat::Xls),
            _ => Err(ImportError::UnsupportedFormat(file_name.to_string())),
        }
    }
}

/// Parse the first sheet of an uploaded file into header-keyed rows.
///
/// Empty cells are left out of each row and rows without any value are
/// skipped entirely.
pub fn read_rows(file_name: &str, bytes: &[u8]) -> ImportResult<Vec<RawRow>> {
    match SourceFormat::from_file_name(file_name)? {
        SourceFormat::Csv => read_csv_rows(bytes),
        SourceFormat::Xlsx | SourceFormat::Xls => read_workbook_rows(bytes),
    }
}

fn read_csv_rows(bytes: &[u8]) -> ImportResult<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|header| header.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cells = record
            .iter()
            .map(|field| (!field.is_empty()).then(|| Value::String(field.to_string())));
        if let Some(row) = build_row(&headers, cells) {
            rows.push(row);
        }
    }

    tracing::debug!("Read {} rows from CSV upload", rows.len());
    Ok(rows)
}

fn read_workbook_rows(bytes: &[u8]) -> ImportResult<Vec<RawRow>> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor).map_err(|e| {
        tracing::error!("Failed to open workbook: {:?}", e);
        ImportError::InvalidSpreadsheet(e.to_string())
    })?;

    let sheet_name = match workbook.sheet_names().first() {
        Some(name) => name.clone(),
        None => return Ok(Vec::new()),
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ImportError::InvalidSpreadsheet(e.to_string()))?;

    tracing::debug!(
        "Sheet '{}' dimensions: {}x{}",
        sheet_name,
        range.height(),
        range.width()
    );

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = match sheet_rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect(),
        None => return Ok(Vec::new()),
    };

    let rows: Vec<RawRow> = sheet_rows
        .filter_map(|cells| build_row(&headers, cells.iter().map(cell_value)))
        .collect();

    tracing::debug!("Read {} rows from sheet '{}'", rows.len(), sheet_name);
    Ok(rows)
}

/// Zip header names with cell values; `None` when the row holds nothing.
fn build_row<I>(headers: &[String], cells: I) -> Option<RawRow>
where
    I: Iterator<Item = Option<Value>>,
{
    let mut row = RawRow::new();
    for (header, cell) in headers.iter().zip(cells) {
        if header.is_empty() || row.contains_key(header) {
            continue;
        }
        if let Some(value) = cell {
            row.insert(header.clone(), value);
        }
    }
    (!row.is_empty()).then_some(row)
}

fn cell_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| Value::String(trimmed.to_string()))
        }
        Data::Int(i) => Some(Value::from(*i)),
        Data::Float(f) => serde_json::Number::from_f64(*f).map(Value::Number),
        Data::Bool(b) => Some(Value::Bool(*b)),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_date()
            .map(|date| Value::String(date.format("%Y-%m-%d").to_string())),
        Data::DurationIso(s) => Some(Value::String(s.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_detection() {
        assert_eq!(SourceFormat::from_file_name("sales.csv").unwrap(), SourceFormat::Csv);
        assert_eq!(SourceFormat::from_file_name("Sales.XLSX").unwrap(), SourceFormat::Xlsx);
        assert_eq!(SourceFormat::from_file_name("legacy.xls").unwrap(), SourceFormat::Xls);
        assert!(matches!(
            SourceFormat::from_file_name("notes.txt"),
            Err(ImportError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            SourceFormat::from_file_name("csv"),
            Err(ImportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_csv_rows_are_keyed_by_header() {
        let csv = "product_id,product_name,discounted_price,rating\n\
                   B01,USB Cable,\"₹1,099\",4.2\n\
                   B02,Charger,,3.9\n";
        let rows = read_rows("upload.csv", csv.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["product_id"], json!("B01"));
        assert_eq!(rows[0]["discounted_price"], json!("₹1,099"));
        assert_eq!(rows[1]["product_name"], json!("Charger"));
        assert!(!rows[1].contains_key("discounted_price"));
    }

    #[test]
    fn test_csv_blank_rows_are_skipped() {
        let csv = "product_id,rating\nA,1\n,\nB,2\n";
        let rows = read_rows("upload.csv", csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["product_id"], json!("B"));
    }

    #[test]
    fn test_csv_header_only_has_no_rows() {
        let rows = read_rows("upload.csv", b"product_id,rating\n").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_csv_byte_order_mark_is_ignored() {
        let csv = "\u{feff}product_id,rating\nA,1\n";
        let rows = read_rows("upload.csv", csv.as_bytes()).unwrap();
        assert_eq!(rows[0]["product_id"], json!("A"));
    }

    #[test]
    fn test_short_rows_are_accepted() {
        let csv = "product_id,product_name,rating\nA,Cable\n";
        let rows = read_rows("upload.csv", csv.as_bytes()).unwrap();
        assert_eq!(rows[0].len(), 2);
    }

    #[test]
    fn test_garbage_workbook_is_rejected() {
        let err = read_rows("upload.xlsx", b"definitely not a zip archive").unwrap_err();
        assert!(matches!(err, ImportError::InvalidSpreadsheet(_)));
    }

    #[test]
    fn test_cell_values() {
        assert_eq!(cell_value(&Data::Empty), None);
        assert_eq!(cell_value(&Data::String("  ".into())), None);
        assert_eq!(cell_value(&Data::String(" Cable ".into())), Some(json!("Cable")));
        assert_eq!(cell_value(&Data::Int(7)), Some(json!(7)));
        assert_eq!(cell_value(&Data::Float(4.5)), Some(json!(4.5)));
        assert_eq!(cell_value(&Data::Bool(true)), Some(json!(true)));
        assert_eq!(
            cell_value(&Data::DateTimeIso("2024-02-29T00:00:00".into())),
            Some(json!("2024-02-29"))
        );
    }
}
