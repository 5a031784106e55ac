use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use docquery_core::{DocQueryError, Result};

use crate::tabular::{Cell, TabularDataset};

/// Parse the first worksheet of an xlsx workbook; its first row is the header.
pub(crate) fn parse_xlsx(bytes: &[u8]) -> Result<TabularDataset> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes.to_vec())).map_err(DocQueryError::parse)?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DocQueryError::ParseError("workbook has no worksheets".to_string()))?
        .map_err(DocQueryError::parse)?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(header_text).collect(),
        None => Vec::new(),
    };
    let data = rows.map(|row| row.iter().map(cell_from_data).collect()).collect();

    TabularDataset::new(headers, data)
}

fn header_text(data: &Data) -> String {
    match data {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => cell_from_data(other).to_string(),
    }
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Int(*i),
        // Spreadsheets store every number as a float; integral values read back as ints.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Cell::Int(*f as i64),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::DateTime(dt) => Cell::Text(
            dt.as_datetime()
                .map(|d| d.to_string())
                .unwrap_or_else(|| dt.as_f64().to_string()),
        ),
        other => Cell::Text(other.to_string()),
    }
}
