use docquery_core::{DocQueryError, Result};

use crate::tabular::{Cell, TabularDataset};

/// Parse csv bytes: first record is the header, blank lines are skipped.
pub(crate) fn parse_csv(bytes: &[u8]) -> Result<TabularDataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(DocQueryError::parse)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(DocQueryError::parse)?;
        rows.push(record.iter().map(Cell::parse).collect());
    }

    TabularDataset::new(headers, rows)
}
