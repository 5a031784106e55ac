//! Typed in-memory tables built from csv/xlsx uploads.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use docquery_core::{DocQueryError, Result};
use serde::Serialize;

/// Raw strings read as missing values.
const NA_VALUES: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

/// One typed table cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Cell {
    /// Infer a typed cell from raw text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if NA_VALUES.contains(&trimmed) {
            return Cell::Empty;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Cell::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return Cell::Float(f);
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return Cell::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Cell::Bool(false);
        }
        Cell::Text(raw.to_string())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Ordering used by filters: numeric when both sides are numeric,
    /// case-insensitive text otherwise. Empty only equals empty.
    fn loose_cmp(&self, other: &Cell) -> Option<Ordering> {
        match (self, other) {
            (Cell::Empty, Cell::Empty) => Some(Ordering::Equal),
            (Cell::Empty, _) | (_, Cell::Empty) => None,
            (Cell::Bool(a), Cell::Bool(b)) => Some(a.cmp(b)),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => Some(
                    self.to_string()
                        .to_lowercase()
                        .cmp(&other.to_string().to_lowercase()),
                ),
            },
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Int(i) => write!(f, "{i}"),
            Cell::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// Inferred type of a column, from its non-empty cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Empty,
    Int,
    Float,
    Bool,
    Text,
}

impl ColumnType {
    fn infer<'a>(cells: impl Iterator<Item = &'a Cell>) -> Self {
        let mut ty = ColumnType::Empty;
        for cell in cells {
            let cell_ty = match cell {
                Cell::Empty => continue,
                Cell::Int(_) => ColumnType::Int,
                Cell::Float(_) => ColumnType::Float,
                Cell::Bool(_) => ColumnType::Bool,
                Cell::Text(_) => return ColumnType::Text,
            };
            ty = match (ty, cell_ty) {
                (ColumnType::Empty, t) => t,
                (a, b) if a == b => a,
                (ColumnType::Int, ColumnType::Float) | (ColumnType::Float, ColumnType::Int) => {
                    ColumnType::Float
                }
                _ => return ColumnType::Text,
            };
        }
        ty
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Int | ColumnType::Float)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Empty => "empty",
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Bool => "bool",
            ColumnType::Text => "text",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub dtype: ColumnType,
}

/// Comparison operators accepted by row filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Contains,
}

impl FilterOp {
    fn matches(&self, cell: &Cell, target: &Cell) -> bool {
        if let FilterOp::Contains = self {
            return cell
                .to_string()
                .to_lowercase()
                .contains(&target.to_string().to_lowercase());
        }
        match cell.loose_cmp(target) {
            Some(ord) => match self {
                FilterOp::Eq => ord == Ordering::Equal,
                FilterOp::Ne => ord != Ordering::Equal,
                FilterOp::Gt => ord == Ordering::Greater,
                FilterOp::Ge => ord != Ordering::Less,
                FilterOp::Lt => ord == Ordering::Less,
                FilterOp::Le => ord != Ordering::Greater,
                FilterOp::Contains => unreachable!(),
            },
            None => *self == FilterOp::Ne,
        }
    }
}

impl FromStr for FilterOp {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eq" | "=" | "==" => Ok(FilterOp::Eq),
            "ne" | "!=" | "<>" => Ok(FilterOp::Ne),
            "gt" | ">" => Ok(FilterOp::Gt),
            "ge" | "gte" | ">=" => Ok(FilterOp::Ge),
            "lt" | "<" => Ok(FilterOp::Lt),
            "le" | "lte" | "<=" => Ok(FilterOp::Le),
            "contains" => Ok(FilterOp::Contains),
            other => Err(format!(
                "unknown operator '{other}' (use eq, ne, gt, ge, lt, le or contains)"
            )),
        }
    }
}

/// First rows of a table rendered as strings, for display.
#[derive(Debug, Clone, Serialize)]
pub struct DataPreview {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
}

/// Descriptive statistics for one column.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: ColumnType,
    pub count: usize,
    pub empty: usize,
    pub unique: usize,
    pub min: Option<String>,
    pub max: Option<String>,
    pub mean: Option<f64>,
    pub sum: Option<f64>,
}

impl fmt::Display for ColumnSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "column: {} ({})", self.name, self.dtype)?;
        writeln!(f, "count: {}", self.count)?;
        writeln!(f, "empty: {}", self.empty)?;
        write!(f, "unique: {}", self.unique)?;
        if let Some(min) = &self.min {
            write!(f, "\nmin: {min}")?;
        }
        if let Some(max) = &self.max {
            write!(f, "\nmax: {max}")?;
        }
        if let Some(mean) = self.mean {
            write!(f, "\nmean: {mean}")?;
        }
        if let Some(sum) = self.sum {
            write!(f, "\nsum: {sum}")?;
        }
        Ok(())
    }
}

/// A loaded table. Immutable after construction.
#[derive(Debug, Clone)]
pub struct TabularDataset {
    columns: Vec<Column>,
    rows: Vec<Vec<Cell>>,
}

impl TabularDataset {
    /// Build a table from a header row and data rows.
    ///
    /// Blank or missing header names become `Unnamed: {index}`, repeated names
    /// get `.1`, `.2`, … suffixes. Short rows are padded with empty cells; a
    /// row wider than the header is an error.
    pub fn new(headers: Vec<String>, mut rows: Vec<Vec<Cell>>) -> Result<Self> {
        if headers.is_empty() {
            return Err(DocQueryError::ParseError(
                "no columns to parse from file".to_string(),
            ));
        }
        let width = headers.len();
        for (index, row) in rows.iter_mut().enumerate() {
            if row.len() > width {
                return Err(DocQueryError::ParseError(format!(
                    "expected {width} fields in data row {}, saw {}",
                    index + 1,
                    row.len()
                )));
            }
            row.resize(width, Cell::Empty);
        }

        let columns = normalize_headers(headers)
            .into_iter()
            .enumerate()
            .map(|(i, name)| Column {
                name,
                dtype: ColumnType::infer(rows.iter().map(|r| &r[i])),
            })
            .collect();

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Index of a column by exact name, falling back to a case-insensitive match.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .or_else(|| {
                self.columns
                    .iter()
                    .position(|c| c.name.eq_ignore_ascii_case(name.trim()))
            })
    }

    pub fn preview(&self, limit: usize) -> DataPreview {
        DataPreview {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .take(limit)
                .map(|row| row.iter().map(Cell::to_string).collect())
                .collect(),
            total_rows: self.rows.len(),
        }
    }

    /// Indices of rows whose `column` cell satisfies `op value`.
    pub fn filter(&self, column: usize, op: FilterOp, value: &str) -> Vec<usize> {
        let target = Cell::parse(value);
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| op.matches(&row[column], &target))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn summarize(&self, column: usize) -> ColumnSummary {
        let col = &self.columns[column];
        let cells: Vec<&Cell> = self.rows.iter().map(|r| &r[column]).collect();
        let present: Vec<&Cell> = cells.iter().copied().filter(|c| !c.is_empty()).collect();
        let unique: HashSet<String> = present.iter().map(|c| c.to_string()).collect();

        let (min, max, mean, sum) = if col.dtype.is_numeric() {
            let values: Vec<f64> = present.iter().filter_map(|c| c.as_f64()).collect();
            let sum: f64 = values.iter().sum();
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let render = |v: f64| match col.dtype {
                ColumnType::Int => Cell::Int(v as i64).to_string(),
                _ => Cell::Float(v).to_string(),
            };
            if values.is_empty() {
                (None, None, None, None)
            } else {
                (
                    Some(render(min)),
                    Some(render(max)),
                    Some(sum / values.len() as f64),
                    Some(sum),
                )
            }
        } else {
            let mut texts: Vec<String> = present.iter().map(|c| c.to_string()).collect();
            texts.sort();
            (texts.first().cloned(), texts.last().cloned(), None, None)
        };

        ColumnSummary {
            name: col.name.clone(),
            dtype: col.dtype,
            count: present.len(),
            empty: cells.len() - present.len(),
            unique: unique.len(),
            min,
            max,
            mean,
            sum,
        }
    }

    /// Most frequent non-empty values of a column, ties broken by value.
    pub fn value_counts(&self, column: usize, limit: usize) -> Vec<(String, usize)> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for row in &self.rows {
            if !row[column].is_empty() {
                *counts.entry(row[column].to_string()).or_default() += 1;
            }
        }
        let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts.truncate(limit);
        counts
    }

    /// Render the given rows as a pipe table with a leading row-index column.
    pub fn to_pipe_table(&self, row_indices: &[usize]) -> String {
        let mut out = String::from("| index |");
        for col in &self.columns {
            out.push(' ');
            out.push_str(&col.name);
            out.push_str(" |");
        }
        out.push_str("\n|---|");
        for _ in &self.columns {
            out.push_str("---|");
        }
        for &i in row_indices {
            out.push_str(&format!("\n| {i} |"));
            for cell in &self.rows[i] {
                out.push(' ');
                out.push_str(&cell.to_string());
                out.push_str(" |");
            }
        }
        out
    }
}

fn normalize_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    headers
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            let base = if raw.trim().is_empty() {
                format!("Unnamed: {i}")
            } else {
                raw.trim().to_string()
            };
            let n = seen.entry(base.clone()).or_insert(0);
            let name = if *n == 0 {
                base.clone()
            } else {
                format!("{base}.{n}")
            };
            *n += 1;
            name
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> TabularDataset {
        TabularDataset::new(
            vec!["name".into(), "age".into(), "member".into()],
            vec![
                vec![Cell::parse("Ana"), Cell::parse("31"), Cell::parse("true")],
                vec![Cell::parse("Bo"), Cell::parse("27"), Cell::parse("False")],
                vec![Cell::parse("Cy"), Cell::parse("NA")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn parses_typed_cells() {
        assert_eq!(Cell::parse("42"), Cell::Int(42));
        assert_eq!(Cell::parse("4.5"), Cell::Float(4.5));
        assert_eq!(Cell::parse("TRUE"), Cell::Bool(true));
        assert_eq!(Cell::parse("N/A"), Cell::Empty);
        assert_eq!(Cell::parse(" x "), Cell::Text(" x ".into()));
    }

    #[test]
    fn pads_short_rows_and_infers_types() {
        let data = people();
        assert_eq!(data.row_count(), 3);
        assert_eq!(data.rows()[2][2], Cell::Empty);
        let dtypes: Vec<ColumnType> = data.columns().iter().map(|c| c.dtype).collect();
        assert_eq!(dtypes, vec![ColumnType::Text, ColumnType::Int, ColumnType::Bool]);
    }

    #[test]
    fn rejects_rows_wider_than_header() {
        let err = TabularDataset::new(
            vec!["a".into()],
            vec![vec![Cell::Int(1), Cell::Int(2)]],
        )
        .unwrap_err();
        assert!(matches!(err, DocQueryError::ParseError(_)));
    }

    #[test]
    fn normalizes_blank_and_duplicate_headers() {
        let data = TabularDataset::new(
            vec!["x".into(), "".into(), "x".into(), "x".into()],
            vec![],
        )
        .unwrap();
        let names: Vec<&str> = data.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["x", "Unnamed: 1", "x.1", "x.2"]);
    }

    #[test]
    fn mixed_int_and_float_is_float() {
        let data = TabularDataset::new(
            vec!["v".into()],
            vec![vec![Cell::Int(1)], vec![Cell::Float(2.5)]],
        )
        .unwrap();
        assert_eq!(data.columns()[0].dtype, ColumnType::Float);
    }

    #[test]
    fn preview_is_capped() {
        let rows = (0..150).map(|i| vec![Cell::Int(i)]).collect();
        let data = TabularDataset::new(vec!["n".into()], rows).unwrap();
        let preview = data.preview(100);
        assert_eq!(preview.rows.len(), 100);
        assert_eq!(preview.total_rows, 150);
        assert_eq!(preview.rows[99], vec!["99".to_string()]);
    }

    #[test]
    fn filters_numeric_and_text() {
        let data = people();
        let age = data.column_index("age").unwrap();
        assert_eq!(data.filter(age, FilterOp::Gt, "28"), vec![0]);
        assert_eq!(data.filter(age, FilterOp::Ne, "31"), vec![1, 2]);

        let name = data.column_index("NAME").unwrap();
        assert_eq!(data.filter(name, FilterOp::Eq, "bo"), vec![1]);
        assert_eq!(data.filter(name, FilterOp::Contains, "y"), vec![2]);
    }

    #[test]
    fn parses_filter_ops() {
        assert_eq!(">=".parse::<FilterOp>().unwrap(), FilterOp::Ge);
        assert_eq!("contains".parse::<FilterOp>().unwrap(), FilterOp::Contains);
        assert!("between".parse::<FilterOp>().is_err());
    }

    #[test]
    fn summarizes_numeric_column() {
        let data = people();
        let summary = data.summarize(data.column_index("age").unwrap());
        assert_eq!(summary.count, 2);
        assert_eq!(summary.empty, 1);
        assert_eq!(summary.unique, 2);
        assert_eq!(summary.sum, Some(58.0));
        assert_eq!(summary.mean, Some(29.0));
        assert_eq!(summary.min.as_deref(), Some("27"));
        assert!(summary.to_string().contains("mean: 29"));
    }

    #[test]
    fn counts_values_by_frequency() {
        let data = TabularDataset::new(
            vec!["city".into()],
            ["Oslo", "Rome", "Oslo", "", "Lima", "Rome", "Oslo"]
                .iter()
                .map(|s| vec![Cell::parse(s)])
                .collect(),
        )
        .unwrap();
        let counts = data.value_counts(0, 2);
        assert_eq!(counts, vec![("Oslo".to_string(), 3), ("Rome".to_string(), 2)]);
    }

    #[test]
    fn renders_pipe_table() {
        let data = people();
        let table = data.to_pipe_table(&[1]);
        assert_eq!(
            table,
            "| index | name | age | member |\n|---|---|---|---|\n| 1 | Bo | 27 | false |"
        );
    }
}
