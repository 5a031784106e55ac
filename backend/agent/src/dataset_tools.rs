//! Tools the table agent uses to inspect a loaded dataset.
//!
//! Each tool takes a JSON object and answers with plain text the model reads
//! as its observation.

use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use docquery_core::{Tool, ToolRegistry};
use docquery_loader::{FilterOp, TabularDataset};
use serde_json::{json, Value};

const HEAD_DEFAULT: usize = 5;
const HEAD_MAX: usize = 50;
const FILTER_DEFAULT: usize = 20;
const FILTER_MAX: usize = 100;
const VALUE_COUNTS_DEFAULT: usize = 10;

/// Registry holding every dataset tool bound to `data`.
pub fn dataset_tools(data: Arc<TabularDataset>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(TableSchemaTool { data: data.clone() }));
    registry.register(Arc::new(HeadTool { data: data.clone() }));
    registry.register(Arc::new(CountRowsTool { data: data.clone() }));
    registry.register(Arc::new(FilterRowsTool { data: data.clone() }));
    registry.register(Arc::new(ColumnSummaryTool { data: data.clone() }));
    registry.register(Arc::new(ValueCountsTool { data }));
    registry
}

fn column_arg(data: &TabularDataset, args: &Value) -> Result<usize> {
    let name = args
        .get("column")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("missing required string field 'column'"))?;
    data.column_index(name).ok_or_else(|| {
        let names: Vec<&str> = data.columns().iter().map(|c| c.name.as_str()).collect();
        anyhow!("unknown column '{name}'; available columns: {}", names.join(", "))
    })
}

fn limit_arg(args: &Value, key: &str, default: usize, max: usize) -> usize {
    args.get(key)
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .unwrap_or(default)
        .min(max)
}

/// Filter value as text; numbers and booleans are accepted unquoted.
fn value_arg(args: &Value) -> Result<String> {
    match args.get("value") {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(Value::Null) | None => bail!("missing required field 'value'"),
        Some(other) => bail!("'value' must be a string, number or boolean, got {other}"),
    }
}

/// Row indices matching the optional `column`/`op`/`value` filter in `args`.
fn matching_rows(data: &TabularDataset, args: &Value) -> Result<Vec<usize>> {
    if args.get("column").is_none() {
        return Ok((0..data.row_count()).collect());
    }
    let column = column_arg(data, args)?;
    let op: FilterOp = args
        .get("op")
        .and_then(Value::as_str)
        .unwrap_or("eq")
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let value = value_arg(args)?;
    Ok(data.filter(column, op, &value))
}

fn filter_schema(extra: Value) -> Value {
    let mut properties = json!({
        "column": {"type": "string", "description": "Column name"},
        "op": {"type": "string", "enum": ["eq", "ne", "gt", "ge", "lt", "le", "contains"]},
        "value": {"description": "Value to compare against"}
    });
    if let (Some(props), Value::Object(extra)) = (properties.as_object_mut(), extra) {
        props.extend(extra);
    }
    json!({"type": "object", "properties": properties})
}

pub struct TableSchemaTool {
    data: Arc<TabularDataset>,
}

#[async_trait]
impl Tool for TableSchemaTool {
    fn name(&self) -> &str {
        "table_schema"
    }

    fn description(&self) -> &str {
        "Row count, column names and inferred column types. Input: {}"
    }

    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: Value) -> Result<String> {
        let mut out = format!(
            "rows: {}\ncolumns: {}",
            self.data.row_count(),
            self.data.column_count()
        );
        for col in self.data.columns() {
            out.push_str(&format!("\n- {} ({})", col.name, col.dtype));
        }
        Ok(out)
    }
}

pub struct HeadTool {
    data: Arc<TabularDataset>,
}

#[async_trait]
impl Tool for HeadTool {
    fn name(&self) -> &str {
        "head"
    }

    fn description(&self) -> &str {
        "First rows of the table. Input: {\"n\": 5}"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"n": {"type": "integer", "minimum": 1, "maximum": HEAD_MAX}}
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let n = limit_arg(&args, "n", HEAD_DEFAULT, HEAD_MAX).min(self.data.row_count());
        let rows: Vec<usize> = (0..n).collect();
        Ok(self.data.to_pipe_table(&rows))
    }
}

pub struct CountRowsTool {
    data: Arc<TabularDataset>,
}

#[async_trait]
impl Tool for CountRowsTool {
    fn name(&self) -> &str {
        "count_rows"
    }

    fn description(&self) -> &str {
        "Number of rows, optionally only those matching a filter. \
         Input: {} or {\"column\": \"age\", \"op\": \"gt\", \"value\": 30}"
    }

    fn parameters(&self) -> Value {
        filter_schema(json!({}))
    }

    async fn execute(&self, args: Value) -> Result<String> {
        Ok(matching_rows(&self.data, &args)?.len().to_string())
    }
}

pub struct FilterRowsTool {
    data: Arc<TabularDataset>,
}

#[async_trait]
impl Tool for FilterRowsTool {
    fn name(&self) -> &str {
        "filter_rows"
    }

    fn description(&self) -> &str {
        "Rows matching a filter. \
         Input: {\"column\": \"name\", \"op\": \"contains\", \"value\": \"an\", \"limit\": 20}"
    }

    fn parameters(&self) -> Value {
        filter_schema(json!({
            "limit": {"type": "integer", "minimum": 1, "maximum": FILTER_MAX}
        }))
    }

    async fn execute(&self, args: Value) -> Result<String> {
        if args.get("column").is_none() {
            bail!("missing required string field 'column'");
        }
        let matched = matching_rows(&self.data, &args)?;
        let limit = limit_arg(&args, "limit", FILTER_DEFAULT, FILTER_MAX);
        if matched.is_empty() {
            return Ok("no matching rows".to_string());
        }
        let shown = &matched[..matched.len().min(limit)];
        let mut out = format!("{} matching rows", matched.len());
        if shown.len() < matched.len() {
            out.push_str(&format!(" (showing first {})", shown.len()));
        }
        out.push('\n');
        out.push_str(&self.data.to_pipe_table(shown));
        Ok(out)
    }
}

pub struct ColumnSummaryTool {
    data: Arc<TabularDataset>,
}

#[async_trait]
impl Tool for ColumnSummaryTool {
    fn name(&self) -> &str {
        "column_summary"
    }

    fn description(&self) -> &str {
        "Count, empty and unique values of a column; min, max, mean and sum \
         for numeric columns. Input: {\"column\": \"age\"}"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"column": {"type": "string"}},
            "required": ["column"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let column = column_arg(&self.data, &args)?;
        Ok(self.data.summarize(column).to_string())
    }
}

pub struct ValueCountsTool {
    data: Arc<TabularDataset>,
}

#[async_trait]
impl Tool for ValueCountsTool {
    fn name(&self) -> &str {
        "value_counts"
    }

    fn description(&self) -> &str {
        "Most frequent values of a column. Input: {\"column\": \"city\", \"limit\": 10}"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "column": {"type": "string"},
                "limit": {"type": "integer", "minimum": 1}
            },
            "required": ["column"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let column = column_arg(&self.data, &args)?;
        let limit = limit_arg(&args, "limit", VALUE_COUNTS_DEFAULT, usize::MAX);
        let counts = self.data.value_counts(column, limit);
        Ok(counts
            .iter()
            .map(|(value, n)| format!("{value}: {n}"))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
