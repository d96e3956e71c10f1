//! Load CSV files into grid records

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use gv_core::Item;
use serde_json::{Number, Value};

/// Read every row of a CSV file with a header line
pub fn load_items(path: &Path) -> Result<Vec<Item>> {
    let file = std::fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let items = read_items(file).with_context(|| format!("Failed to parse {}", path.display()))?;
    tracing::info!("Loaded {} rows from {}", items.len(), path.display());
    Ok(items)
}

pub fn read_items<R: Read>(reader: R) -> Result<Vec<Item>> {
    let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut items = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let item: Item = headers
            .iter()
            .zip(record.iter())
            .map(|(name, cell)| (name.to_string(), cell_to_value(cell)))
            .collect();
        items.push(item);
    }
    Ok(items)
}

/// Integers and floats become numbers, `true`/`false` booleans, empty
/// cells null and everything else stays text
fn cell_to_value(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Some(n) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }
    match trimmed {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(cell.to_string()),
    }
}
