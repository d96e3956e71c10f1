//! Display formatting of cell values

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde_json::Value;

use crate::header::Header;

const CHECKED: &str = "✅";
const UNCHECKED: &str = "❌";
const MIDNIGHT_SUFFIX: &str = "T00:00:00";

fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Default formatting applied to every cell.
///
/// ISO date-times at midnight collapse to the date, other ISO date-times are
/// shown as `YYYY-MM-DD HH:MM:SS`. Anything else passes through.
pub fn default_global_format(value: &Value) -> Value {
    let Value::String(text) = value else {
        return value.clone();
    };
    if let Some(date) = text.strip_suffix(MIDNIGHT_SUFFIX) {
        return Value::String(date.to_string());
    }
    if !text.contains('T') {
        return value.clone();
    }
    match parse_date_time(text) {
        Some(dt) if dt.num_seconds_from_midnight() == 0 && dt.nanosecond() == 0 => {
            Value::String(dt.format("%Y-%m-%d").to_string())
        }
        Some(dt) => Value::String(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        None => value.clone(),
    }
}

/// Apply a header's date-time pattern to a value when it is a date string
pub fn format_with_pattern(value: &Value, pattern: &str) -> Value {
    match value {
        Value::String(text) => match parse_date_time(text) {
            Some(dt) => Value::String(dt.format(pattern).to_string()),
            None => value.clone(),
        },
        _ => value.clone(),
    }
}

fn is_flag_column(field: &str) -> bool {
    field.starts_with("is") || field.ends_with("Flag") || field.ends_with("Status")
}

/// Display value of a cell: formatted through the header pattern and the
/// global formatter, booleans and `Y`/`N` flags as check marks, absent
/// values as `undefined_text`.
pub fn cell_value(raw: Option<&Value>, header: &Header, undefined_text: &str) -> Value {
    let Some(raw) = raw else {
        return Value::String(undefined_text.to_string());
    };
    let value = match header.format.as_deref() {
        Some(pattern) => format_with_pattern(raw, pattern),
        None => raw.clone(),
    };

    match default_global_format(&value) {
        Value::Bool(b) => Value::String(if b { CHECKED } else { UNCHECKED }.to_string()),
        Value::String(s) if (s == "Y" || s == "N") && is_flag_column(&header.value) => {
            Value::String(if s == "Y" { CHECKED } else { UNCHECKED }.to_string())
        }
        other => other,
    }
}
