//! Keyed access to caller-owned records
//!
//! The engine never inspects a record beyond named field lookups, so any
//! type that can answer `field(name)` can be viewed by the grid.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default record type: an insertion-ordered JSON object
pub type Item = Map<String, Value>;

/// A record whose fields can be looked up by name
pub trait Record: Clone + PartialEq {
    /// Look up a field value; `None` when the field is absent
    fn field(&self, name: &str) -> Option<&Value>;

    /// Field names in their natural order
    fn field_names(&self) -> Vec<String>;

    /// Copy the record into a plain JSON object (used by exports)
    fn to_fields(&self) -> Map<String, Value>;
}

impl Record for Map<String, Value> {
    fn field(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }

    fn field_names(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }

    fn to_fields(&self) -> Map<String, Value> {
        self.clone()
    }
}

/// Stable identity of a row, derived from the value of its track field
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackKey(String);

impl TrackKey {
    /// Build a key from a raw track value. `1` and `"1"` are distinct keys.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(value) => TrackKey(value.to_string()),
            None => TrackKey("undefined".to_string()),
        }
    }

    /// Key of a record for the given track field
    pub fn of<R: Record>(record: &R, track_field: &str) -> Self {
        Self::from_value(record.field(track_field))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render a number the way a browser would print it (`5`, not `5.0`)
pub fn number_text(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e21 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

/// Stringify a field value for text comparisons.
///
/// Absent and `null` values have no text.
pub fn display_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(u)) => u.to_string(),
            _ => number_text(n.as_f64().unwrap_or_default()),
        }),
        Value::Array(values) => Some(
            values
                .iter()
                .map(|v| display_text(Some(v)).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Some("[object Object]".to_string()),
    }
}

/// Parse the leading numeric part of `text` (`"12px"` → 12).
///
/// Leading whitespace is ignored. Returns `None` when no digits start the text.
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;
    let mut digits = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
            digits += 1;
        }
        end = frac_end;
    }
    if digits == 0 {
        return None;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    text[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Convert a whole string to a number the way loose comparisons do:
/// surrounding whitespace is ignored and an empty string is zero.
pub fn coerce_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        Some(Value::Number(_)) => 0,
        Some(Value::String(text)) if numeric_text(text).is_some() => 0,
        Some(Value::String(_)) => 1,
        Some(Value::Bool(_)) => 2,
        Some(Value::Array(_)) | Some(Value::Object(_)) => 3,
        Some(Value::Null) => 4,
        None => 5,
    }
}

/// Number spelled by a whole non-blank string
fn numeric_text(text: &str) -> Option<f64> {
    if text.trim().is_empty() {
        return None;
    }
    coerce_number(text)
}

/// Order two raw field values.
///
/// Numbers and numeric strings (`"5"`, `" 2.5 "`) compare by value, the
/// way loose filter comparisons coerce them. On equal values a number sorts
/// before a string, and two strings fall back to their text. Other strings
/// compare lexicographically, booleans `false < true`. Values of different
/// kinds are grouped (numbers, strings, booleans, composites, null, absent)
/// so the order stays total.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.total_cmp(&y)
        }
        (Some(Value::Number(x)), Some(Value::String(y))) => {
            let x = x.as_f64().unwrap_or_default();
            x.total_cmp(&numeric_text(y).unwrap_or_default()).then(Ordering::Less)
        }
        (Some(Value::String(x)), Some(Value::Number(y))) => {
            let y = y.as_f64().unwrap_or_default();
            numeric_text(x).unwrap_or_default().total_cmp(&y).then(Ordering::Greater)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => match (numeric_text(x), numeric_text(y)) {
            (Some(nx), Some(ny)) => nx.total_cmp(&ny).then_with(|| x.cmp(y)),
            _ => x.cmp(y),
        },
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_text() {
        assert_eq!(display_text(Some(&json!(5))), Some("5".to_string()));
        assert_eq!(display_text(Some(&json!(5.0))), Some("5".to_string()));
        assert_eq!(display_text(Some(&json!(2.5))), Some("2.5".to_string()));
        assert_eq!(display_text(Some(&json!("abc"))), Some("abc".to_string()));
        assert_eq!(display_text(Some(&json!([1, "a"]))), Some("1,a".to_string()));
        assert_eq!(display_text(Some(&Value::Null)), None);
        assert_eq!(display_text(None), None);
    }

    #[test]
    fn test_parse_number_prefix() {
        assert_eq!(parse_number("12px"), Some(12.0));
        assert_eq!(parse_number("  -3.5e2x"), Some(-350.0));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("1e"), Some(1.0));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_track_key_distinguishes_types() {
        let a = TrackKey::from_value(Some(&json!(1)));
        let b = TrackKey::from_value(Some(&json!("1")));
        assert_ne!(a, b);
        assert_eq!(a, TrackKey::from_value(Some(&json!(1))));
    }

    #[test]
    fn test_compare_values_same_kind() {
        assert_eq!(compare_values(Some(&json!(2)), Some(&json!(10))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!("b")), Some(&json!("a10"))), Ordering::Greater);
        assert_eq!(compare_values(Some(&json!(false)), Some(&json!(true))), Ordering::Less);
        assert_eq!(compare_values(None, None), Ordering::Equal);
    }

    #[test]
    fn test_compare_values_mixed_kinds_are_grouped() {
        assert_eq!(compare_values(Some(&json!(100)), Some(&json!("a"))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!("a")), None), Ordering::Less);
    }

    #[test]
    fn test_compare_values_numeric_strings() {
        assert_eq!(compare_values(Some(&json!(9)), Some(&json!("5"))), Ordering::Greater);
        assert_eq!(compare_values(Some(&json!(" 12 ")), Some(&json!(9))), Ordering::Greater);
        assert_eq!(compare_values(Some(&json!("2")), Some(&json!("10"))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!(5)), Some(&json!("5"))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!("5.0")), Some(&json!("5"))), Ordering::Greater);
        assert_eq!(compare_values(Some(&json!("100")), Some(&json!("a"))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!("")), Some(&json!("a"))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!("")), Some(&json!(0))), Ordering::Greater);
    }

    #[test]
    fn test_compare_values_is_transitive_across_kinds() {
        let mut values = vec![
            json!("9"),
            json!(10),
            json!("10"),
            json!("x"),
            json!(9),
            json!(""),
            json!(true),
            json!(2.5),
            json!("2.5"),
            Value::Null,
        ];
        values.sort_by(|a, b| compare_values(Some(a), Some(b)));
        assert_eq!(
            values,
            vec![
                json!(2.5),
                json!("2.5"),
                json!(9),
                json!("9"),
                json!(10),
                json!("10"),
                json!(""),
                json!("x"),
                json!(true),
                Value::Null,
            ]
        );
        for a in &values {
            for b in &values {
                assert_eq!(compare_values(Some(a), Some(b)), compare_values(Some(b), Some(a)).reverse());
            }
        }
    }
}
