//! Multi-column sort keys and the stable record comparator

use std::cmp::Ordering;
use std::fmt;

use crate::record::{compare_values, Record};

/// Suffix marking a descending sort key
pub const DESC_SUFFIX: &str = " desc";

/// One parsed entry of a sort column list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

impl SortKey {
    /// Parse `"name"` or `"name desc"`
    pub fn parse(raw: &str) -> Self {
        match raw.strip_suffix(DESC_SUFFIX) {
            Some(field) => Self { field: field.to_string(), descending: true },
            None => Self { field: raw.to_string(), descending: false },
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "{}{}", self.field, DESC_SUFFIX)
        } else {
            f.write_str(&self.field)
        }
    }
}

/// Parse a stored sort column list
pub fn parse_sort_columns(columns: &[String]) -> Vec<SortKey> {
    columns.iter().map(|c| SortKey::parse(c)).collect()
}

/// Compare two records key by key; the first non-equal key decides
pub fn compare_records<R: Record>(a: &R, b: &R, keys: &[SortKey]) -> Ordering {
    for key in keys {
        let ordering = compare_values(a.field(&key.field), b.field(&key.field));
        let ordering = if key.descending { ordering.reverse() } else { ordering };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Stable sort of row indices into `items`
pub fn sort_indices<R: Record>(indices: &mut [usize], items: &[R], keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }
    indices.sort_by(|&a, &b| compare_records(&items[a], &items[b], keys));
}

/// Update a sort column list after a click on `header`.
///
/// Non-additive clicks cycle the header through ascending, descending and
/// unsorted, replacing every other key. Additive clicks append a new key,
/// flip an ascending key to descending in place, or drop a descending key.
pub fn toggle_sort(columns: &mut Vec<String>, header: &str, additive: bool) {
    let descending = format!("{}{}", header, DESC_SUFFIX);
    let asc_pos = columns.iter().position(|c| c == header);
    let desc_pos = columns.iter().position(|c| *c == descending);

    if !additive {
        *columns = match (asc_pos, desc_pos) {
            (Some(_), _) => vec![descending],
            (None, Some(_)) => Vec::new(),
            (None, None) => vec![header.to_string()],
        };
        return;
    }

    match (asc_pos, desc_pos) {
        (Some(index), _) => columns[index] = descending,
        (None, Some(index)) => {
            columns.remove(index);
        }
        (None, None) => columns.push(header.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Item;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn rows(values: Value) -> Vec<Item> {
        match values {
            Value::Array(rows) => rows
                .into_iter()
                .filter_map(|row| match row {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn sorted_ids(items: &[Item], columns: &[&str]) -> Vec<i64> {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let keys = parse_sort_columns(&columns);
        let mut indices: Vec<usize> = (0..items.len()).collect();
        sort_indices(&mut indices, items, &keys);
        indices
            .into_iter()
            .map(|i| items[i]["id"].as_i64().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_single_key() {
        let items = rows(json!([{"id": 1, "name": "Bob"}, {"id": 2, "name": "Ann"}]));
        assert_eq!(sorted_ids(&items, &["name"]), vec![2, 1]);
        assert_eq!(sorted_ids(&items, &["name desc"]), vec![1, 2]);
    }

    #[test]
    fn test_tie_breakers() {
        let items = rows(json!([
            {"id": 1, "city": "B", "age": 30},
            {"id": 2, "city": "A", "age": 40},
            {"id": 3, "city": "B", "age": 20},
            {"id": 4, "city": "A", "age": 40},
        ]));
        assert_eq!(sorted_ids(&items, &["city", "age desc"]), vec![2, 4, 1, 3]);
        assert_eq!(sorted_ids(&items, &[]), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_missing_fields_do_not_panic() {
        let items = rows(json!([{"id": 1, "v": "x"}, {"id": 2}, {"id": 3, "v": 4}, {"id": 4, "v": null}]));
        assert_eq!(sorted_ids(&items, &["v"]), vec![3, 1, 4, 2]);
    }

    #[test]
    fn test_numeric_strings_sort_by_value() {
        let items = rows(json!([{"id": 1, "v": 9}, {"id": 2, "v": "5"}, {"id": 3, "v": "10"}, {"id": 4, "v": "n/a"}]));
        assert_eq!(sorted_ids(&items, &["v"]), vec![2, 1, 3, 4]);
        assert_eq!(sorted_ids(&items, &["v desc"]), vec![4, 3, 1, 2]);
    }

    #[test]
    fn test_toggle_single() {
        let mut columns = vec!["other".to_string()];
        toggle_sort(&mut columns, "name", false);
        assert_eq!(columns, vec!["name"]);
        toggle_sort(&mut columns, "name", false);
        assert_eq!(columns, vec!["name desc"]);
        toggle_sort(&mut columns, "name", false);
        assert!(columns.is_empty());
    }

    #[test]
    fn test_toggle_additive() {
        let mut columns = vec!["a".to_string()];
        toggle_sort(&mut columns, "b", true);
        assert_eq!(columns, vec!["a", "b"]);
        toggle_sort(&mut columns, "a", true);
        assert_eq!(columns, vec!["a desc", "b"]);
        toggle_sort(&mut columns, "a", true);
        assert_eq!(columns, vec!["b"]);
    }

    proptest! {
        #[test]
        fn sort_is_stable(keys in prop::collection::vec(0u8..4, 0..60)) {
            let items: Vec<Item> = keys
                .iter()
                .enumerate()
                .filter_map(|(id, key)| match json!({"id": id, "k": key}) {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect();
            let sort = parse_sort_columns(&["k".to_string()]);
            let mut indices: Vec<usize> = (0..items.len()).collect();
            sort_indices(&mut indices, &items, &sort);

            for pair in indices.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                prop_assert!(keys[a] <= keys[b]);
                if keys[a] == keys[b] {
                    prop_assert!(a < b);
                }
            }
        }
    }
}
