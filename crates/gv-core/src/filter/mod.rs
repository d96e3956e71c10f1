//! Filter predicate evaluation
//!
//! A [`FilterSet`] holds the raw filter text and optional condition for each
//! column. An item passes when every active key accepts it. Keys without an
//! explicit condition use a small prefix language: `>10`, `<b`, `=5`, or a
//! plain case-insensitive substring.

mod condition;

pub use condition::FilterCondition;

use std::cmp::Ordering;

use indexmap::IndexMap;
use serde_json::Value;

use crate::header::Header;
use crate::record::{coerce_number, display_text, number_text, parse_number, Record};

/// Comparison value for one filter key
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f64),
    Text(String),
}

impl Operand {
    /// Read popup text, preferring a number when the text starts with one
    pub fn parse(text: &str) -> Self {
        match parse_number(text) {
            Some(n) => Operand::Number(n),
            None => Operand::Text(text.to_string()),
        }
    }

    pub fn text(&self) -> String {
        match self {
            Operand::Number(n) => number_text(*n),
            Operand::Text(t) => t.clone(),
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self, Operand::Text(t) if t.is_empty())
    }
}

/// Filter texts and conditions keyed by column field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    values: IndexMap<String, String>,
    conditions: IndexMap<String, FilterCondition>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        values: IndexMap<String, String>,
        conditions: IndexMap<String, FilterCondition>,
    ) -> Self {
        let mut set = Self { values, conditions };
        set.prune_empty();
        set
    }

    pub fn values(&self) -> &IndexMap<String, String> {
        &self.values
    }

    pub fn conditions(&self) -> &IndexMap<String, FilterCondition> {
        &self.conditions
    }

    /// Set the filter text for a field. Blank text removes the filter.
    pub fn set(&mut self, field: impl Into<String>, text: impl Into<String>) {
        let field = field.into();
        let text = text.into();
        if text.is_empty() {
            self.values.shift_remove(&field);
        } else {
            self.values.insert(field, text);
        }
    }

    pub fn remove(&mut self, field: &str) -> Option<String> {
        self.values.shift_remove(field)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn set_condition(&mut self, field: impl Into<String>, condition: Option<FilterCondition>) {
        let field = field.into();
        match condition {
            Some(condition) => {
                self.conditions.insert(field, condition);
            }
            None => {
                self.conditions.shift_remove(&field);
            }
        }
    }

    pub fn condition(&self, field: &str) -> Option<FilterCondition> {
        self.conditions.get(field).copied()
    }

    /// Fields carrying non-empty filter text
    pub fn active_keys(&self) -> Vec<String> {
        self.values
            .iter()
            .filter(|(_, text)| !text.is_empty())
            .map(|(field, _)| field.clone())
            .collect()
    }

    pub fn is_active(&self) -> bool {
        self.values.values().any(|text| !text.is_empty())
    }

    /// Drop filters whose text is blank
    pub fn prune_empty(&mut self) {
        self.values.retain(|_, text| !text.is_empty());
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.conditions.clear();
    }

    /// Evaluate `item` against the given keys.
    ///
    /// `override_text` replaces the stored text of every key (the column
    /// values popup narrows one column this way).
    pub fn matches<R: Record>(&self, item: &R, keys: &[String], override_text: Option<&str>) -> bool {
        let override_operand = override_text.map(Operand::parse);
        for key in keys {
            let operand = match (&override_operand, self.values.get(key)) {
                (Some(operand), _) => operand.clone(),
                (None, Some(text)) => Operand::Text(text.clone()),
                (None, None) => continue,
            };
            if operand.is_empty() {
                continue;
            }
            if !evaluate(item.field(key), self.condition(key), &operand) {
                return false;
            }
        }
        true
    }

    /// Human readable description, e.g. `'Name' * 'bob'`
    pub fn describe(&self, field: &str, header: Option<&Header>) -> String {
        let label = header.map(Header::display_text).unwrap_or(field);
        let symbol = self.condition(field).unwrap_or(FilterCondition::Contains).symbol();
        let text = self.get(field).unwrap_or_default();
        format!("'{}' {} '{}'", label, symbol, text)
    }
}

/// Case-insensitive search of `needle` across the given fields of `item`
pub fn matches_quick_search<R: Record>(item: &R, fields: &[String], needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let needle = needle.to_lowercase();
    fields.iter().any(|field| {
        display_text(item.field(field))
            .map(|text| text.to_lowercase().contains(&needle))
            .unwrap_or(false)
    })
}

/// Loose ordering between an item value and a filter operand.
///
/// Numeric text is read as a number when the other side is numeric; `None`
/// means the two cannot be ordered and the comparison never rejects.
fn loose_cmp(item: Option<&Value>, operand: &Operand) -> Option<Ordering> {
    match (item?, operand) {
        (Value::Number(n), Operand::Number(x)) => n.as_f64()?.partial_cmp(x),
        (Value::Number(n), Operand::Text(t)) => n.as_f64()?.partial_cmp(&coerce_number(t)?),
        (Value::String(s), Operand::Number(x)) => coerce_number(s)?.partial_cmp(x),
        (Value::String(s), Operand::Text(t)) => Some(s.as_str().cmp(t.as_str())),
        (Value::Bool(b), operand) => {
            let b = if *b { 1.0 } else { 0.0 };
            let x = match operand {
                Operand::Number(x) => *x,
                Operand::Text(t) => coerce_number(t)?,
            };
            b.partial_cmp(&x)
        }
        _ => None,
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Evaluate one key's condition against one item value
pub fn evaluate(item: Option<&Value>, condition: Option<FilterCondition>, operand: &Operand) -> bool {
    let text = operand.text();
    let item_text = display_text(item);

    match condition {
        Some(FilterCondition::LessThan) => loose_cmp(item, operand) != Some(Ordering::Greater),
        Some(FilterCondition::GreaterThan) => loose_cmp(item, operand) != Some(Ordering::Less),
        Some(FilterCondition::NotEqual) => item_text.as_deref() != Some(text.as_str()),
        Some(FilterCondition::Equals) => item_text.as_deref() == Some(text.as_str()),
        Some(FilterCondition::StartsWith) => item_text
            .map(|s| s.to_lowercase().starts_with(&text.to_lowercase()))
            .unwrap_or(false),
        Some(FilterCondition::EndsWith) => item_text
            .map(|s| s.to_lowercase().ends_with(&text.to_lowercase()))
            .unwrap_or(false),
        Some(FilterCondition::Contains) => {
            item_text.map(|s| contains_ci(&s, &text)).unwrap_or(false)
        }
        Some(FilterCondition::In) => {
            let item_text = item_text.unwrap_or_default();
            text.split(',').map(str::trim).any(|token| token == item_text)
        }
        None => evaluate_prefix(item, item_text, operand),
    }
}

fn evaluate_prefix(item: Option<&Value>, item_text: Option<String>, operand: &Operand) -> bool {
    let text = match operand {
        Operand::Text(text) => text.as_str(),
        Operand::Number(_) => {
            return item_text.map(|s| contains_ci(&s, &operand.text())).unwrap_or(false);
        }
    };

    let mut chars = text.chars();
    let op = chars.next();
    let rest = chars.as_str();
    let rest_operand = || match parse_number(rest) {
        Some(n) => Operand::Number(n),
        None => Operand::Text(rest.to_string()),
    };

    match op {
        Some('>') => loose_cmp(item, &rest_operand()) != Some(Ordering::Less),
        Some('<') => loose_cmp(item, &rest_operand()) != Some(Ordering::Greater),
        Some('=') => match parse_number(rest) {
            Some(n) => matches!(item, Some(Value::Number(v)) if v.as_f64() == Some(n)),
            None => item_text.as_deref() == Some(rest),
        },
        _ => item_text.map(|s| contains_ci(&s, text)).unwrap_or(false),
    }
}
