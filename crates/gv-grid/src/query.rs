//! Filter, quick search and sort editing

use std::cmp::Ordering;

use ahash::AHashSet;
use gv_core::record::display_text;
use gv_core::{FilterCondition, FilterSet, Record};
use serde_json::Value;

use crate::grid::{DataGrid, TimerAction, TimerSlot};

impl<R: Record + Send + 'static> DataGrid<R> {
    /// Refilter once edits have been quiet for the filter debounce
    fn schedule_refilter(&mut self) {
        let due = self.clock.now() + self.config.filter_debounce();
        self.timers.debounce(TimerSlot::Filter, due, TimerAction::Refilter);
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Edit a column filter as the user types; blank text removes it
    pub fn set_filter(&mut self, field: &str, text: &str) {
        self.filters.set(field, text);
        self.schedule_refilter();
    }

    pub fn set_filter_condition(&mut self, field: &str, condition: Option<FilterCondition>) {
        self.filters.set_condition(field, condition);
        self.schedule_refilter();
    }

    /// Commit a filter from the column menu, optionally renaming the column
    pub fn apply_filter(&mut self, field: &str, text: &str, header_text: Option<&str>) {
        self.filters.set(field, text);
        if let Some(header_text) = header_text {
            self.rename_column(field, header_text);
        }
        self.sync_filtered_items();
    }

    /// Filter a column by one of its values
    pub fn select_filter(&mut self, field: &str, value: &Value) {
        self.filters.set(field, display_text(Some(value)).unwrap_or_default());
        self.sync_filtered_items();
    }

    pub fn reset_filter(&mut self, field: &str) {
        self.filters.remove(field);
        self.sync_filtered_items();
    }

    pub fn has_filter(&self, field: &str) -> bool {
        self.filters.get(field).is_some_and(|text| !text.is_empty())
    }

    /// Short description of a column filter, e.g. `'Name' * 'bob'`
    pub fn filter_text(&self, field: &str) -> String {
        self.filters.describe(field, self.header(field))
    }

    pub fn quick_search(&self) -> &str {
        &self.quick_search
    }

    pub fn set_quick_search(&mut self, text: &str) {
        if self.quick_search == text {
            return;
        }
        self.quick_search = text.to_string();
        self.schedule_refilter();
    }

    /// Distinct values of `field` among the filtered rows, sorted by their
    /// text. `narrow` keeps only values passing the column's filter with
    /// that text.
    pub fn column_values(&self, field: &str, narrow: Option<&str>) -> Vec<Value> {
        let keys = [field.to_string()];
        let narrow = narrow.filter(|text| !text.is_empty());

        let mut seen = AHashSet::new();
        let mut values: Vec<Value> = self
            .filtered_items()
            .filter(|item| narrow.map_or(true, |text| self.filters.matches(*item, &keys, Some(text))))
            .map(|item| item.field(field).cloned().unwrap_or(Value::Null))
            .filter(|value| seen.insert(value.to_string()))
            .collect();

        values.sort_by(|a, b| match (display_text(Some(a)), display_text(Some(b))) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        values
    }

    pub fn sort_columns(&self) -> &[String] {
        &self.sort_columns
    }

    /// Click on a column header; `additive` extends a multi-column sort
    pub fn toggle_sort(&mut self, field: &str, additive: bool) {
        let additive = additive && !self.config.single_sorting;
        gv_core::sort::toggle_sort(&mut self.sort_columns, field, additive);
        self.sync_filtered_items();
    }

    pub fn set_sort_columns(&mut self, columns: Vec<String>) {
        self.sort_columns = columns;
        self.sync_filtered_items();
    }
}
