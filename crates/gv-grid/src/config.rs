//! Grid configuration

use std::time::Duration;

use gv_core::{ColorScheme, Margins};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

/// Tunables of a [`DataGrid`](crate::DataGrid)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Height of a collapsed row in pixels
    pub row_height: f64,

    /// Extra height of an expanded row
    pub expanded_extra_height: f64,

    /// Pixels of rows materialized above and below the viewport
    pub items_before: f64,
    pub items_after: f64,

    /// Pixels of columns materialized left and right of the viewport
    pub col_space_before: f64,
    pub col_space_after: f64,

    /// Ignore the additive modifier when toggling sort
    pub single_sorting: bool,

    pub multiple_selection: bool,

    pub highlight_duration_ms: u64,
    pub double_click_ms: u64,
    pub filter_debounce_ms: u64,
    pub scroll_debounce_ms: u64,

    /// Added to the highlight duration before deleted rows are removed
    pub deletion_grace_ms: u64,

    pub color_scheme: ColorScheme,

    /// Fields never shown as columns
    pub system_columns: Vec<String>,

    /// Display text for absent cell values
    pub undefined_text: String,

    /// Format exported cells like the grid displays them
    pub use_default_value_format: bool,

    /// Hand exports to the host instead of rendering them locally
    pub export_use_server: bool,

    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            row_height: 25.0,
            expanded_extra_height: 100.0,
            items_before: 200.0,
            items_after: 300.0,
            col_space_before: 200.0,
            col_space_after: 400.0,
            single_sorting: false,
            multiple_selection: true,
            highlight_duration_ms: 1000,
            double_click_ms: 1000,
            filter_debounce_ms: 2000,
            scroll_debounce_ms: 200,
            deletion_grace_ms: 50,
            color_scheme: ColorScheme::default(),
            system_columns: Vec::new(),
            undefined_text: String::new(),
            use_default_value_format: false,
            export_use_server: true,
            viewport_width: 800.0,
            viewport_height: 600.0,
        }
    }
}

impl GridConfig {
    /// Build from a JSON object; absent keys keep their defaults
    pub fn from_json(config: Value) -> Result<Self> {
        Ok(serde_json::from_value(config)?)
    }

    pub fn row_margins(&self) -> Margins {
        Margins::new(self.items_before, self.items_after)
    }

    pub fn column_margins(&self) -> Margins {
        Margins::new(self.col_space_before, self.col_space_after)
    }

    pub fn filter_debounce(&self) -> Duration {
        Duration::from_millis(self.filter_debounce_ms)
    }

    pub fn scroll_debounce(&self) -> Duration {
        Duration::from_millis(self.scroll_debounce_ms)
    }

    pub fn double_click_window(&self) -> Duration {
        Duration::from_millis(self.double_click_ms)
    }

    /// Delay between marking rows deleted and dropping them
    pub fn deletion_delay(&self) -> Duration {
        Duration::from_millis(self.highlight_duration_ms + self.deletion_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_config() {
        let config = GridConfig::from_json(json!({
            "row_height": 30.0,
            "system_columns": ["_rowVersion"],
            "color_scheme": {"default": "orange"}
        }))
        .unwrap();

        assert_eq!(config.row_height, 30.0);
        assert_eq!(config.items_before, 200.0);
        assert_eq!(config.system_columns, vec!["_rowVersion"]);
        assert_eq!(config.color_scheme.default, "orange");
        assert_eq!(config.color_scheme.delete, "red");
        assert_eq!(config.deletion_delay(), Duration::from_millis(1050));
    }

    #[test]
    fn test_rejects_wrong_types() {
        assert!(matches!(
            GridConfig::from_json(json!({"row_height": "tall"})),
            Err(crate::GridError::Config(_))
        ));
    }
}
