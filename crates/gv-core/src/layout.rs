//! Serializable view configuration

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::filter::{FilterCondition, FilterSet};
use crate::header::{key_to_header_text, Header};

/// Snapshot of everything a user can configure about a table view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub filters: IndexMap<String, String>,
    #[serde(default)]
    pub sort_columns: Vec<String>,
    #[serde(default)]
    pub quick_search: String,
    #[serde(default)]
    pub filter_conditions: IndexMap<String, FilterCondition>,
}

/// Stored layout body: the full shape or an older bare header list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LayoutBody {
    Full(Layout),
    Legacy(Vec<Header>),
}

impl Layout {
    /// Layout showing `headers` with no filtering or sorting
    pub fn from_headers(headers: Vec<Header>) -> Self {
        Self {
            headers,
            ..Self::default()
        }
    }

    pub fn filter_set(&self) -> FilterSet {
        FilterSet::from_parts(self.filters.clone(), self.filter_conditions.clone())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a stored body, migrating legacy header lists and dropping
    /// system columns. Blank bodies yield an empty layout.
    pub fn parse(json: &str, system_columns: &[String]) -> serde_json::Result<Self> {
        let json = json.trim();
        if json.is_empty() {
            return Ok(Self::default());
        }

        let mut layout = match serde_json::from_str::<LayoutBody>(json)? {
            LayoutBody::Full(layout) => layout,
            LayoutBody::Legacy(headers) => {
                let headers = headers
                    .into_iter()
                    .map(|mut header| {
                        if header.text.as_deref().map_or(true, str::is_empty) {
                            header.text = Some(key_to_header_text(&header.value));
                        }
                        header
                    })
                    .collect();
                Self::from_headers(headers)
            }
        };
        layout.headers.retain(|h| !system_columns.contains(&h.value));
        Ok(layout)
    }
}
