use std::fmt;

use serde::{Deserialize, Serialize};

/// Explicit comparison applied by a column filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterCondition {
    Contains,
    Equals,
    #[serde(rename = "Starts With")]
    StartsWith,
    #[serde(rename = "Ends With")]
    EndsWith,
    #[serde(rename = "Not Equal")]
    NotEqual,
    #[serde(rename = "Greater Than")]
    GreaterThan,
    #[serde(rename = "Less Than")]
    LessThan,
    In,
}

impl FilterCondition {
    /// Every condition, in menu order
    pub const ALL: [FilterCondition; 8] = [
        FilterCondition::Contains,
        FilterCondition::Equals,
        FilterCondition::StartsWith,
        FilterCondition::EndsWith,
        FilterCondition::NotEqual,
        FilterCondition::GreaterThan,
        FilterCondition::LessThan,
        FilterCondition::In,
    ];

    /// Label as stored in layouts
    pub fn label(&self) -> &'static str {
        match self {
            FilterCondition::Contains => "Contains",
            FilterCondition::Equals => "Equals",
            FilterCondition::StartsWith => "Starts With",
            FilterCondition::EndsWith => "Ends With",
            FilterCondition::NotEqual => "Not Equal",
            FilterCondition::GreaterThan => "Greater Than",
            FilterCondition::LessThan => "Less Than",
            FilterCondition::In => "In",
        }
    }

    /// Compact symbol used in filter descriptions
    pub fn symbol(&self) -> &'static str {
        match self {
            FilterCondition::Contains => "*",
            FilterCondition::Equals => "=",
            FilterCondition::StartsWith => "[...",
            FilterCondition::EndsWith => "...]",
            FilterCondition::NotEqual => "<>",
            FilterCondition::GreaterThan => ">=",
            FilterCondition::LessThan => "=<",
            FilterCondition::In => "IN",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl fmt::Display for FilterCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
