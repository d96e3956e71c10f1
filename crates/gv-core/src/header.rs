//! Column definitions

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Narrowest width a column may take, in pixels
pub const MIN_COLUMN_WIDTH: f64 = 5.0;

/// Width used when a stored width cannot be read as a number
pub const FALLBACK_COLUMN_WIDTH: f64 = 80.0;

/// A column definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Field name the column reads from each record
    pub value: String,

    /// Display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Optional display format (a date-time pattern)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,

    /// Width in pixels, coerced on load
    #[serde(default = "fallback_width", deserialize_with = "deserialize_width")]
    pub width: f64,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn fallback_width() -> f64 {
    FALLBACK_COLUMN_WIDTH
}

fn deserialize_width<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(coerce_width(&raw))
}

/// Coerce a stored width into pixels.
///
/// Unreadable values fall back to [`FALLBACK_COLUMN_WIDTH`]; empty, null and
/// too-small values are raised to [`MIN_COLUMN_WIDTH`].
pub fn coerce_width(raw: &Value) -> f64 {
    match raw {
        Value::Number(n) => clamp_width(n.as_f64().unwrap_or(FALLBACK_COLUMN_WIDTH)),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return MIN_COLUMN_WIDTH;
            }
            match trimmed.parse::<f64>() {
                Ok(width) if width.is_finite() => clamp_width(width),
                _ => FALLBACK_COLUMN_WIDTH,
            }
        }
        Value::Null | Value::Bool(_) => MIN_COLUMN_WIDTH,
        Value::Array(_) | Value::Object(_) => FALLBACK_COLUMN_WIDTH,
    }
}

/// Clamp a numeric width into the usable range
pub fn clamp_width(width: f64) -> f64 {
    if !width.is_finite() {
        FALLBACK_COLUMN_WIDTH
    } else if width < MIN_COLUMN_WIDTH {
        MIN_COLUMN_WIDTH
    } else {
        width
    }
}

impl Header {
    /// Create a visible column with the fallback width
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            text: None,
            format: None,
            hidden: false,
            width: FALLBACK_COLUMN_WIDTH,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = clamp_width(width);
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Label shown in the column header
    pub fn display_text(&self) -> &str {
        self.text.as_deref().unwrap_or(&self.value)
    }

    /// Width used for layout computations
    pub fn effective_width(&self) -> f64 {
        clamp_width(self.width)
    }

    /// Apply a resize gesture delta
    pub fn resize_by(&mut self, delta: f64) {
        let width = (self.width + delta).max(0.0);
        self.width = clamp_width(width);
    }
}

/// Turn a camelCase field name into a header label (`userID` → `User ID`)
pub fn key_to_header_text(key: &str) -> String {
    let mut spaced = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            spaced.push(' ');
        }
        spaced.push(ch);
    }

    let mut chars = spaced.chars();
    let label = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    label.replacen("I D", "ID", 1)
}
