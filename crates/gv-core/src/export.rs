//! Export payloads and the local HTML table rendering

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::header::Header;
use crate::record::display_text;

/// MIME type of the locally rendered document
pub const EXCEL_HTML_MIME: &str = "application/vnd.ms-excel";

/// Column metadata sent with an export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportHeader {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub value: String,
    pub width: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl From<&Header> for ExportHeader {
    fn from(header: &Header) -> Self {
        Self {
            text: header.text.clone(),
            value: header.value.clone(),
            width: header.effective_width().round() as i64,
            format: header.format.clone(),
        }
    }
}

/// Rows and columns handed to an exporter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub headers: Vec<ExportHeader>,
    #[serde(default)]
    pub rows: Vec<Map<String, Value>>,
}

/// A rendered export ready to be saved by the host
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDocument {
    pub mime: &'static str,
    pub body: String,
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Render rows as an HTML table that spreadsheet applications open directly
pub fn render_html_table(headers: &[Header], rows: &[Map<String, Value>]) -> ExportDocument {
    let mut html = String::from("<table><thead bgcolor=\"#87AFC6\">");
    for header in headers {
        html.push_str(&format!(
            "<th style=\"width: {}px\">{}</th>",
            header.effective_width(),
            escape_html(header.display_text())
        ));
    }
    html.push_str("</thead><tbody>");
    for row in rows {
        html.push_str("<tr>");
        for header in headers {
            let cell = display_text(row.get(&header.value)).unwrap_or_default();
            html.push_str(&format!("<td>{}</td>", escape_html(&cell)));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");

    ExportDocument {
        mime: EXCEL_HTML_MIME,
        body: html,
    }
}
