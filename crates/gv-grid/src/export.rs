//! Export of selected or all rows

use gv_core::export::render_html_table;
use gv_core::format::cell_value;
use gv_core::{ExportHeader, ExportRequest, Header, Record};
use serde_json::{Map, Value};

use crate::events::GridEvent;
use crate::grid::DataGrid;

impl<R: Record + Send + 'static> DataGrid<R> {
    fn export_headers(&self) -> Vec<Header> {
        self.headers.iter().filter(|h| !h.hidden).cloned().collect()
    }

    fn export_row(&self, item: &R, headers: &[Header]) -> Map<String, Value> {
        let mut row = item.to_fields();
        if self.config.use_default_value_format {
            for header in headers {
                let value = cell_value(item.field(&header.value), header, &self.config.undefined_text);
                row.insert(header.value.clone(), value);
            }
        }
        row
    }

    /// Export payload for `items` with the shown columns
    pub fn export_request(&self, items: &[R]) -> ExportRequest {
        let headers = self.export_headers();
        ExportRequest {
            name: self.table_id.clone(),
            rows: items.iter().map(|item| self.export_row(item, &headers)).collect(),
            headers: headers.iter().map(ExportHeader::from).collect(),
        }
    }

    fn export(&mut self, items: Vec<R>) {
        if self.config.export_use_server {
            let request = self.export_request(&items);
            tracing::info!("Table '{}': exporting {} rows", self.table_id, request.rows.len());
            self.events.push(GridEvent::Export(request));
        } else {
            let headers = self.export_headers();
            let rows: Vec<Map<String, Value>> = items.iter().map(|item| self.export_row(item, &headers)).collect();
            self.events.push(GridEvent::ExportDocument(render_html_table(&headers, &rows)));
        }
    }

    pub fn export_selected(&mut self) {
        let items = self.selected_items();
        self.export(items);
    }

    pub fn export_all(&mut self) {
        let items = self.items.clone();
        self.export(items);
    }
}
