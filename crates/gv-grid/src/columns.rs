//! Column operations

use gv_core::{Header, Record};

use crate::events::GridEvent;
use crate::grid::DataGrid;

impl<R: Record + Send + 'static> DataGrid<R> {
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    pub fn header(&self, field: &str) -> Option<&Header> {
        self.headers.iter().find(|h| h.value == field)
    }

    fn header_position(&self, field: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.value == field)
    }

    fn headers_changed(&mut self) {
        self.update_visible_headers();
        self.events.push(GridEvent::HeadersChanged(self.headers.clone()));
    }

    /// Replace the column definitions
    pub fn set_headers(&mut self, headers: Vec<Header>) {
        self.headers = headers;
        self.headers_changed();
    }

    /// Move a column by `delta` places, clamped to the ends of the list
    pub fn reorder(&mut self, field: &str, delta: isize) -> bool {
        let Some(index) = self.header_position(field) else {
            return false;
        };
        let header = self.headers.remove(index);
        let target = (index as isize)
            .saturating_add(delta)
            .clamp(0, self.headers.len() as isize) as usize;
        self.headers.insert(target, header);
        self.headers_changed();
        true
    }

    pub fn toggle_column_visible(&mut self, field: &str) -> bool {
        let Some(index) = self.header_position(field) else {
            return false;
        };
        self.headers[index].hidden = !self.headers[index].hidden;
        self.headers_changed();
        true
    }

    pub fn hide_all_columns(&mut self) {
        self.headers.iter_mut().for_each(|h| h.hidden = true);
        self.headers_changed();
    }

    pub fn show_all_columns(&mut self) {
        self.headers.iter_mut().for_each(|h| h.hidden = false);
        self.headers_changed();
    }

    /// Widen or narrow a column by a drag delta in pixels
    pub fn resize_column(&mut self, field: &str, delta: f64) -> bool {
        let Some(index) = self.header_position(field) else {
            return false;
        };
        self.headers[index].resize_by(delta);
        self.headers_changed();
        true
    }

    /// Change a column's caption
    pub fn rename_column(&mut self, field: &str, text: &str) -> bool {
        let Some(index) = self.header_position(field) else {
            return false;
        };
        self.headers[index].text = Some(text.to_string());
        self.headers_changed();
        true
    }
}
