//! Row selection and double click detection

use ahash::AHashMap;
use gv_core::{Record, TrackKey};

use crate::events::{GridEvent, Modifiers};
use crate::grid::DataGrid;

impl<R: Record + Send + 'static> DataGrid<R> {
    /// Selected records in selection order
    pub fn selected_items(&self) -> Vec<R> {
        let mut by_key: AHashMap<TrackKey, &R> = AHashMap::with_capacity(self.items.len());
        for item in &self.items {
            by_key.entry(self.track_key(item)).or_insert(item);
        }
        self.selection
            .iter()
            .filter_map(|key| by_key.get(key).map(|item| (*item).clone()))
            .collect()
    }

    pub fn selection_len(&self) -> usize {
        self.selection.len()
    }

    pub fn is_selected(&self, item: &R) -> bool {
        self.selection.contains(&self.track_key(item))
    }

    /// Row clicked last
    pub fn current_item(&self) -> Option<&R> {
        let current = self.current.as_ref()?;
        self.items.iter().find(|item| self.track_key(item) == *current)
    }

    pub(crate) fn emit_selection(&mut self) {
        let selected = self.selected_items();
        let current = self.current_item().cloned();
        self.events.push(GridEvent::SelectionChanged { selected, current });
    }

    /// Handle a click on a filtered row.
    ///
    /// A plain click selects only that row, ctrl toggles it, shift selects
    /// the range from the previous click (ctrl+shift deselects it). A second
    /// click on the same row within the double click window raises
    /// [`GridEvent::DoubleClick`] instead.
    pub fn toggle_selection(&mut self, row: usize, modifiers: Modifiers) -> bool {
        let Some(item) = self.filtered_item(row).cloned() else {
            return false;
        };
        let key = self.track_key(&item);
        let now = self.clock.now();

        if self.current.as_ref() == Some(&key) {
            if let Some(clicked_at) = self.last_click {
                if now.saturating_sub(clicked_at) <= self.config.double_click_window() {
                    self.last_click = None;
                    self.events.push(GridEvent::DoubleClick(item));
                    return true;
                }
            }
        }

        if modifiers.shift && self.config.multiple_selection {
            let anchor = self
                .current
                .as_ref()
                .and_then(|current| self.row_of_key(current))
                .unwrap_or(row);
            let (from, to) = if anchor <= row { (anchor, row) } else { (row, anchor) };
            let keys: Vec<TrackKey> = (from..=to)
                .filter_map(|r| self.filtered_item(r))
                .map(|item| self.track_key(item))
                .collect();
            for range_key in keys {
                if modifiers.ctrl {
                    self.selection.shift_remove(&range_key);
                } else {
                    self.selection.insert(range_key);
                }
            }
            self.current = Some(key);
            self.last_click = None;
            self.emit_selection();
            return true;
        }

        if modifiers.ctrl && self.config.multiple_selection {
            if !self.selection.shift_remove(&key) {
                self.selection.insert(key.clone());
            }
        } else {
            self.selection.clear();
            self.selection.insert(key.clone());
        }
        self.current = Some(key);
        self.last_click = Some(now);
        self.emit_selection();
        true
    }

    /// Select every row, or clear the selection when all rows already are
    pub fn select_all(&mut self) {
        let keys: Vec<TrackKey> = self.items.iter().map(|item| self.track_key(item)).collect();
        let all_selected = keys.iter().all(|key| self.selection.contains(key));
        self.selection.clear();
        if !all_selected {
            self.selection.extend(keys);
        }
        self.emit_selection();
    }

    /// Select exactly the rows passing the filters
    pub fn select_filtered(&mut self) {
        let keys: Vec<TrackKey> = self.filtered_items().map(|item| self.track_key(item)).collect();
        self.selection.clear();
        self.selection.extend(keys);
        self.emit_selection();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.emit_selection();
    }
}
