//! Active layout state machine
//!
//! On load the grid fetches every layout of its table. A table without
//! layouts gets a `Default` one built from the current (or synthesized)
//! headers. The layout shown last is remembered per table through the
//! [`ActiveLayoutPointer`] and re-selected, falling back to the first one.

use std::sync::Arc;

use gv_core::{Layout, Record};
use gv_layout::{ActiveLayoutPointer, LayoutStore, NewLayout, StoredLayout};

use crate::events::GridEvent;
use crate::grid::DataGrid;
use crate::{GridError, Result};

pub const DEFAULT_LAYOUT_NAME: &str = "Default";

/// Id of a fallback layout the store refused to keep
const UNSAVED_LAYOUT_ID: i64 = 0;

#[derive(Default)]
pub(crate) struct LayoutState {
    store: Option<Arc<dyn LayoutStore>>,
    pointer: Option<ActiveLayoutPointer>,
    layouts: Vec<StoredLayout>,
    current_name: String,
}

impl LayoutState {
    fn current(&self) -> Option<&StoredLayout> {
        self.layouts.iter().find(|l| l.layout_name == self.current_name)
    }
}

impl<R: Record + Send + 'static> DataGrid<R> {
    /// Persist layouts in `store` and remember the active one with `pointer`
    pub fn with_layout_store(mut self, store: Arc<dyn LayoutStore>, pointer: ActiveLayoutPointer) -> Self {
        self.layout_state.store = Some(store);
        self.layout_state.pointer = Some(pointer);
        self
    }

    fn layout_store(&self) -> Result<Arc<dyn LayoutStore>> {
        self.layout_state
            .store
            .clone()
            .ok_or_else(|| GridError::NoLayoutStore(self.table_id.clone()))
    }

    pub fn layouts(&self) -> &[StoredLayout] {
        &self.layout_state.layouts
    }

    pub fn current_layout_name(&self) -> &str {
        &self.layout_state.current_name
    }

    pub fn current_layout(&self) -> Option<&StoredLayout> {
        self.layout_state.current()
    }

    /// Everything a layout captures about the current view
    pub fn layout_snapshot(&self) -> Layout {
        Layout {
            headers: self.headers.clone(),
            filters: self.filters.values().clone(),
            sort_columns: self.sort_columns.clone(),
            quick_search: self.quick_search.clone(),
            filter_conditions: self.filters.conditions().clone(),
        }
    }

    /// Replace headers, filters, sort and quick search in one step
    pub fn apply_layout(&mut self, layout: Layout) {
        let filters = layout.filter_set();
        let system_columns = &self.config.system_columns;
        self.headers = layout
            .headers
            .into_iter()
            .filter(|h| !system_columns.contains(&h.value))
            .collect();
        self.filters = filters;
        self.sort_columns = layout.sort_columns;
        self.quick_search = layout.quick_search;

        self.events.push(GridEvent::HeadersChanged(self.headers.clone()));
        self.sync_filtered_items();
        self.update_visible_headers();
    }

    fn remember_layout(&mut self, name: &str) -> Result<()> {
        self.layout_state.current_name = name.to_string();
        if let Some(pointer) = &self.layout_state.pointer {
            pointer.set(&self.table_id, name)?;
        }
        Ok(())
    }

    /// Load the table's layouts and show the remembered one
    pub async fn load_layouts(&mut self) -> Result<()> {
        let store = self.layout_store()?;
        self.layout_state.layouts = match store.get_layouts(&self.table_id).await {
            Ok(layouts) => layouts,
            Err(e) => {
                tracing::warn!(
                    "Failed to load layouts of table '{}' from {} store: {}",
                    self.table_id,
                    store.store_name(),
                    e
                );
                Vec::new()
            }
        };

        if self.layout_state.layouts.is_empty() {
            self.ensure_headers();
            if let Err(e) = self.create_layout(DEFAULT_LAYOUT_NAME).await {
                tracing::warn!(
                    "Failed to store default layout of table '{}' in {} store, keeping it in memory: {}",
                    self.table_id,
                    store.store_name(),
                    e
                );
                let draft = NewLayout::new(self.table_id.clone(), DEFAULT_LAYOUT_NAME, &self.layout_snapshot())?;
                self.layout_state.layouts.push(draft.into_stored(UNSAVED_LAYOUT_ID));
            }
        }

        let remembered = match &self.layout_state.pointer {
            Some(pointer) => pointer.get(&self.table_id).unwrap_or_else(|e| {
                tracing::warn!("Failed to read active layout of table '{}': {}", self.table_id, e);
                None
            }),
            None => None,
        };
        let layouts = &self.layout_state.layouts;
        let name = remembered
            .filter(|name| layouts.iter().any(|l| &l.layout_name == name))
            .or_else(|| layouts.first().map(|l| l.layout_name.clone()))
            .unwrap_or_else(|| DEFAULT_LAYOUT_NAME.to_string());

        tracing::info!(
            "Table '{}': {} layouts, showing '{}'",
            self.table_id,
            self.layout_state.layouts.len(),
            name
        );
        self.select_layout(&name)?;
        Ok(())
    }

    /// Switch to another table and load its layouts
    pub async fn set_table(&mut self, table_id: impl Into<String>) -> Result<()> {
        let table_id = table_id.into();
        if table_id.is_empty() || table_id == self.table_id {
            return Ok(());
        }
        self.table_id = table_id;
        self.resubscribe();
        self.clear_selection();
        self.headers.clear();
        self.filters.clear();
        self.sort_columns.clear();
        self.quick_search.clear();
        self.layout_state.layouts.clear();
        self.layout_state.current_name.clear();

        if self.layout_state.store.is_some() {
            self.load_layouts().await
        } else {
            self.sync_filtered_items();
            self.update_visible_headers();
            Ok(())
        }
    }

    /// Make `name` the active layout. Returns whether a layout with that
    /// name exists and was applied.
    pub fn select_layout(&mut self, name: &str) -> Result<bool> {
        self.remember_layout(name)?;
        let Some(stored) = self.layout_state.current() else {
            return Ok(false);
        };
        match stored.layout(&self.config.system_columns) {
            Ok(layout) => {
                self.apply_layout(layout);
                Ok(true)
            }
            Err(e) => {
                tracing::warn!("Layout '{}' of table '{}' is unreadable: {}", name, self.table_id, e);
                Ok(false)
            }
        }
    }

    /// Write the current view into the active layout
    pub async fn save_layout(&mut self) -> Result<bool> {
        let store = self.layout_store()?;
        let Some(current) = self.layout_state.current().cloned() else {
            return Ok(false);
        };
        let updated = store.update_layout(&current, &self.layout_snapshot()).await?;
        if let Some(slot) = self.layout_state.layouts.iter_mut().find(|l| l.layout_id == updated.layout_id) {
            *slot = updated;
        }
        Ok(true)
    }

    /// Save the current view as a new layout and make it active
    pub async fn create_layout(&mut self, name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(false);
        }
        let store = self.layout_store()?;
        let draft = NewLayout::new(self.table_id.clone(), name, &self.layout_snapshot())?;
        let stored = store.add_layout(draft).await?;
        tracing::info!("Table '{}': created layout '{}'", self.table_id, name);
        self.layout_state.layouts.push(stored);
        self.remember_layout(name)?;
        Ok(true)
    }

    /// Rename the active layout. No-op when there is no active layout or
    /// the name is blank or already used by another layout of the table.
    pub async fn rename_layout(&mut self, new_name: &str) -> Result<bool> {
        let new_name = new_name.trim();
        let Some(current) = self.layout_state.current().cloned() else {
            return Ok(false);
        };
        if new_name.is_empty() || self.layout_state.layouts.iter().any(|l| l.layout_name == new_name) {
            return Ok(false);
        }
        let store = self.layout_store()?;
        let renamed = store.rename_layout(&current, new_name).await?;
        tracing::info!(
            "Table '{}': renamed layout '{}' to '{}'",
            self.table_id,
            current.layout_name,
            new_name
        );
        if let Some(slot) = self.layout_state.layouts.iter_mut().find(|l| l.layout_id == renamed.layout_id) {
            *slot = renamed;
        }
        self.remember_layout(new_name)?;
        Ok(true)
    }

    /// Delete the active layout and fall back to the first remaining one
    pub async fn delete_layout(&mut self) -> Result<bool> {
        let Some(current) = self.layout_state.current().cloned() else {
            return Ok(false);
        };
        let store = self.layout_store()?;
        store.delete_layout(&current).await?;
        tracing::info!("Table '{}': deleted layout '{}'", self.table_id, current.layout_name);

        self.layout_state.layouts.retain(|l| l.layout_id != current.layout_id);
        let fallback = self
            .layout_state
            .layouts
            .first()
            .map(|l| l.layout_name.clone())
            .unwrap_or_else(|| DEFAULT_LAYOUT_NAME.to_string());
        self.select_layout(&fallback)?;
        Ok(true)
    }
}
