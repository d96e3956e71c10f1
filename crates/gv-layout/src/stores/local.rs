//! Layout store on top of a key-value store
//!
//! Each layout is one entry under `gdatagrid.{tableId}.{layoutId}` holding
//! the JSON record. Ids come from the shared counter `gdatagrid.newid`.

use std::sync::Arc;

use async_trait::async_trait;
use gv_core::Layout;

use crate::kv::KeyValueStore;
use crate::{LayoutError, LayoutStore, NewLayout, Result, StoredLayout};

const KEY_PREFIX: &str = "gdatagrid";
const NEW_ID_KEY: &str = "gdatagrid.newid";

/// Layouts kept in a [`KeyValueStore`]
#[derive(Clone)]
pub struct LocalLayoutStore {
    kv: Arc<dyn KeyValueStore>,
}

impl LocalLayoutStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    fn table_prefix(table_id: &str) -> String {
        format!("{}.{}.", KEY_PREFIX, table_id)
    }

    fn layout_key(table_id: &str, layout_id: i64) -> String {
        format!("{}{}", Self::table_prefix(table_id), layout_id)
    }

    fn next_id(&self) -> Result<i64> {
        let id = self
            .kv
            .get(NEW_ID_KEY)?
            .and_then(|text| text.trim().parse::<i64>().ok())
            .unwrap_or(1);
        self.kv.set(NEW_ID_KEY, &(id + 1).to_string())?;
        Ok(id)
    }

    fn write(&self, stored: &StoredLayout) -> Result<()> {
        let key = Self::layout_key(&stored.table_id, stored.layout_id);
        self.kv.set(&key, &serde_json::to_string(stored)?)
    }

    fn read_all(&self, table_id: &str) -> Result<Vec<StoredLayout>> {
        let mut layouts = Vec::new();
        for key in self.kv.keys_with_prefix(&Self::table_prefix(table_id))? {
            let Some(text) = self.kv.get(&key)? else {
                continue;
            };
            match serde_json::from_str::<StoredLayout>(&text) {
                // `orders.archive` entries share the `orders.` prefix
                Ok(stored) if stored.table_id != table_id => {}
                Ok(stored) => layouts.push(stored),
                Err(e) => tracing::warn!("Skipping unreadable layout entry '{}': {}", key, e),
            }
        }
        layouts.sort_by_key(|l| l.layout_id);
        Ok(layouts)
    }

    fn ensure_name_free(&self, table_id: &str, name: &str, except: Option<i64>) -> Result<()> {
        let taken = self
            .read_all(table_id)?
            .iter()
            .any(|l| l.layout_name == name && Some(l.layout_id) != except);
        if taken {
            return Err(LayoutError::NameTaken(name.to_string()));
        }
        Ok(())
    }

    fn existing(&self, stored: &StoredLayout) -> Result<StoredLayout> {
        let key = Self::layout_key(&stored.table_id, stored.layout_id);
        let text = self.kv.get(&key)?.ok_or(LayoutError::NotFound(stored.layout_id))?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl LayoutStore for LocalLayoutStore {
    async fn get_layouts(&self, table_id: &str) -> Result<Vec<StoredLayout>> {
        self.read_all(table_id)
    }

    async fn add_layout(&self, draft: NewLayout) -> Result<StoredLayout> {
        self.ensure_name_free(&draft.table_id, &draft.layout_name, None)?;
        let stored = draft.into_stored(self.next_id()?);
        self.write(&stored)?;
        tracing::debug!(
            "Added layout '{}' ({}) for table '{}'",
            stored.layout_name,
            stored.layout_id,
            stored.table_id
        );
        Ok(stored)
    }

    async fn update_layout(&self, stored: &StoredLayout, layout: &Layout) -> Result<StoredLayout> {
        let mut updated = self.existing(stored)?;
        updated.grid_layout_json = layout.to_json()?;
        self.write(&updated)?;
        Ok(updated)
    }

    async fn rename_layout(&self, stored: &StoredLayout, new_name: &str) -> Result<StoredLayout> {
        self.ensure_name_free(&stored.table_id, new_name, Some(stored.layout_id))?;
        let mut renamed = self.existing(stored)?;
        renamed.layout_name = new_name.to_string();
        self.write(&renamed)?;
        Ok(renamed)
    }

    async fn delete_layout(&self, stored: &StoredLayout) -> Result<()> {
        self.kv.remove(&Self::layout_key(&stored.table_id, stored.layout_id))
    }

    fn store_name(&self) -> &str {
        "local"
    }
}
