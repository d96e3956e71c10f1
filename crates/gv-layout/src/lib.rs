//! Layout persistence for the grid
//!
//! A [`LayoutStore`] keeps named layouts per table. Two backends exist: a
//! local one on top of any [`KeyValueStore`] and a remote one talking to a
//! REST service. The active layout of each table is remembered separately
//! through [`ActiveLayoutPointer`].

pub mod kv;
pub mod stores;

use async_trait::async_trait;
use gv_core::Layout;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-exports
pub use kv::{ActiveLayoutPointer, KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
pub use stores::{LocalLayoutStore, RemoteExporter, RemoteLayoutStore};

/// Errors that can occur while loading or saving layouts
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),

    #[error("Server responded with {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Layout name '{0}' is already in use")]
    NameTaken(String),

    #[error("Layout {0} not found")]
    NotFound(i64),
}

impl From<rusqlite::Error> for LayoutError {
    fn from(error: rusqlite::Error) -> Self {
        LayoutError::Sqlite(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LayoutError>;

/// A persisted layout record
///
/// Field names on the wire match the layout service contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLayout {
    #[serde(rename = "layoutID")]
    pub layout_id: i64,
    #[serde(rename = "tableID")]
    pub table_id: String,
    #[serde(rename = "layoutName")]
    pub layout_name: String,
    #[serde(rename = "gridLayoutJson", default)]
    pub grid_layout_json: String,
    #[serde(rename = "isPublic", default)]
    pub is_public: bool,
}

impl StoredLayout {
    /// Decode the stored body, dropping `system_columns`
    pub fn layout(&self, system_columns: &[String]) -> Result<Layout> {
        Ok(Layout::parse(&self.grid_layout_json, system_columns)?)
    }
}

/// A layout that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLayout {
    #[serde(rename = "tableID")]
    pub table_id: String,
    #[serde(rename = "layoutName")]
    pub layout_name: String,
    #[serde(rename = "gridLayoutJson")]
    pub grid_layout_json: String,
    #[serde(rename = "isPublic")]
    pub is_public: bool,
}

impl NewLayout {
    pub fn new(table_id: impl Into<String>, layout_name: impl Into<String>, layout: &Layout) -> Result<Self> {
        Ok(Self {
            table_id: table_id.into(),
            layout_name: layout_name.into(),
            grid_layout_json: layout.to_json()?,
            is_public: false,
        })
    }

    /// Attach an id assigned by a store
    pub fn into_stored(self, layout_id: i64) -> StoredLayout {
        StoredLayout {
            layout_id,
            table_id: self.table_id,
            layout_name: self.layout_name,
            grid_layout_json: self.grid_layout_json,
            is_public: self.is_public,
        }
    }
}

/// Storage of named layouts, keyed by table
#[async_trait]
pub trait LayoutStore: Send + Sync {
    /// All layouts of a table, oldest first
    async fn get_layouts(&self, table_id: &str) -> Result<Vec<StoredLayout>>;

    /// Persist a new layout and return it with its assigned id
    async fn add_layout(&self, draft: NewLayout) -> Result<StoredLayout>;

    /// Replace the body of an existing layout
    async fn update_layout(&self, stored: &StoredLayout, layout: &Layout) -> Result<StoredLayout>;

    /// Rename a layout; fails with [`LayoutError::NameTaken`] when another
    /// layout of the same table already uses `new_name`
    async fn rename_layout(&self, stored: &StoredLayout, new_name: &str) -> Result<StoredLayout>;

    async fn delete_layout(&self, stored: &StoredLayout) -> Result<()>;

    /// Short name used in logs
    fn store_name(&self) -> &str;
}
