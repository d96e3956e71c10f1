//! Virtualized grid engine
//!
//! [`DataGrid`] owns the derived view of a caller-supplied record
//! collection: the filtered and sorted rows, their pixel offsets, the slice
//! of rows and columns to materialize, the selection and the transient
//! change highlights. Layouts are loaded from and saved to a pluggable
//! [`LayoutStore`](gv_layout::LayoutStore).

pub mod config;
pub mod events;
pub mod grid;

mod columns;
mod export;
mod layouts;
mod query;
mod selection;

use gv_layout::LayoutError;
use thiserror::Error;

// Re-exports
pub use config::GridConfig;
pub use events::{GridEvent, Modifiers};
pub use grid::{DataGrid, VisibleRow};
pub use layouts::DEFAULT_LAYOUT_NAME;

/// Errors surfaced by grid operations
#[derive(Error, Debug)]
pub enum GridError {
    #[error("Layout store error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Invalid grid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("No layout store attached to table '{0}'")]
    NoLayoutStore(String),
}

pub type Result<T> = std::result::Result<T, GridError>;
