//! Core view computation for the virtualized grid
//!
//! This crate holds the building blocks that do not depend on storage or
//! hosting: record access, filter evaluation, sorting, offset windowing,
//! change tracking, deferred timers and the table-scoped command bus.

pub mod events;
pub mod export;
pub mod filter;
pub mod format;
pub mod header;
pub mod layout;
pub mod record;
pub mod sort;
pub mod timer;
pub mod tracker;
pub mod window;

// Re-export commonly used types
pub use events::{CommandBus, GridCommand, Subscription};
pub use export::{ExportDocument, ExportHeader, ExportRequest};
pub use filter::{FilterCondition, FilterSet, Operand};
pub use header::Header;
pub use layout::Layout;
pub use record::{Item, Record, TrackKey};
pub use sort::SortKey;
pub use timer::{Clock, ManualClock, SystemClock, TimerQueue};
pub use tracker::{ChangeStatus, ChangeTracker, ColorScheme, VisualState};
pub use window::{Margins, OffsetIndex, WindowRange};
