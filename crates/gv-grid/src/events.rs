//! Notifications raised by the grid for its host

use gv_core::{ExportDocument, ExportRequest, Header};

/// Keyboard modifiers held during a click
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { ctrl: false, shift: false };
    pub const CTRL: Modifiers = Modifiers { ctrl: true, shift: false };
    pub const SHIFT: Modifiers = Modifiers { ctrl: false, shift: true };
}

/// Something the host may want to react to
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent<R> {
    /// Selection changed; carries the selected records and the last clicked one
    SelectionChanged { selected: Vec<R>, current: Option<R> },
    /// Same row clicked twice within the double click window
    DoubleClick(R),
    /// Export handed to the host (server mode)
    Export(ExportRequest),
    /// Export rendered locally
    ExportDocument(ExportDocument),
    /// Header list replaced or mutated
    HeadersChanged(Vec<Header>),
    /// The grid adopted a new item collection
    ItemsChanged(Vec<R>),
}
