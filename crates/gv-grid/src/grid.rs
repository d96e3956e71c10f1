//! The grid engine: item ownership, view pipeline and windowing

use std::sync::Arc;
use std::time::Duration;

use ahash::AHashSet;
use gv_core::filter::matches_quick_search;
use gv_core::header::key_to_header_text;
use gv_core::sort::{parse_sort_columns, sort_indices};
use gv_core::tracker::{remove_by_identity, upsert_by_identity};
use gv_core::{
    ChangeTracker, Clock, CommandBus, FilterSet, GridCommand, Header, OffsetIndex, Record, Subscription,
    SystemClock, TimerQueue, TrackKey, VisualState, WindowRange,
};
use indexmap::IndexSet;
use serde_json::Value;

use crate::config::GridConfig;
use crate::events::GridEvent;
use crate::layouts::LayoutState;

/// Vertical jump that flags the grid as loading until the next refresh
const LOADING_JUMP_VERTICAL: f64 = 200.0;
const LOADING_JUMP_HORIZONTAL: f64 = 100.0;

/// Width given to synthesized headers
const SYNTHESIZED_HEADER_WIDTH: f64 = 80.0;

/// Caller supplied row height: `(row, is_expanded) -> pixels`
pub type RowHeightFn<R> = Box<dyn Fn(&R, bool) -> f64 + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerSlot {
    Filter,
    Scroll,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TimerAction {
    Refilter,
    Refresh { rows: bool, columns: bool },
    RemoveDeleted(AHashSet<TrackKey>),
}

/// A materialized row of the vertical window
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleRow<R> {
    /// Position among the filtered rows
    pub index: usize,
    pub item: R,
    /// Pixel offset of the row's top edge
    pub top: f64,
    pub height: f64,
    pub expanded: bool,
    /// Highlight consumed while materializing this row
    pub visual_state: Option<VisualState>,
}

/// Filtered, sorted and windowed view over a record collection
pub struct DataGrid<R: Record> {
    pub(crate) config: GridConfig,
    pub(crate) table_id: String,
    pub(crate) track_by: String,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) timers: TimerQueue<TimerSlot, TimerAction>,
    row_height_fn: Option<RowHeightFn<R>>,

    // Collection and derived view
    pub(crate) items: Vec<R>,
    filtered: Vec<usize>,
    row_offsets: OffsetIndex,
    pub(crate) expanded: AHashSet<TrackKey>,
    pub(crate) tracker: ChangeTracker,

    // Query state
    pub(crate) headers: Vec<Header>,
    pub(crate) filters: FilterSet,
    pub(crate) sort_columns: Vec<String>,
    pub(crate) quick_search: String,

    // Selection
    pub(crate) selection: IndexSet<TrackKey>,
    pub(crate) current: Option<TrackKey>,
    pub(crate) last_click: Option<Duration>,

    // Viewport
    scroll_top: f64,
    scroll_left: f64,
    loading: bool,
    visible_range: Option<WindowRange>,
    visible_rows: Vec<VisibleRow<R>>,
    visible_headers: Vec<Header>,
    columns_offset: f64,
    total_width: f64,

    pub(crate) events: Vec<GridEvent<R>>,
    pub(crate) bus: Option<CommandBus<R>>,
    subscription: Option<Subscription<R>>,
    pub(crate) layout_state: LayoutState,
}

impl<R: Record + Send + 'static> DataGrid<R> {
    /// Create an empty grid for `table_id`, identifying rows by `track_by`
    pub fn new(table_id: impl Into<String>, track_by: impl Into<String>, config: GridConfig) -> Self {
        let tracker = ChangeTracker::new(config.color_scheme.clone());
        Self {
            config,
            table_id: table_id.into(),
            track_by: track_by.into(),
            clock: Arc::new(SystemClock::new()),
            timers: TimerQueue::new(),
            row_height_fn: None,
            items: Vec::new(),
            filtered: Vec::new(),
            row_offsets: OffsetIndex::default(),
            expanded: AHashSet::new(),
            tracker,
            headers: Vec::new(),
            filters: FilterSet::new(),
            sort_columns: Vec::new(),
            quick_search: String::new(),
            selection: IndexSet::new(),
            current: None,
            last_click: None,
            scroll_top: 0.0,
            scroll_left: 0.0,
            loading: false,
            visible_range: None,
            visible_rows: Vec::new(),
            visible_headers: Vec::new(),
            columns_offset: 0.0,
            total_width: 0.0,
            events: Vec::new(),
            bus: None,
            subscription: None,
            layout_state: LayoutState::default(),
        }
    }

    /// Drive timers from `clock` instead of the system clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Compute row heights with `height_fn` instead of the configured height
    pub fn with_row_height<F>(mut self, height_fn: F) -> Self
    where
        F: Fn(&R, bool) -> f64 + Send + Sync + 'static,
    {
        self.row_height_fn = Some(Box::new(height_fn));
        self
    }

    /// Receive row commands published for this grid's table
    pub fn attach_bus(&mut self, bus: CommandBus<R>) {
        self.subscription = Some(bus.subscribe(self.table_id.clone()));
        self.bus = Some(bus);
    }

    pub(crate) fn resubscribe(&mut self) {
        if let Some(bus) = &self.bus {
            self.subscription = Some(bus.subscribe(self.table_id.clone()));
        }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    pub fn track_by(&self) -> &str {
        &self.track_by
    }

    pub fn track_key(&self, item: &R) -> TrackKey {
        TrackKey::of(item, &self.track_by)
    }

    // ------------------------------------------------------------------
    // Items

    pub fn items(&self) -> &[R] {
        &self.items
    }

    /// Replace the collection. Returns `false` when `items` equals the
    /// current collection, in which case nothing is recomputed.
    pub fn set_items(&mut self, items: Vec<R>) -> bool {
        if items == self.items {
            return false;
        }
        self.replace_items(items);
        true
    }

    fn replace_items(&mut self, items: Vec<R>) {
        self.items = items;

        let live: AHashSet<TrackKey> = self.items.iter().map(|item| self.track_key(item)).collect();
        self.tracker.retain_keys(&live);
        self.expanded.retain(|key| live.contains(key));
        let before = self.selection.len();
        self.selection.retain(|key| live.contains(key));
        if self.selection.len() != before {
            self.emit_selection();
        }

        self.sync_filtered_items();
    }

    /// Adopt a collection produced by a structural change and announce it
    fn adopt_items(&mut self, items: Vec<R>) {
        self.events.push(GridEvent::ItemsChanged(items.clone()));
        self.replace_items(items);
    }

    /// Upsert `incoming` by track identity and return the new collection.
    ///
    /// Rows already present are marked updated, new rows added.
    pub fn add_items(&mut self, incoming: Vec<R>) -> Vec<R> {
        if incoming.is_empty() {
            return self.items.clone();
        }
        let upsert = upsert_by_identity(&self.items, incoming, &self.track_by);
        tracing::debug!(
            "Table '{}': {} rows added, {} updated",
            self.table_id,
            upsert.added.len(),
            upsert.updated.len()
        );
        self.tracker.mark_updated(upsert.updated);
        self.tracker.mark_added(upsert.added);
        self.adopt_items(upsert.items.clone());
        upsert.items
    }

    /// Mark rows with the given raw track values as deleted and schedule
    /// their removal once the highlight has played. Returns how many rows
    /// were found.
    pub fn delete_items(&mut self, keys: &[Value]) -> usize {
        if keys.is_empty() {
            return 0;
        }
        let targets: AHashSet<TrackKey> = keys.iter().map(|value| TrackKey::from_value(Some(value))).collect();

        let found: AHashSet<TrackKey> = self
            .items
            .iter()
            .map(|item| self.track_key(item))
            .filter(|key| targets.contains(key))
            .collect();
        let count = found.len();

        let before = self.selection.len();
        for key in &found {
            self.selection.shift_remove(key);
        }
        if self.selection.len() != before {
            self.emit_selection();
        }
        self.tracker.mark_deleted(found);

        let due = self.clock.now() + self.config.deletion_delay();
        self.timers.once(due, TimerAction::RemoveDeleted(targets));
        tracing::debug!("Table '{}': {} rows scheduled for removal", self.table_id, count);
        count
    }

    /// Flag rows as updated without touching their data
    pub fn highlight_items(&mut self, items: &[R]) {
        let keys: Vec<TrackKey> = items.iter().map(|item| self.track_key(item)).collect();
        self.tracker.mark_updated(keys);
    }

    /// Refresh the visible rows if highlights were recorded since the last
    /// call. Returns whether a refresh happened.
    pub fn invalidate(&mut self) -> bool {
        if self.tracker.take_pending() == 0 {
            return false;
        }
        self.update_visible_items();
        true
    }

    /// Pending highlight of a row, without consuming it
    pub fn visual_state(&self, key: &TrackKey) -> Option<&VisualState> {
        self.tracker.peek(key)
    }

    // ------------------------------------------------------------------
    // View pipeline

    /// Synthesize headers from the first item when none are defined
    pub(crate) fn ensure_headers(&mut self) {
        if !self.headers.is_empty() {
            return;
        }
        let Some(first) = self.items.first() else {
            return;
        };
        self.headers = first
            .field_names()
            .into_iter()
            .filter(|field| !self.config.system_columns.contains(field))
            .map(|field| {
                let text = key_to_header_text(&field);
                Header::new(field).with_text(text).with_width(SYNTHESIZED_HEADER_WIDTH)
            })
            .collect();
        tracing::debug!("Table '{}': synthesized {} headers", self.table_id, self.headers.len());
        self.events.push(GridEvent::HeadersChanged(self.headers.clone()));
        self.update_visible_headers();
    }

    /// Recompute the filtered rows now, cancelling any pending debounced
    /// refilter, then rebuild offsets and the vertical window
    pub fn sync_filtered_items(&mut self) {
        self.timers.cancel_slot(&TimerSlot::Filter);
        self.ensure_headers();

        let keys = self.filters.active_keys();
        let fields: Vec<String> = self.headers.iter().map(|h| h.value.clone()).collect();
        let mut filtered: Vec<usize> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                self.filters.matches(*item, &keys, None) && matches_quick_search(*item, &fields, &self.quick_search)
            })
            .map(|(index, _)| index)
            .collect();
        sort_indices(&mut filtered, &self.items, &parse_sort_columns(&self.sort_columns));

        tracing::debug!(
            "Table '{}': {} of {} rows pass filters",
            self.table_id,
            filtered.len(),
            self.items.len()
        );
        self.filtered = filtered;
        self.recalc_offsets();
    }

    /// Rows passing the filters, in display order
    pub fn filtered_items(&self) -> impl Iterator<Item = &R> + '_ {
        self.filtered.iter().filter_map(|&index| self.items.get(index))
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn filtered_item(&self, row: usize) -> Option<&R> {
        self.filtered.get(row).and_then(|&index| self.items.get(index))
    }

    pub(crate) fn row_of_key(&self, key: &TrackKey) -> Option<usize> {
        self.filtered_items().position(|item| self.track_key(item) == *key)
    }

    fn row_height(&self, item: &R, expanded: bool) -> f64 {
        match &self.row_height_fn {
            Some(height_fn) => height_fn(item, expanded),
            None if expanded => self.config.row_height + self.config.expanded_extra_height,
            None => self.config.row_height,
        }
    }

    pub(crate) fn recalc_offsets(&mut self) {
        let offsets = OffsetIndex::from_sizes(self.filtered_items().map(|item| {
            let expanded = self.expanded.contains(&self.track_key(item));
            self.row_height(item, expanded)
        }));
        self.row_offsets = offsets;
        self.update_visible_items();
    }

    pub fn row_offsets(&self) -> &OffsetIndex {
        &self.row_offsets
    }

    pub fn total_height(&self) -> f64 {
        self.row_offsets.total()
    }

    /// Flip the expanded state of a filtered row
    pub fn toggle_expand(&mut self, row: usize) -> bool {
        let Some(item) = self.filtered_item(row) else {
            return false;
        };
        let key = self.track_key(item);
        if !self.expanded.remove(&key) {
            self.expanded.insert(key);
        }
        self.recalc_offsets();
        true
    }

    pub fn is_expanded(&self, item: &R) -> bool {
        self.expanded.contains(&self.track_key(item))
    }

    // ------------------------------------------------------------------
    // Windowing

    /// Materialize the rows around the viewport, consuming their highlights
    pub fn update_visible_items(&mut self) {
        let range = self.row_offsets.window(
            self.scroll_top,
            self.config.viewport_height,
            self.config.row_margins(),
        );

        let mut rows = Vec::with_capacity(range.map_or(0, |r| r.count()));
        if let Some(range) = range {
            for index in range.indices() {
                let Some(item) = self.filtered.get(index).and_then(|&i| self.items.get(i)) else {
                    continue;
                };
                let key = TrackKey::of(item, &self.track_by);
                rows.push(VisibleRow {
                    index,
                    item: item.clone(),
                    top: self.row_offsets.start_of(index),
                    height: self.row_offsets.size_of(index).unwrap_or(0.0),
                    expanded: self.expanded.contains(&key),
                    visual_state: self.tracker.consume(&key),
                });
            }
        }

        self.visible_range = range;
        self.visible_rows = rows;
        self.loading = false;
    }

    /// Recompute the contiguous slice of shown columns around the viewport
    pub fn update_visible_headers(&mut self) {
        let shown: Vec<&Header> = self.headers.iter().filter(|h| !h.hidden).collect();
        let widths = OffsetIndex::from_sizes(shown.iter().map(|h| h.effective_width()));
        self.total_width = widths.total();

        match widths.window(self.scroll_left, self.config.viewport_width, self.config.column_margins()) {
            Some(range) => {
                self.visible_headers = shown[range.first..=range.last].iter().map(|h| (*h).clone()).collect();
                self.columns_offset = range.leading_offset;
            }
            None => {
                self.visible_headers.clear();
                self.columns_offset = 0.0;
            }
        }
        self.loading = false;
    }

    pub fn visible_rows(&self) -> &[VisibleRow<R>] {
        &self.visible_rows
    }

    pub fn visible_range(&self) -> Option<WindowRange> {
        self.visible_range
    }

    pub fn visible_headers(&self) -> &[Header] {
        &self.visible_headers
    }

    /// Width of the shown columns left of the first visible header
    pub fn columns_offset(&self) -> f64 {
        self.columns_offset
    }

    pub fn total_width(&self) -> f64 {
        self.total_width
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn scroll_position(&self) -> (f64, f64) {
        (self.scroll_top, self.scroll_left)
    }

    /// Record a scroll position. Only the axes that moved are refreshed,
    /// once scrolling has settled.
    pub fn scroll(&mut self, top: f64, left: f64) {
        let top = top.max(0.0);
        let left = left.max(0.0);
        let vertical = top != self.scroll_top;
        let horizontal = left != self.scroll_left;
        if !vertical && !horizontal {
            return;
        }
        if (top - self.scroll_top).abs() > LOADING_JUMP_VERTICAL
            || (left - self.scroll_left).abs() > LOADING_JUMP_HORIZONTAL
        {
            self.loading = true;
        }
        self.scroll_top = top;
        self.scroll_left = left;

        let (rows, columns) = match self.timers.pending_action(&TimerSlot::Scroll) {
            Some(TimerAction::Refresh { rows, columns }) => (*rows || vertical, *columns || horizontal),
            _ => (vertical, horizontal),
        };
        let due = self.clock.now() + self.config.scroll_debounce();
        self.timers.debounce(TimerSlot::Scroll, due, TimerAction::Refresh { rows, columns });
    }

    /// Apply a new viewport size and refresh both axes immediately
    pub fn resize_viewport(&mut self, width: f64, height: f64) {
        self.config.viewport_width = width.max(0.0);
        self.config.viewport_height = height.max(0.0);
        self.update_visible_items();
        self.update_visible_headers();
    }

    // ------------------------------------------------------------------
    // Timers, commands and events

    /// Run due timers and queued bus commands. Returns how many ran.
    pub fn poll(&mut self) -> usize {
        let mut handled = 0;

        let commands: Vec<GridCommand<R>> = match self.subscription.as_mut() {
            Some(subscription) => std::iter::from_fn(|| subscription.try_next()).collect(),
            None => Vec::new(),
        };
        for command in commands {
            self.apply_command(command);
            handled += 1;
        }

        for action in self.timers.take_due(self.clock.now()) {
            self.run_timer(action);
            handled += 1;
        }
        handled
    }

    /// When the next timer fires, on the grid's clock
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_due()
    }

    fn run_timer(&mut self, action: TimerAction) {
        match action {
            TimerAction::Refilter => self.sync_filtered_items(),
            TimerAction::Refresh { rows, columns } => {
                if rows {
                    self.update_visible_items();
                }
                if columns {
                    self.update_visible_headers();
                }
            }
            TimerAction::RemoveDeleted(keys) => {
                let remaining = remove_by_identity(&self.items, &keys, &self.track_by);
                if remaining.len() != self.items.len() {
                    tracing::debug!(
                        "Table '{}': removed {} deleted rows",
                        self.table_id,
                        self.items.len() - remaining.len()
                    );
                    self.adopt_items(remaining);
                }
            }
        }
    }

    /// Apply one row command as if it came from the bus
    pub fn apply_command(&mut self, command: GridCommand<R>) {
        match command {
            GridCommand::Add(items) => {
                self.add_items(items);
            }
            GridCommand::Delete(keys) => {
                self.delete_items(&keys);
            }
            GridCommand::Highlight(items) => self.highlight_items(&items),
            GridCommand::Invalidate => {
                self.invalidate();
            }
        }
    }

    /// Take the events raised since the last call
    pub fn drain_events(&mut self) -> Vec<GridEvent<R>> {
        std::mem::take(&mut self.events)
    }
}
