use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gv_core::{ChangeStatus, CommandBus, GridCommand, Item, Layout, ManualClock, TrackKey};
use gv_grid::{DataGrid, GridConfig, GridEvent};
use gv_layout::{
    ActiveLayoutPointer, KeyValueStore, LayoutError, LayoutStore, LocalLayoutStore, MemoryKeyValueStore, NewLayout,
    SqliteKeyValueStore, StoredLayout,
};
use proptest::prelude::*;
use serde_json::{json, Value};

fn item(value: Value) -> Item {
    value.as_object().cloned().unwrap_or_default()
}

fn orders() -> Vec<Item> {
    vec![
        item(json!({"id": 1, "customerName": "Ann", "amount": 12.5})),
        item(json!({"id": 2, "customerName": "Bob", "amount": 40})),
        item(json!({"id": 3, "customerName": "Cid", "amount": 7})),
    ]
}

fn grid_with_kv(kv: Arc<dyn KeyValueStore>) -> DataGrid<Item> {
    let store = Arc::new(LocalLayoutStore::new(kv.clone()));
    let mut grid = DataGrid::new("orders", "id", GridConfig::default())
        .with_layout_store(store, ActiveLayoutPointer::new(kv));
    grid.set_items(orders());
    grid
}

#[tokio::test]
async fn test_layout_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("layouts.db");

    {
        let kv: Arc<dyn KeyValueStore> = Arc::new(SqliteKeyValueStore::open(&path).unwrap());
        let mut grid = grid_with_kv(kv);
        grid.load_layouts().await.unwrap();
        assert_eq!(grid.current_layout_name(), "Default");

        grid.create_layout("Wide").await.unwrap();
        grid.resize_column("amount", 100.0);
        grid.toggle_sort("amount", false);
        assert!(grid.save_layout().await.unwrap());
    }

    let kv: Arc<dyn KeyValueStore> = Arc::new(SqliteKeyValueStore::open(&path).unwrap());
    let mut grid = grid_with_kv(kv);
    grid.load_layouts().await.unwrap();

    assert_eq!(grid.layouts().len(), 2);
    assert_eq!(grid.current_layout_name(), "Wide");
    assert_eq!(grid.header("amount").map(|h| h.width), Some(180.0));
    assert_eq!(grid.sort_columns(), &["amount".to_string()]);
    let ids: Vec<Value> = grid.filtered_items().map(|i| i["id"].clone()).collect();
    assert_eq!(ids, vec![json!(3), json!(1), json!(2)]);

    assert!(grid.select_layout("Default").unwrap());
    assert_eq!(grid.header("amount").map(|h| h.width), Some(80.0));
    assert!(grid.sort_columns().is_empty());
}

#[tokio::test]
async fn test_switching_tables_loads_their_layouts() {
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
    let mut grid = grid_with_kv(kv.clone());
    grid.load_layouts().await.unwrap();
    grid.create_layout("Mine").await.unwrap();

    grid.set_items(vec![item(json!({"id": "a", "sku": "X-1"}))]);
    grid.set_table("products").await.unwrap();
    assert_eq!(grid.table_id(), "products");
    assert_eq!(grid.current_layout_name(), "Default");
    let fields: Vec<&str> = grid.headers().iter().map(|h| h.value.as_str()).collect();
    assert_eq!(fields, vec!["id", "sku"]);

    assert_eq!(ActiveLayoutPointer::new(kv).get("orders").unwrap().as_deref(), Some("Mine"));
}

#[test]
fn test_layout_snapshot_round_trips_through_json() {
    let mut grid = DataGrid::new("orders", "id", GridConfig::default());
    grid.set_items(orders());
    grid.apply_filter("customerName", "b", None);
    grid.toggle_sort("amount", false);
    grid.toggle_column_visible("id");

    let snapshot = grid.layout_snapshot();
    let parsed = Layout::parse(&snapshot.to_json().unwrap(), &[]).unwrap();
    assert_eq!(parsed, snapshot);

    let mut other = DataGrid::new("orders", "id", GridConfig::default());
    other.set_items(orders());
    other.apply_layout(parsed);
    assert_eq!(other.layout_snapshot(), snapshot);
    assert_eq!(other.filtered_len(), grid.filtered_len());
}

/// Store whose listing always fails, optionally refusing writes too
struct Unreachable {
    inner: LocalLayoutStore,
    refuse_writes: bool,
}

fn unavailable() -> LayoutError {
    LayoutError::Status {
        status: 503,
        message: "unavailable".into(),
    }
}

#[async_trait]
impl LayoutStore for Unreachable {
    async fn get_layouts(&self, _table_id: &str) -> gv_layout::Result<Vec<StoredLayout>> {
        Err(unavailable())
    }

    async fn add_layout(&self, draft: NewLayout) -> gv_layout::Result<StoredLayout> {
        if self.refuse_writes {
            return Err(unavailable());
        }
        self.inner.add_layout(draft).await
    }

    async fn update_layout(&self, stored: &StoredLayout, layout: &Layout) -> gv_layout::Result<StoredLayout> {
        self.inner.update_layout(stored, layout).await
    }

    async fn rename_layout(&self, stored: &StoredLayout, new_name: &str) -> gv_layout::Result<StoredLayout> {
        self.inner.rename_layout(stored, new_name).await
    }

    async fn delete_layout(&self, stored: &StoredLayout) -> gv_layout::Result<()> {
        self.inner.delete_layout(stored).await
    }

    fn store_name(&self) -> &str {
        "unreachable"
    }
}

#[tokio::test]
async fn test_failed_load_falls_back_to_default() {
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
    let store = Arc::new(Unreachable {
        inner: LocalLayoutStore::new(kv.clone()),
        refuse_writes: false,
    });
    let mut grid = DataGrid::new("orders", "id", GridConfig::default())
        .with_layout_store(store, ActiveLayoutPointer::new(kv));
    grid.set_items(orders());

    grid.load_layouts().await.unwrap();
    assert_eq!(grid.current_layout_name(), "Default");
    assert_eq!(grid.layouts().len(), 1);
    assert_eq!(grid.headers().len(), 3);
    assert_eq!(grid.filtered_len(), 3);
}

#[tokio::test]
async fn test_store_down_keeps_default_in_memory() {
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
    let store = Arc::new(Unreachable {
        inner: LocalLayoutStore::new(kv.clone()),
        refuse_writes: true,
    });
    let mut grid = DataGrid::new("orders", "id", GridConfig::default())
        .with_layout_store(store, ActiveLayoutPointer::new(kv));
    grid.set_items(vec![item(json!({"id": 1, "a": 2}))]);

    grid.load_layouts().await.unwrap();
    assert_eq!(grid.current_layout_name(), "Default");
    assert_eq!(grid.headers().len(), 2);
    let fallback = grid.current_layout().unwrap().layout(&[]).unwrap();
    assert_eq!(fallback.headers, grid.headers().to_vec());
    assert_eq!(grid.filtered_len(), 1);

    grid.toggle_sort("a", false);
    assert_eq!(grid.sort_columns(), &["a".to_string()]);
    assert!(grid.save_layout().await.is_err());
}

#[test]
fn test_bus_commands_drive_row_lifecycle() {
    let clock = ManualClock::new();
    let bus = CommandBus::new();
    let mut grid = DataGrid::new("orders", "id", GridConfig::default()).with_clock(Arc::new(clock.clone()));
    grid.attach_bus(bus.clone());
    grid.set_items(orders());
    grid.drain_events();

    bus.publish("orders", GridCommand::Add(vec![item(json!({"id": 4, "customerName": "Dee"}))]));
    bus.publish("orders", GridCommand::Add(vec![item(json!({"id": 4, "customerName": "Dee"}))]));
    assert_eq!(grid.poll(), 2);
    assert_eq!(grid.items().len(), 4);
    let added = grid
        .visible_rows()
        .iter()
        .find(|row| row.item["id"] == json!(4))
        .and_then(|row| row.visual_state.as_ref())
        .map(|state| state.status);
    assert_eq!(added, Some(ChangeStatus::Updated));
    assert!(grid.visual_state(&TrackKey::from_value(Some(&json!(4)))).is_none());

    bus.publish("orders", GridCommand::Delete(vec![json!(2)]));
    grid.poll();
    let deleted = TrackKey::from_value(Some(&json!(2)));
    assert_eq!(grid.visual_state(&deleted).map(|s| s.status), Some(ChangeStatus::Deleted));
    grid.drain_events();

    clock.advance(Duration::from_millis(1049));
    assert_eq!(grid.poll(), 0);
    assert_eq!(grid.items().len(), 4);

    clock.advance(Duration::from_millis(1));
    assert_eq!(grid.poll(), 1);
    assert_eq!(grid.items().len(), 3);
    assert!(grid.items().iter().all(|i| i["id"] != json!(2)));
    assert!(matches!(grid.drain_events().as_slice(), [GridEvent::ItemsChanged(items)] if items.len() == 3));

    bus.publish("other", GridCommand::Delete(vec![json!(1)]));
    assert_eq!(grid.poll(), 0);
}

proptest! {
    #[test]
    fn prop_window_covers_viewport(
        heights in prop::collection::vec(1.0f64..60.0, 1..80),
        top in 0.0f64..3000.0,
        viewport in 1.0f64..400.0,
    ) {
        let mut config = GridConfig::default();
        config.items_before = 0.0;
        config.items_after = 0.0;
        config.scroll_debounce_ms = 0;
        config.viewport_height = viewport;

        let rows: Vec<Item> = (0..heights.len()).map(|i| item(json!({"id": i}))).collect();
        let by_id = heights.clone();
        let mut grid = DataGrid::new("t", "id", config)
            .with_row_height(move |row: &Item, _expanded| {
                by_id[row["id"].as_u64().unwrap_or(0) as usize]
            });
        grid.set_items(rows);
        grid.scroll(top, 0.0);
        grid.poll();

        let range = grid.visible_range().unwrap();
        let offsets = grid.row_offsets();
        for i in 0..heights.len() {
            let start = offsets.start_of(i);
            let end = start + heights[i];
            if start < top + viewport && end > top {
                prop_assert!(range.contains(i), "row {} at {}..{} outside {:?}", i, start, end, range);
            }
        }
        prop_assert_eq!(grid.visible_rows().len(), range.count());
    }

    #[test]
    fn prop_filter_and_quick_search_intersect(
        names in prop::collection::vec("[abc]{0,3}", 0..30),
        filter in "[abc]{0,2}",
        search in "[abc]{0,2}",
    ) {
        let rows: Vec<Item> = names
            .iter()
            .enumerate()
            .map(|(i, n)| item(json!({"id": i, "name": n})))
            .collect();
        let ids = |filter: &str, search: &str| -> Vec<Value> {
            let mut grid = DataGrid::new("t", "id", GridConfig::default());
            grid.set_items(rows.clone());
            grid.apply_filter("name", filter, None);
            grid.set_quick_search(search);
            grid.sync_filtered_items();
            grid.filtered_items().map(|i| i["id"].clone()).collect()
        };

        let both = ids(&filter, &search);
        let only_filter = ids(&filter, "");
        let only_search = ids("", &search);
        let expected: Vec<Value> = only_filter.iter().filter(|id| only_search.contains(id)).cloned().collect();
        prop_assert_eq!(both, expected);
    }
}
