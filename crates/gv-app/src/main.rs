//! Command line viewer for CSV files
//!
//! Loads a CSV file into a [`DataGrid`], restores the table's active layout
//! from a SQLite file and prints the materialized window.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use gv_core::format::cell_value;
use gv_core::record::display_text;
use gv_core::Item;
use gv_grid::{DataGrid, GridConfig};
use gv_layout::{ActiveLayoutPointer, KeyValueStore, LocalLayoutStore, SqliteKeyValueStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod csv_loader;

#[derive(Parser, Debug)]
#[command(name = "gridview")]
#[command(about = "Show a CSV file through a virtualized grid with saved layouts")]
struct Options {
    /// CSV file to load
    csv: PathBuf,

    /// Table id layouts are stored under (defaults to the file stem)
    #[arg(long)]
    table: Option<String>,

    /// Field identifying a row (defaults to the first column)
    #[arg(long = "track")]
    track_by: Option<String>,

    /// SQLite file holding layouts
    #[arg(long, default_value = "gridview.db")]
    store: PathBuf,

    /// Layout to show instead of the remembered one
    #[arg(long)]
    layout: Option<String>,

    /// Save the resulting view as a new layout
    #[arg(long)]
    save_as: Option<String>,

    /// Column filter, repeatable
    #[arg(long = "filter", value_name = "FIELD=TEXT", value_parser = parse_filter)]
    filters: Vec<(String, String)>,

    /// Quick search text
    #[arg(long)]
    search: Option<String>,

    /// Sort key such as `amount` or `amount desc`, repeatable
    #[arg(long, value_name = "FIELD[ desc]")]
    sort: Vec<String>,

    /// Vertical scroll position in pixels
    #[arg(long, default_value_t = 0.0)]
    scroll: f64,

    /// Viewport height in pixels
    #[arg(long)]
    height: Option<f64>,

    /// Viewport width in pixels
    #[arg(long)]
    width: Option<f64>,
}

fn parse_filter(pair: &str) -> std::result::Result<(String, String), String> {
    match pair.split_once('=') {
        Some((field, text)) if !field.is_empty() => Ok((field.to_string(), text.to_string())),
        _ => Err(format!("'{}' is not FIELD=TEXT", pair)),
    }
}

impl Options {
    fn table_id(&self) -> String {
        self.table.clone().unwrap_or_else(|| {
            self.csv
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "table".to_string())
        })
    }
}

fn render(grid: &DataGrid<Item>) -> String {
    let headers = grid.visible_headers();
    let undefined = &grid.config().undefined_text;
    let columns: Vec<usize> = headers
        .iter()
        .map(|h| ((h.effective_width() / 8.0).round() as usize).max(3))
        .collect();

    let cell = |text: &str, width: usize| -> String {
        let clipped: String = text.chars().take(width).collect();
        format!("{:<width$}", clipped, width = width)
    };

    let mut out = String::new();
    let titles: Vec<String> = headers
        .iter()
        .zip(&columns)
        .map(|(h, w)| cell(h.display_text(), *w))
        .collect();
    out.push_str(&format!("     | {}\n", titles.join(" | ")));

    for row in grid.visible_rows() {
        let marker = match &row.visual_state {
            Some(state) => format!("{:?}", state.status).chars().next().unwrap_or(' '),
            None => ' ',
        };
        let cells: Vec<String> = headers
            .iter()
            .zip(&columns)
            .map(|(h, w)| {
                let value = cell_value(row.item.get(&h.value), h, undefined);
                cell(&display_text(Some(&value)).unwrap_or_default(), *w)
            })
            .collect();
        out.push_str(&format!("{:>4}{}| {}\n", row.index, marker, cells.join(" | ")));
    }
    out
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let options = Options::parse();
    let items = csv_loader::load_items(&options.csv)?;
    let table_id = options.table_id();
    let track_by = match &options.track_by {
        Some(field) => field.clone(),
        None => items
            .first()
            .and_then(|first| first.keys().next().cloned())
            .unwrap_or_else(|| "id".to_string()),
    };

    let store_path = &options.store;
    let kv: Arc<dyn KeyValueStore> = Arc::new(
        SqliteKeyValueStore::open(store_path)
            .with_context(|| format!("Failed to open layout store {}", store_path.display()))?,
    );
    info!("Table '{}' tracked by '{}', layouts in {}", table_id, track_by, store_path.display());

    let mut config = GridConfig::default();
    config.scroll_debounce_ms = 0;
    if let Some(height) = options.height {
        config.viewport_height = height;
    }
    if let Some(width) = options.width {
        config.viewport_width = width;
    }

    let mut grid = DataGrid::new(table_id, track_by, config)
        .with_layout_store(Arc::new(LocalLayoutStore::new(kv.clone())), ActiveLayoutPointer::new(kv));
    grid.set_items(items);
    grid.load_layouts().await?;

    if let Some(name) = &options.layout {
        if !grid.select_layout(name)? {
            bail!("no layout named '{}'", name);
        }
    }
    for (field, text) in &options.filters {
        grid.apply_filter(field, text, None);
    }
    if let Some(search) = &options.search {
        grid.set_quick_search(search);
    }
    if !options.sort.is_empty() {
        grid.set_sort_columns(options.sort.clone());
    }
    grid.sync_filtered_items();
    if options.scroll > 0.0 {
        grid.scroll(options.scroll, 0.0);
        grid.poll();
    }
    if let Some(name) = &options.save_as {
        grid.create_layout(name).await?;
    }

    println!(
        "{} of {} rows, layout '{}'",
        grid.filtered_len(),
        grid.items().len(),
        grid.current_layout_name()
    );
    print!("{}", render(&grid));
    Ok(())
}
