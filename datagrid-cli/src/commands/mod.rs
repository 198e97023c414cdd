mod columns;
mod export;
mod view;

pub use columns::run as columns;
pub use export::run as export;
pub use view::run as view;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use datagrid_lib::DataGrid;
use datagrid_lib::config::GridConfig;
use datagrid_lib::settings::ColumnStore;
use datagrid_lib::settings::SqliteStore;
use log::debug;

use crate::cli::Cli;
use crate::cli::QueryArgs;
use crate::cli::SourceArgs;
use crate::paths;
use crate::schema::Schema;
use crate::schema::load_rows;

/// Opens the settings database named on the command line, or the default one.
pub async fn open_store(cli: &Cli) -> Result<ColumnStore> {
    let path = match &cli.settings {
        Some(path) => path.clone(),
        None => paths::settings_db().context("cannot determine the data directory")?,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    debug!("opening settings database {}", path.display());
    let backend = SqliteStore::open(&path)
        .await
        .with_context(|| format!("cannot open settings database {}", path.display()))?;
    Ok(ColumnStore::with_namespace(Arc::new(backend), cli.namespace.as_str()))
}

/// Builds a grid over the column file with persisted settings applied.
pub async fn open_grid(
    cli: &Cli,
    columns: &Path,
    store: ColumnStore,
    config: GridConfig,
) -> Result<DataGrid> {
    let schema = Schema::load(columns)?;
    let mut grid = DataGrid::new(cli.table.as_str(), schema.columns, config)
        .with_filter_descriptors(schema.filters)
        .with_store(store);
    grid.load_settings().await;
    Ok(grid)
}

/// Builds a grid with rows loaded and the query applied.
async fn load_grid(cli: &Cli, source: &SourceArgs, query: &QueryArgs) -> Result<DataGrid> {
    let store = open_store(cli).await?;
    let config = GridConfig::default()
        .with_namespace(cli.namespace.as_str())
        .with_row_id_key(source.id_key.as_str())
        .with_page_size(query.page_size);
    let mut grid = open_grid(cli, &source.columns, store, config).await?;
    grid.set_rows(load_rows(&source.rows)?);
    apply_query(&mut grid, query)?;
    Ok(grid)
}

/// Applies search, filters, sort and page in that order.
fn apply_query(grid: &mut DataGrid, query: &QueryArgs) -> Result<()> {
    if let Some(search) = &query.search {
        grid.set_search(search.as_str());
    }
    let filters = query.active_filters();
    if !filters.is_empty() {
        grid.set_filters(filters);
    }
    if let Some(sort) = &query.sort
        && !grid.set_sort(sort.clone())
    {
        bail!(
            "cannot sort by '{}': no such sortable column",
            sort.column.as_deref().unwrap_or_default()
        );
    }
    grid.set_page(query.page);
    debug!(
        "'{}': {} of {} rows match, page {}",
        grid.table_id(),
        grid.window().total_count,
        grid.rows().len(),
        grid.page()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Command;

    const COLUMNS: &str = r#"[
        {"key": "id", "label": "Id", "sortable": true},
        {"key": "name", "label": "Name", "sortable": true},
        {"key": "status", "label": "Status", "render": {"type": "badge", "colors": {"paid": "green"}}}
    ]"#;

    fn cli(dir: &Path, args: &[&str]) -> Cli {
        let settings = dir.join("nested").join("settings.db");
        let columns = dir.join("columns.json");
        let rows = dir.join("rows.json");
        let mut argv: Vec<String> = vec!["datagrid".into(), "--table".into(), "invoices".into()];
        argv.push("--settings".into());
        argv.push(settings.display().to_string());
        for arg in args {
            argv.push(match *arg {
                "@columns" => columns.display().to_string(),
                "@rows" => rows.display().to_string(),
                other => other.to_string(),
            });
        }
        Cli::try_parse_from(argv).unwrap()
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("columns.json"), COLUMNS).unwrap();
        let rows: Vec<serde_json::Value> = (1..=12)
            .map(|i| {
                serde_json::json!({
                    "id": i,
                    "name": format!("Customer {}", i),
                    "status": if i % 3 == 0 { "late" } else { "paid" },
                })
            })
            .collect();
        fs::write(
            dir.path().join("rows.json"),
            serde_json::to_string(&rows).unwrap(),
        )
        .unwrap();
        dir
    }

    #[tokio::test]
    async fn test_column_changes_persist() {
        let dir = fixture();
        let hide = cli(dir.path(), &["columns", "hide", "--columns", "@columns", "status"]);
        let Command::Columns { action } = &hide.command else {
            panic!("expected columns");
        };
        columns(&hide, action).await.unwrap();

        let store = open_store(&hide).await.unwrap();
        let grid = open_grid(
            &hide,
            &dir.path().join("columns.json"),
            store,
            GridConfig::default(),
        )
        .await
        .unwrap();
        let status = grid.columns().iter().find(|c| c.key == "status").unwrap();
        assert!(status.hidden);
        assert!(status.has_render());
    }

    #[tokio::test]
    async fn test_load_grid_applies_query() {
        let dir = fixture();
        let view = cli(
            dir.path(),
            &[
                "view", "--rows", "@rows", "--columns", "@columns", "-f", "status=paid", "--sort",
                "id:desc", "--page-size", "5", "--page", "2",
            ],
        );
        let Command::View(args) = &view.command else {
            panic!("expected view");
        };
        let grid = load_grid(&view, &args.source, &args.query).await.unwrap();
        assert_eq!(grid.window().total_count, 8);
        let ids = grid.page_row_ids();
        assert_eq!(ids, vec!["4", "2", "1"]);
    }

    #[tokio::test]
    async fn test_unsortable_column_rejected() {
        let dir = fixture();
        let view = cli(
            dir.path(),
            &["view", "--rows", "@rows", "--columns", "@columns", "--sort", "status"],
        );
        let Command::View(args) = &view.command else {
            panic!("expected view");
        };
        assert!(load_grid(&view, &args.source, &args.query).await.is_err());
    }
}
