use anyhow::Result;
use anyhow::bail;
use datagrid_lib::DataGrid;
use datagrid_lib::column::ColumnDef;
use datagrid_lib::column::TableStyle;
use datagrid_lib::config::GridConfig;

use super::open_grid;
use super::open_store;
use crate::cli::Cli;
use crate::cli::ColumnsAction;
use crate::cli::optional_color;

pub async fn run(cli: &Cli, action: &ColumnsAction) -> Result<()> {
    let columns = match action {
        ColumnsAction::List { columns }
        | ColumnsAction::Show { columns, .. }
        | ColumnsAction::Hide { columns, .. }
        | ColumnsAction::Move { columns, .. }
        | ColumnsAction::Color { columns, .. }
        | ColumnsAction::Style { columns, .. }
        | ColumnsAction::Reset { columns } => columns,
    };
    let store = open_store(cli).await?;
    let config = GridConfig::default().with_namespace(cli.namespace.as_str());
    let mut grid = open_grid(cli, columns, store.clone(), config).await?;

    match action {
        ColumnsAction::List { .. } => {
            print!("{}", describe(&grid));
            return Ok(());
        }
        ColumnsAction::Reset { .. } => {
            grid.reset_columns();
            store.settle().await;
            store.reset(grid.table_id()).await?;
            println!("Reset columns of '{}'", grid.table_id());
            return Ok(());
        }
        ColumnsAction::Show { key, .. } => require(grid.set_column_hidden(key, false), key)?,
        ColumnsAction::Hide { key, .. } => require(grid.set_column_hidden(key, true), key)?,
        ColumnsAction::Move { key, to, .. } => {
            if *to >= grid.columns().len() {
                bail!(
                    "position {} is out of range; '{}' has {} columns",
                    to,
                    grid.table_id(),
                    grid.columns().len()
                );
            }
            require(grid.move_column_key(key, *to), key)?;
        }
        ColumnsAction::Color { key, color, .. } => {
            require(grid.set_column_background(key, optional_color(color)), key)?;
        }
        ColumnsAction::Style {
            vertical_borders,
            header,
            ..
        } => {
            let mut style: TableStyle = grid.style().clone();
            if let Some(borders) = vertical_borders {
                style.show_vertical_borders = *borders;
            }
            if let Some(header) = header {
                style.header_background_color = optional_color(header).unwrap_or_default();
            }
            grid.set_style(style);
        }
    }

    grid.flush_settings().await?;
    print!("{}", describe(&grid));
    Ok(())
}

fn require(found: bool, key: &str) -> Result<()> {
    if !found {
        bail!("no column '{}'", key);
    }
    Ok(())
}

fn flags(column: &ColumnDef) -> String {
    let mut flags = Vec::new();
    if column.hidden {
        flags.push("hidden".to_string());
    }
    if column.sortable {
        flags.push("sortable".to_string());
    }
    if column.filterable {
        flags.push("filterable".to_string());
    }
    if let Some(color) = column.background_color() {
        flags.push(format!("background {}", color));
    }
    flags.join(", ")
}

/// One line per column in display order, then the table style.
fn describe(grid: &DataGrid) -> String {
    let mut out = String::new();
    for (i, column) in grid.columns().iter().enumerate() {
        let line = format!("{:>2}  {:<16} {:<20} {}", i, column.key, column.label, flags(column));
        out.push_str(line.trim_end());
        out.push('\n');
    }
    let style = grid.style();
    out.push_str(&format!(
        "style: vertical borders {}, header {}\n",
        if style.show_vertical_borders { "on" } else { "off" },
        style.header_background().unwrap_or("default")
    ));
    out
}
