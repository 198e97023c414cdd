use std::collections::BTreeSet;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use datagrid_lib::config::ExportOptions;
use datagrid_lib::export::ExportScope;
use datagrid_lib::export::Exporter;
use datagrid_lib::model::RowId;
use log::info;

use super::load_grid;
use crate::cli::Cli;
use crate::cli::ExportArgs;

pub async fn run(cli: &Cli, args: &ExportArgs) -> Result<()> {
    let mut grid = load_grid(cli, &args.source, &args.query).await?;

    if args.selected.is_empty() {
        if args.scope == ExportScope::Selected {
            grid = grid.without_selection();
        }
    } else {
        let known: HashSet<RowId> = grid
            .rows()
            .iter()
            .filter_map(|row| row.id(&args.source.id_key))
            .collect();
        let ids: BTreeSet<&str> = args.selected.iter().map(|id| id.trim()).collect();
        for id in ids {
            if known.contains(id) {
                grid.toggle_row(id);
            } else {
                eprintln!("warning: no row with id '{}'", id);
            }
        }
    }

    let options = ExportOptions::new(args.title.as_str()).with_bom(!args.no_bom);
    let exporter = Exporter::new(options);
    let output = grid.export(&exporter, args.scope, args.format).await?;

    let path = output_path(args.out.as_deref(), &output.file_name);
    fs::write(&path, &output.bytes)
        .with_context(|| format!("cannot write {}", path.display()))?;
    info!(
        "'{}': wrote {} bytes to {}",
        grid.table_id(),
        output.bytes.len(),
        path.display()
    );

    if output.scope != args.scope {
        eprintln!(
            "warning: no rows selected with --select; exported scope '{}' instead",
            output.scope
        );
    }
    if output.degraded_cells > 0 {
        eprintln!(
            "warning: {} cells could not be rendered and show their raw value",
            output.degraded_cells
        );
    }
    println!(
        "Exported {} rows as {} to {}",
        output.exported_records,
        output.format,
        path.display()
    );
    Ok(())
}

/// Resolves `--out`: a directory receives the generated file name.
fn output_path(out: Option<&Path>, file_name: &str) -> PathBuf {
    match out {
        Some(dir) if dir.is_dir() => dir.join(file_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(file_name),
    }
}
