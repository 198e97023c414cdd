use anyhow::Result;
use datagrid_lib::column::Alignment;
use datagrid_lib::export::lower_text;
use log::warn;

use super::load_grid;
use crate::cli::Cli;
use crate::cli::ViewArgs;

/// Widest a column is printed before its text is cut.
const MAX_WIDTH: usize = 40;

pub async fn run(cli: &Cli, args: &ViewArgs) -> Result<()> {
    let grid = load_grid(cli, &args.source, &args.query).await?;
    let view = grid.view();

    let headers: Vec<&str> = view.columns.iter().map(|c| c.label.as_str()).collect();
    let aligns: Vec<Alignment> = view
        .columns
        .iter()
        .map(|c| c.align.unwrap_or_default())
        .collect();
    let cells: Vec<Vec<String>> = view
        .rows
        .iter()
        .map(|row| {
            view.columns
                .iter()
                .map(|column| match column.render(row) {
                    Ok(node) => lower_text(&node),
                    Err(e) => {
                        warn!("{}", e);
                        row.value(&column.key).to_string()
                    }
                })
                .collect()
        })
        .collect();

    print!("{}", format_table(&headers, &cells, &aligns));
    println!(
        "Page {} of {} ({} rows, page sizes: {})",
        view.window.page,
        view.window.total_pages,
        view.window.total_count,
        page_sizes(&grid.page_size_options(), grid.page_size())
    );
    Ok(())
}

/// Lists the offered page sizes with the current one bracketed.
fn page_sizes(options: &[usize], current: usize) -> String {
    options
        .iter()
        .map(|&size| {
            if size == current {
                format!("[{}]", size)
            } else {
                size.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

fn pad(text: &str, width: usize, align: Alignment) -> String {
    match align {
        Alignment::Left => format!("{:<width$}", text),
        Alignment::Center => format!("{:^width$}", text),
        Alignment::Right => format!("{:>width$}", text),
    }
}

/// Lays out rows under a header with a dashed rule, columns separated by two
/// spaces. Line breaks inside cells are flattened.
fn format_table(headers: &[&str], rows: &[Vec<String>], aligns: &[Alignment]) -> String {
    let flat = |s: &str| s.replace(['\r', '\n'], " ");
    let headers: Vec<String> = headers.iter().map(|h| truncate(&flat(h), MAX_WIDTH)).collect();
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|c| truncate(&flat(c), MAX_WIDTH)).collect())
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &[String], aligned: bool| -> String {
        let parts: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, &width)| {
                let text = cells.get(i).map(String::as_str).unwrap_or("");
                let align = if aligned {
                    aligns.get(i).copied().unwrap_or_default()
                } else {
                    Alignment::Left
                };
                pad(text, width, align)
            })
            .collect();
        format!("{}\n", parts.join("  ").trim_end())
    };

    let mut out = line(&headers, false);
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    out.push_str(&format!("{}\n", rule.join("  ")));
    for row in &rows {
        out.push_str(&line(row, true));
    }
    out
}
