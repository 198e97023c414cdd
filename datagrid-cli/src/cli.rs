use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use datagrid_lib::export::ExportFormat;
use datagrid_lib::export::ExportScope;
use datagrid_lib::query::ActiveFilters;
use datagrid_lib::query::Direction;
use datagrid_lib::query::SortState;

#[derive(Parser, Debug)]
#[command(name = "datagrid", version, about = "Query, export and customize tabular JSON data.")]
pub struct Cli {
    /// Table id under which column settings are persisted.
    #[arg(long, short, global = true, default_value = "default")]
    pub table: String,

    /// Settings database (default: the platform data directory).
    #[arg(long, global = true, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Prefix of persisted settings keys.
    #[arg(long, global = true, default_value = "datagrid")]
    pub namespace: String,

    /// Mirror log output to stderr.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Export rows to a file.
    Export(ExportArgs),
    /// Print one page of rows as a plain-text table.
    View(ViewArgs),
    /// Inspect or change the persisted columns of a table.
    Columns {
        #[command(subcommand)]
        action: ColumnsAction,
    },
}

/// Row and column files.
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// JSON array of row objects.
    #[arg(long, value_name = "PATH")]
    pub rows: PathBuf,

    /// JSON column definitions.
    #[arg(long, value_name = "PATH")]
    pub columns: PathBuf,

    /// Field holding each row's unique id.
    #[arg(long, default_value = "id")]
    pub id_key: String,
}

/// Search, filter, sort and page options.
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Free-text search over searchable columns.
    #[arg(long, short)]
    pub search: Option<String>,

    /// Filter as `key=value`. Repeat a key to match any of several values.
    #[arg(long = "filter", short = 'f', value_name = "KEY=VALUE", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,

    /// Sort as `key` or `key:desc`.
    #[arg(long, value_name = "KEY[:asc|desc]", value_parser = parse_sort)]
    pub sort: Option<SortState>,

    /// One-based page number.
    #[arg(long, short, default_value_t = 1)]
    pub page: usize,

    /// Rows per page.
    #[arg(long, default_value_t = 10)]
    pub page_size: usize,
}

impl QueryArgs {
    /// Groups repeated keys into any-of filters.
    pub fn active_filters(&self) -> ActiveFilters {
        let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
        for (key, value) in &self.filters {
            match grouped.iter_mut().find(|(k, _)| k == key) {
                Some((_, values)) => values.push(value.clone()),
                None => grouped.push((key.clone(), vec![value.clone()])),
            }
        }
        let mut filters = ActiveFilters::new();
        for (key, mut values) in grouped {
            if values.len() == 1 {
                filters.set(key, values.remove(0));
            } else {
                filters.set(key, values);
            }
        }
        filters
    }
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub query: QueryArgs,

    /// Output format: csv, excel, word, pdf, html or print.
    #[arg(long, short = 'F', default_value = "csv")]
    pub format: ExportFormat,

    /// Rows to export: all, current-page or selected.
    #[arg(long, default_value = "all")]
    pub scope: ExportScope,

    /// Row ids to select (repeatable). Required for a `selected` export to
    /// use the selection rather than the current page.
    #[arg(long = "select", value_name = "ID")]
    pub selected: Vec<String>,

    /// Document title, also used for the file name.
    #[arg(long, default_value = "Export")]
    pub title: String,

    /// Output file or directory (default: generated name in the current directory).
    #[arg(long, short, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Omit the UTF-8 byte order mark from CSV output.
    #[arg(long)]
    pub no_bom: bool,
}

#[derive(Args, Debug)]
pub struct ViewArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub query: QueryArgs,
}

#[derive(Subcommand, Debug)]
pub enum ColumnsAction {
    /// List columns in display order with their settings.
    List {
        #[arg(long, value_name = "PATH")]
        columns: PathBuf,
    },
    /// Make a column visible.
    Show {
        #[arg(long, value_name = "PATH")]
        columns: PathBuf,
        key: String,
    },
    /// Hide a column.
    Hide {
        #[arg(long, value_name = "PATH")]
        columns: PathBuf,
        key: String,
    },
    /// Move a column to a zero-based position.
    Move {
        #[arg(long, value_name = "PATH")]
        columns: PathBuf,
        key: String,
        to: usize,
    },
    /// Set or clear (`none`) a column's background color.
    Color {
        #[arg(long, value_name = "PATH")]
        columns: PathBuf,
        key: String,
        color: String,
    },
    /// Change the table style.
    Style {
        #[arg(long, value_name = "PATH")]
        columns: PathBuf,
        /// Draw borders between columns.
        #[arg(long)]
        vertical_borders: Option<bool>,
        /// Header background (hex), or `none`.
        #[arg(long, value_name = "COLOR")]
        header: Option<String>,
    },
    /// Forget all customization of the table.
    Reset {
        #[arg(long, value_name = "PATH")]
        columns: PathBuf,
    },
}

fn parse_filter(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing filter key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_sort(s: &str) -> Result<SortState, String> {
    let (key, direction) = match s.split_once(':') {
        Some((key, "asc")) => (key, Direction::Asc),
        Some((key, "desc")) => (key, Direction::Desc),
        Some((_, other)) => return Err(format!("unknown sort direction '{}'", other)),
        None => (s, Direction::Asc),
    };
    if key.trim().is_empty() {
        return Err("missing sort key".to_string());
    }
    Ok(SortState::by(key.trim(), direction))
}

/// `none` or an empty string clears an optional color.
pub fn optional_color(color: &str) -> Option<String> {
    let color = color.trim();
    (!color.is_empty() && !color.eq_ignore_ascii_case("none")).then(|| color.to_string())
}
