//! Building an [`ExportPayload`] from processed rows.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::panic::catch_unwind;

use chrono::Local;
use log::debug;
use log::warn;

use super::ExportCell;
use super::ExportMetadata;
use super::ExportPayload;
use super::ExportScope;
use super::accent_color;
use super::export_alignments;
use super::export_columns;
use super::lower_html;
use super::lower_text;
use crate::cell::CellNode;
use crate::column::ColumnDef;
use crate::column::TableStyle;
use crate::config::DEFAULT_ACTIONS_KEY;
use crate::config::DEFAULT_ROW_ID_KEY;
use crate::config::ExportOptions;
use crate::error::RenderError;
use crate::query::paginate;
use crate::selection::SelectionTracker;
use crate::model::Row;

/// Inputs for [`prepare_export`].
///
/// `rows` is the filtered, sorted row set in display order; the scope decides
/// which of them are exported.
///
/// # Example
///
/// ```
/// use datagrid_lib::column::ColumnDef;
/// use datagrid_lib::export::{prepare_export, ExportRequest, ExportScope};
/// use datagrid_lib::model::Row;
///
/// let rows: Vec<Row> = (1..=25).map(|i| Row::new().set("id", i as i64)).collect();
/// let refs: Vec<&Row> = rows.iter().collect();
/// let columns = vec![ColumnDef::new("id", "Id")];
///
/// let payload = prepare_export(
///     &ExportRequest::new(&refs, &columns)
///         .scope(ExportScope::CurrentPage)
///         .page(3, 10),
/// );
/// assert_eq!(payload.metadata.exported_records, 5);
/// ```
#[derive(Debug, Clone)]
pub struct ExportRequest<'a> {
    rows: &'a [&'a Row],
    columns: &'a [ColumnDef],
    scope: ExportScope,
    page: usize,
    page_size: usize,
    selection: Option<&'a SelectionTracker>,
    style: TableStyle,
    options: ExportOptions,
    row_id_key: String,
    actions_key: String,
}

impl<'a> ExportRequest<'a> {
    /// Creates a request exporting every row.
    pub fn new(rows: &'a [&'a Row], columns: &'a [ColumnDef]) -> Self {
        Self {
            rows,
            columns,
            scope: ExportScope::All,
            page: 1,
            page_size: rows.len().max(1),
            selection: None,
            style: TableStyle::default(),
            options: ExportOptions::default(),
            row_id_key: DEFAULT_ROW_ID_KEY.to_string(),
            actions_key: DEFAULT_ACTIONS_KEY.to_string(),
        }
    }

    pub fn scope(mut self, scope: ExportScope) -> Self {
        self.scope = scope;
        self
    }

    /// Sets the pagination used by the `current-page` scope.
    pub fn page(mut self, page: usize, page_size: usize) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    /// Enables the `selected` scope.
    pub fn selection(mut self, selection: &'a SelectionTracker) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn style(mut self, style: TableStyle) -> Self {
        self.style = style;
        self
    }

    pub fn options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn row_id_key(mut self, key: impl Into<String>) -> Self {
        self.row_id_key = key.into();
        self
    }

    pub fn actions_key(mut self, key: impl Into<String>) -> Self {
        self.actions_key = key.into();
        self
    }
}

/// Extracts the message from a caught panic payload.
fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Renders one cell, isolating both errors and panics in the render rule.
fn render_cell(column: &ColumnDef, row: &Row) -> Result<CellNode, RenderError> {
    match catch_unwind(AssertUnwindSafe(|| column.render(row))) {
        Ok(result) => result,
        Err(panic) => Err(RenderError::new(&column.key, panic_message(panic.as_ref()))),
    }
}

/// Snapshots the rows selected by `request.scope` into an [`ExportPayload`].
///
/// A cell whose render rule fails is logged and replaced with its raw value
/// stringified; the rest of the export is unaffected. Requesting `selected`
/// without a selection tracker exports the current page and records the
/// fallback in the metadata.
pub fn prepare_export(request: &ExportRequest<'_>) -> ExportPayload {
    let window = paginate(request.rows.len(), request.page, request.page_size);

    let (scope, rows): (ExportScope, Vec<&Row>) = match (request.scope, request.selection) {
        (ExportScope::All, _) => (ExportScope::All, request.rows.to_vec()),
        (ExportScope::Selected, Some(selection)) => {
            let rows = request
                .rows
                .iter()
                .copied()
                .filter(|row| {
                    row.id(&request.row_id_key)
                        .is_some_and(|id| selection.is_selected(&id))
                })
                .collect();
            (ExportScope::Selected, rows)
        }
        (ExportScope::Selected, None) => {
            warn!(
                "'{}': selected scope requested without selection tracking; exporting current page",
                request.options.title
            );
            (ExportScope::CurrentPage, window.slice(request.rows).to_vec())
        }
        (ExportScope::CurrentPage, _) => (ExportScope::CurrentPage, window.slice(request.rows).to_vec()),
    };

    let columns = export_columns(request.columns, &request.actions_key);
    let image_max_px = request.options.image_max_px;
    let mut degraded_cells = 0;

    let cells: Vec<Vec<ExportCell>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| {
                    let raw = row.value(&column.key).clone();
                    match render_cell(column, row) {
                        Ok(node) => ExportCell {
                            html: lower_html(&node, image_max_px),
                            text: lower_text(&node),
                            accent: accent_color(&node).map(str::to_string),
                            raw,
                        },
                        Err(e) => {
                            degraded_cells += 1;
                            warn!("{}; exporting raw value", e);
                            ExportCell::plain(raw.to_string(), raw)
                        }
                    }
                })
                .collect()
        })
        .collect();

    debug!(
        "prepared {} export: {} of {} rows, {} columns, {} degraded cells",
        scope,
        cells.len(),
        request.rows.len(),
        columns.len(),
        degraded_cells
    );

    let paged = scope == ExportScope::CurrentPage;
    ExportPayload {
        columns: columns.iter().map(|c| c.label.clone()).collect(),
        column_keys: columns.iter().map(|c| c.key.clone()).collect(),
        column_alignments: export_alignments(&columns),
        column_backgrounds: columns
            .iter()
            .map(|c| c.background_color().map(str::to_string))
            .collect(),
        style: request.style.clone(),
        metadata: ExportMetadata {
            title: request.options.title.clone(),
            generated_at: Local::now(),
            scope,
            requested_scope: request.scope,
            scope_fallback: scope != request.scope,
            total_records: request.rows.len(),
            exported_records: cells.len(),
            current_page: paged.then_some(window.page),
            page_size: paged.then_some(window.page_size),
            degraded_cells,
        },
        rows: cells,
    }
}
