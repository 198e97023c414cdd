//! The live state of one table.
//!
//! [`DataGrid`] owns the rows, query, pagination, selection and column
//! customization of a single table id and keeps the processed row set
//! current: every mutating call recomputes it synchronously before
//! returning. Column customization is written to the [`ColumnStore`] in the
//! background and announced on the [`EventBus`].

use std::collections::HashSet;
use std::sync::Arc;

use log::debug;

use crate::column::ColumnDef;
use crate::column::FilterDescriptor;
use crate::column::TableStyle;
use crate::column::find_column;
use crate::config::ExportOptions;
use crate::config::GridConfig;
use crate::error::ExportError;
use crate::error::StoreError;
use crate::events::EventBus;
use crate::events::GridEvent;
use crate::export::ExportFormat;
use crate::export::ExportOutput;
use crate::export::ExportPayload;
use crate::export::ExportRequest;
use crate::export::ExportScope;
use crate::export::Exporter;
use crate::export::prepare_export;
use crate::model::Row;
use crate::model::RowId;
use crate::query::ActiveFilters;
use crate::query::DataQuery;
use crate::query::FilterValue;
use crate::query::PageWindow;
use crate::query::SortState;
use crate::query::compute_indices;
use crate::query::paginate;
use crate::selection::SelectAllStatus;
use crate::selection::SelectionTracker;
use crate::settings::ColumnStore;

/// The current page of a [`DataGrid`].
#[derive(Debug, Clone)]
pub struct GridView<'a> {
    /// Rows on the current page, in display order.
    pub rows: Vec<&'a Row>,
    pub window: PageWindow,
    /// Visible columns in display order.
    pub columns: Vec<&'a ColumnDef>,
    /// State of the "select all" checkbox for this page.
    pub selection: SelectAllStatus,
}

impl GridView<'_> {
    pub fn total_count(&self) -> usize {
        self.window.total_count
    }
}

/// Controller for one table.
///
/// # Example
///
/// ```
/// use datagrid_lib::column::ColumnDef;
/// use datagrid_lib::config::GridConfig;
/// use datagrid_lib::model::Row;
/// use datagrid_lib::state::DataGrid;
///
/// let mut grid = DataGrid::new("people", vec![ColumnDef::new("name", "Name").sortable()], GridConfig::default());
/// grid.set_rows(vec![
///     Row::new().set("id", 1i64).set("name", "Bo"),
///     Row::new().set("id", 2i64).set("name", "Ada"),
/// ]);
/// grid.toggle_sort("name");
/// let view = grid.view();
/// assert_eq!(view.rows[0].value("name").as_str(), Some("Ada"));
/// ```
#[derive(Debug)]
pub struct DataGrid {
    table_id: String,
    config: GridConfig,
    shipped: Vec<ColumnDef>,
    columns: Vec<ColumnDef>,
    style: TableStyle,
    descriptors: Vec<FilterDescriptor>,
    rows: Arc<Vec<Row>>,
    query: DataQuery,
    page: usize,
    page_size: usize,
    processed: Vec<usize>,
    selection: SelectionTracker,
    selection_enabled: bool,
    store: Option<ColumnStore>,
    events: EventBus,
}

impl DataGrid {
    /// Creates a grid with the as-shipped `columns` and no rows.
    pub fn new(table_id: impl Into<String>, columns: Vec<ColumnDef>, config: GridConfig) -> Self {
        let page_size = config.page_size.max(1);
        Self {
            table_id: table_id.into(),
            config,
            shipped: columns.clone(),
            columns,
            style: TableStyle::default(),
            descriptors: Vec::new(),
            rows: Arc::new(Vec::new()),
            query: DataQuery::default(),
            page: 1,
            page_size,
            processed: Vec::new(),
            selection: SelectionTracker::new(),
            selection_enabled: true,
            store: None,
            events: EventBus::new(),
        }
    }

    /// Persists column customization to `store`.
    pub fn with_store(mut self, store: ColumnStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Publishes events on a shared bus.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// Sets the filter descriptors that decide how each filter key matches.
    pub fn with_filter_descriptors(mut self, descriptors: Vec<FilterDescriptor>) -> Self {
        self.descriptors = descriptors;
        self.recompute();
        self
    }

    /// Disables row selection; a `selected` export then falls back to the
    /// current page.
    pub fn without_selection(mut self) -> Self {
        self.selection_enabled = false;
        self.selection.clear();
        self
    }

    /// Applies persisted column and style settings from the store.
    pub async fn load_settings(&mut self) {
        let Some(store) = self.store.clone() else {
            return;
        };
        self.columns = store.load(&self.table_id, &self.shipped).await;
        self.style = store.load_style(&self.table_id).await;
        debug!(
            "'{}': loaded {} columns from settings",
            self.table_id,
            self.columns.len()
        );
    }

    /// Writes the current columns and style to the store and waits for it.
    ///
    /// Customization calls already persist in the background; this is for
    /// hosts that are about to exit.
    pub async fn flush_settings(&self) -> Result<(), StoreError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        store.settle().await;
        store.save(&self.table_id, &self.columns).await?;
        store.save_style(&self.table_id, &self.style).await
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // =========================================================================
    // Rows and query
    // =========================================================================

    /// Replaces the row set. The page is kept but clamped; selections of rows
    /// that no longer exist are dropped.
    pub fn set_rows(&mut self, rows: Vec<Row>) {
        self.rows = Arc::new(rows);
        let known: HashSet<RowId> = self
            .rows
            .iter()
            .filter_map(|row| row.id(&self.config.row_id_key))
            .collect();
        let dropped = self.selection.retain_known(&known);
        self.recompute();
        self.clamp_page();
        self.events.publish(GridEvent::RowsReplaced {
            table_id: self.table_id.clone(),
            total: self.rows.len(),
        });
        if dropped > 0 {
            self.publish_selection();
        }
    }

    /// Returns all rows, unprocessed.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn query(&self) -> &DataQuery {
        &self.query
    }

    /// Sets the search text and returns to the first page.
    pub fn set_search(&mut self, search: impl Into<String>) {
        let search = search.into();
        if search == self.query.search {
            return;
        }
        self.query.search = search;
        self.query_changed();
    }

    /// Sets one filter; an empty value clears it.
    pub fn set_filter(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        if self.query.filters.set(key, value) {
            self.query_changed();
        }
    }

    pub fn remove_filter(&mut self, key: &str) {
        if self.query.filters.remove(key) {
            self.query_changed();
        }
    }

    /// Replaces all filters.
    pub fn set_filters(&mut self, filters: ActiveFilters) {
        if filters != self.query.filters {
            self.query.filters = filters;
            self.query_changed();
        }
    }

    pub fn clear_filters(&mut self) {
        self.set_filters(ActiveFilters::new());
    }

    pub fn filter_descriptors(&self) -> &[FilterDescriptor] {
        &self.descriptors
    }

    fn query_changed(&mut self) {
        self.recompute();
        self.page = 1;
        self.events.publish(GridEvent::QueryChanged {
            table_id: self.table_id.clone(),
            visible: self.processed.len(),
        });
        self.publish_page();
    }

    pub fn sort(&self) -> &SortState {
        &self.query.sort
    }

    /// Activates `key`'s header: none, ascending, descending, none.
    ///
    /// Returns `false` without changing anything if the column is unknown or
    /// not sortable.
    pub fn toggle_sort(&mut self, key: &str) -> bool {
        if !find_column(&self.columns, key).is_some_and(|c| c.sortable) {
            debug!("'{}': ignoring sort on '{}'", self.table_id, key);
            return false;
        }
        self.query.sort = self.query.sort.cycle(key);
        self.recompute();
        self.page = 1;
        self.events.publish(GridEvent::SortChanged {
            table_id: self.table_id.clone(),
            column: self.query.sort.column.clone(),
            direction: self.query.sort.direction,
        });
        self.publish_page();
        true
    }

    /// Sets the sort directly, as when restoring a saved view.
    ///
    /// Returns `false` without changing anything if the column is unknown or
    /// not sortable.
    pub fn set_sort(&mut self, sort: SortState) -> bool {
        if let Some(key) = sort.column.as_deref()
            && !find_column(&self.columns, key).is_some_and(|c| c.sortable)
        {
            debug!("'{}': ignoring sort on '{}'", self.table_id, key);
            return false;
        }
        if sort == self.query.sort {
            return true;
        }
        self.query.sort = sort;
        self.recompute();
        self.page = 1;
        self.events.publish(GridEvent::SortChanged {
            table_id: self.table_id.clone(),
            column: self.query.sort.column.clone(),
            direction: self.query.sort.direction,
        });
        self.publish_page();
        true
    }

    fn recompute(&mut self) {
        self.processed = compute_indices(&self.rows, &self.query, &self.columns, &self.descriptors);
        debug!(
            "'{}': {} of {} rows after query",
            self.table_id,
            self.processed.len(),
            self.rows.len()
        );
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Page sizes to offer, ascending and without duplicates. The current
    /// size is always among them.
    pub fn page_size_options(&self) -> Vec<usize> {
        let mut options: Vec<usize> = self
            .config
            .page_size_options
            .iter()
            .copied()
            .filter(|&size| size > 0)
            .chain(std::iter::once(self.page_size))
            .collect();
        options.sort_unstable();
        options.dedup();
        options
    }

    pub fn window(&self) -> PageWindow {
        paginate(self.processed.len(), self.page, self.page_size)
    }

    /// Moves to `page`, clamped to the available pages.
    pub fn set_page(&mut self, page: usize) {
        let clamped = paginate(self.processed.len(), page, self.page_size).page;
        if clamped != self.page {
            self.page = clamped;
            self.publish_page();
        }
    }

    pub fn next_page(&mut self) {
        self.set_page(self.page + 1);
    }

    pub fn previous_page(&mut self) {
        self.set_page(self.page.saturating_sub(1));
    }

    /// Changes the page size and returns to the first page.
    pub fn set_page_size(&mut self, page_size: usize) {
        let page_size = page_size.max(1);
        if page_size == self.page_size && self.page == 1 {
            return;
        }
        self.page_size = page_size;
        self.page = 1;
        self.publish_page();
    }

    fn clamp_page(&mut self) {
        let clamped = self.window().page;
        if clamped != self.page {
            self.page = clamped;
            self.publish_page();
        }
    }

    fn publish_page(&self) {
        self.events.publish(GridEvent::PageChanged {
            table_id: self.table_id.clone(),
            page: self.page,
            page_size: self.page_size,
        });
    }

    /// Returns every processed row in display order.
    pub fn visible_rows(&self) -> Vec<&Row> {
        self.processed.iter().map(|&i| &self.rows[i]).collect()
    }

    /// Returns the rows of the current page.
    pub fn page_rows(&self) -> Vec<&Row> {
        let window = self.window();
        self.processed[window.start..window.end]
            .iter()
            .map(|&i| &self.rows[i])
            .collect()
    }

    /// Returns the ids of the rows on the current page.
    pub fn page_row_ids(&self) -> Vec<RowId> {
        self.page_rows()
            .into_iter()
            .filter_map(|row| row.id(&self.config.row_id_key))
            .collect()
    }

    /// Returns the current page with its columns and selection status.
    pub fn view(&self) -> GridView<'_> {
        GridView {
            rows: self.page_rows(),
            window: self.window(),
            columns: self.visible_columns(),
            selection: self.selection_status(),
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    pub fn selection_enabled(&self) -> bool {
        self.selection_enabled
    }

    /// Toggles one row. Returns `true` if it is now selected.
    pub fn toggle_row(&mut self, id: impl Into<RowId>) -> bool {
        if !self.selection_enabled {
            return false;
        }
        let selected = self.selection.toggle(id);
        self.publish_selection();
        selected
    }

    /// Handles the header checkbox: selects the current page unless all of it
    /// is already selected, in which case it deselects the page.
    pub fn toggle_page_selection(&mut self) {
        if !self.selection_enabled {
            return;
        }
        let ids = self.page_row_ids();
        match self.selection.status(&ids) {
            SelectAllStatus::All => self.selection.deselect_all_visible(&ids),
            _ => self.selection.select_all_visible(ids),
        }
        self.publish_selection();
    }

    pub fn selection_status(&self) -> SelectAllStatus {
        self.selection.status(self.page_row_ids())
    }

    pub fn clear_selection(&mut self) {
        if !self.selection.is_empty() {
            self.selection.clear();
            self.publish_selection();
        }
    }

    fn publish_selection(&self) {
        self.events.publish(GridEvent::SelectionChanged {
            table_id: self.table_id.clone(),
            selected: self.selection.len(),
        });
    }

    // =========================================================================
    // Column customization
    // =========================================================================

    /// Returns all columns in display order, hidden ones included.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Returns the columns shown on screen, in display order.
    pub fn visible_columns(&self) -> Vec<&ColumnDef> {
        self.columns.iter().filter(|c| !c.hidden).collect()
    }

    pub fn style(&self) -> &TableStyle {
        &self.style
    }

    /// Shows or hides a column. Returns `false` if `key` is unknown.
    pub fn toggle_column_visibility(&mut self, key: &str) -> bool {
        let Some(column) = self.columns.iter_mut().find(|c| c.key == key) else {
            return false;
        };
        column.hidden = !column.hidden;
        self.columns_changed();
        true
    }

    /// Sets a column's visibility. Returns `false` if `key` is unknown.
    pub fn set_column_hidden(&mut self, key: &str, hidden: bool) -> bool {
        let Some(column) = self.columns.iter_mut().find(|c| c.key == key) else {
            return false;
        };
        if column.hidden != hidden {
            column.hidden = hidden;
            self.columns_changed();
        }
        true
    }

    /// Moves the column at `from` to position `to`.
    ///
    /// Returns `false` if either index is out of range.
    pub fn move_column(&mut self, from: usize, to: usize) -> bool {
        if from >= self.columns.len() || to >= self.columns.len() {
            return false;
        }
        if from != to {
            let column = self.columns.remove(from);
            self.columns.insert(to, column);
            self.columns_changed();
        }
        true
    }

    /// Moves the column `key` to position `to`.
    pub fn move_column_key(&mut self, key: &str, to: usize) -> bool {
        match self.columns.iter().position(|c| c.key == key) {
            Some(from) => self.move_column(from, to),
            None => false,
        }
    }

    /// Sets or clears a column's background color.
    pub fn set_column_background(&mut self, key: &str, color: Option<String>) -> bool {
        let Some(column) = self.columns.iter_mut().find(|c| c.key == key) else {
            return false;
        };
        column.background_color = color.filter(|c| !c.trim().is_empty());
        self.columns_changed();
        true
    }

    /// Replaces the table style.
    pub fn set_style(&mut self, style: TableStyle) {
        if style == self.style {
            return;
        }
        self.style = style;
        if let Some(store) = &self.store {
            store.spawn_save_style(&self.table_id, &self.style);
        }
        self.events.publish(GridEvent::StyleChanged {
            table_id: self.table_id.clone(),
        });
    }

    /// Restores the as-shipped columns and default style, clearing persisted
    /// settings.
    pub fn reset_columns(&mut self) {
        self.columns = self.shipped.clone();
        self.style = TableStyle::default();
        if let Some(store) = &self.store {
            store.spawn_reset(&self.table_id);
        }
        self.events.publish(GridEvent::ColumnsChanged {
            table_id: self.table_id.clone(),
        });
        self.events.publish(GridEvent::StyleChanged {
            table_id: self.table_id.clone(),
        });
    }

    fn columns_changed(&self) {
        if let Some(store) = &self.store {
            store.spawn_save(&self.table_id, &self.columns);
        }
        self.events.publish(GridEvent::ColumnsChanged {
            table_id: self.table_id.clone(),
        });
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Snapshots the rows of `scope` for export.
    pub fn prepare_export(&self, scope: ExportScope, options: ExportOptions) -> ExportPayload {
        let rows = self.visible_rows();
        let mut request = ExportRequest::new(&rows, &self.columns)
            .scope(scope)
            .page(self.page, self.page_size)
            .style(self.style.clone())
            .options(options)
            .row_id_key(self.config.row_id_key.as_str())
            .actions_key(self.config.actions_key.as_str());
        if self.selection_enabled {
            request = request.selection(&self.selection);
        }
        prepare_export(&request)
    }

    /// Prepares and encodes an export of `scope` as `format`, with the
    /// exporter's options.
    pub async fn export(
        &self,
        exporter: &Exporter,
        scope: ExportScope,
        format: ExportFormat,
    ) -> Result<ExportOutput, ExportError> {
        let payload = self.prepare_export(scope, exporter.options().clone());
        let output = exporter.export(payload, format).await?;
        self.events.publish(GridEvent::Exported {
            table_id: self.table_id.clone(),
            scope: output.scope,
            records: output.exported_records,
        });
        Ok(output)
    }
}
