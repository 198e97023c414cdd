//! Data state engine: filter, search, sort, paginate.
//!
//! The order is fixed: **filter → search → sort → paginate**. Every stage is
//! synchronous and pure, so callers simply recompute whenever an input changes.
//!
//! - [`ActiveFilters`] - per-column constraints, including date ranges
//! - [`SortState`] - tri-state single-column sort
//! - [`PageWindow`] - the current page's bounds

mod filter;
mod page;
mod search;
mod sort;

pub use filter::*;
pub use page::*;
pub use search::*;
pub use sort::*;

use serde::Deserialize;
use serde::Serialize;

use crate::column::ColumnDef;
use crate::column::FilterDescriptor;
use crate::model::Row;

/// Search, filter and sort inputs for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub filters: ActiveFilters,
    #[serde(default)]
    pub sort: SortState,
}

impl DataQuery {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the search text.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Sets the filters.
    pub fn with_filters(mut self, filters: ActiveFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Sets the sort.
    pub fn with_sort(mut self, sort: SortState) -> Self {
        self.sort = sort;
        self
    }
}

/// Returns indices of the rows that pass `query`, in display order.
pub fn compute_indices(
    rows: &[Row],
    query: &DataQuery,
    columns: &[ColumnDef],
    descriptors: &[FilterDescriptor],
) -> Vec<usize> {
    let needle = normalize_query(&query.search);
    let mut indices: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| query.filters.matches(row, descriptors))
        .filter(|(_, row)| matches_search(row, &needle, columns))
        .map(|(i, _)| i)
        .collect();
    sort_indices(&mut indices, rows, &query.sort, columns);
    indices
}

/// The rows that pass a query, in display order.
#[derive(Debug, Clone)]
pub struct Computed<'a> {
    /// Filtered, searched and sorted rows.
    pub rows: Vec<&'a Row>,
    /// Number of rows in `rows`.
    pub total_count: usize,
}

impl Computed<'_> {
    /// Returns the window for `page`.
    pub fn window(&self, page: usize, page_size: usize) -> PageWindow {
        paginate(self.total_count, page, page_size)
    }

    /// Returns the rows of `page`.
    pub fn page(&self, page: usize, page_size: usize) -> &[&Row] {
        self.window(page, page_size).slice(&self.rows)
    }
}

/// Filters, searches and sorts `rows`.
///
/// # Example
///
/// ```
/// use datagrid_lib::column::ColumnDef;
/// use datagrid_lib::model::{Row, Value};
/// use datagrid_lib::query::{compute, DataQuery, Direction, SortState};
///
/// let rows = vec![
///     Row::new().set("id", 1i64).set("name", "Ada").set("amount", 100i64),
///     Row::new().set("id", 2i64).set("name", "Bo").set("amount", Value::Null),
/// ];
/// let columns = vec![
///     ColumnDef::new("name", "Name"),
///     ColumnDef::new("amount", "Amount").sortable(),
/// ];
/// let query = DataQuery::new().with_sort(SortState::by("amount", Direction::Desc));
/// let computed = compute(&rows, &query, &columns, &[]);
/// assert_eq!(computed.rows[0].value("name").as_str(), Some("Ada"));
/// ```
pub fn compute<'a>(
    rows: &'a [Row],
    query: &DataQuery,
    columns: &[ColumnDef],
    descriptors: &[FilterDescriptor],
) -> Computed<'a> {
    let rows: Vec<&Row> = compute_indices(rows, query, columns, descriptors)
        .into_iter()
        .map(|i| &rows[i])
        .collect();
    Computed {
        total_count: rows.len(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    fn rows() -> Vec<Row> {
        vec![
            Row::new().set("id", 1i64).set("name", "Ada").set("amount", 100i64).set("status", "paid"),
            Row::new().set("id", 2i64).set("name", "Bo").set("amount", Value::Null).set("status", "late"),
            Row::new().set("id", 3i64).set("name", "Cy").set("amount", 50i64).set("status", "paid"),
        ]
    }

    fn columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("name", "Name").sortable(),
            ColumnDef::new("amount", "Amount").sortable(),
            ColumnDef::new("status", "Status").searchable(false),
        ]
    }

    fn names(computed: &Computed<'_>) -> Vec<String> {
        computed.rows.iter().map(|r| r.value("name").to_string()).collect()
    }

    #[test]
    fn test_nulls_last_end_to_end() {
        let rows = vec![
            Row::new().set("id", 1i64).set("name", "Ada").set("amount", 100i64),
            Row::new().set("id", 2i64).set("name", "Bo").set("amount", Value::Null),
        ];
        let asc = DataQuery::new().with_sort(SortState::by("amount", Direction::Asc));
        let desc = DataQuery::new().with_sort(SortState::by("amount", Direction::Desc));
        // Bo's null amount sorts last in both directions.
        assert_eq!(names(&compute(&rows, &asc, &columns(), &[])), vec!["Ada", "Bo"]);
        assert_eq!(names(&compute(&rows, &desc, &columns(), &[])), vec!["Ada", "Bo"]);
    }

    #[test]
    fn test_filter_then_search_then_sort() {
        let rows = rows();
        let query = DataQuery::new()
            .with_filters(ActiveFilters::new().with("status", "paid"))
            .with_search("")
            .with_sort(SortState::by("amount", Direction::Asc));
        assert_eq!(names(&compute(&rows, &query, &columns(), &[])), vec!["Cy", "Ada"]);
    }

    #[test]
    fn test_search_skips_unsearchable_columns() {
        let rows = rows();
        let query = DataQuery::new().with_search("late");
        assert_eq!(compute(&rows, &query, &columns(), &[]).total_count, 0);
    }

    #[test]
    fn test_filter_idempotence() {
        let rows = rows();
        let query = DataQuery::new().with_filters(ActiveFilters::new().with("status", "paid"));
        let once = compute_indices(&rows, &query, &columns(), &[]);
        let filtered: Vec<Row> = once.iter().map(|&i| rows[i].clone()).collect();
        let twice = compute(&filtered, &query, &columns(), &[]);
        assert_eq!(twice.total_count, once.len());
        assert_eq!(names(&twice), vec!["Ada", "Cy"]);
    }

    #[test]
    fn test_computed_page() {
        let rows = rows();
        let computed = compute(&rows, &DataQuery::new(), &columns(), &[]);
        assert_eq!(computed.page(2, 2).len(), 1);
        assert_eq!(computed.window(9, 2).page, 2);
    }
}
