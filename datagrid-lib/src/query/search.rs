//! Free-text search over searchable columns.

use crate::column::ColumnDef;
use crate::model::Row;

/// Normalizes a search query; only the empty string means "no search".
///
/// Whitespace is kept, so `" "` matches values that contain a space.
pub fn normalize_query(query: &str) -> String {
    query.to_lowercase()
}

/// Returns `true` if any searchable column of `row` contains `needle`.
///
/// `needle` must already be normalized with [`normalize_query`]. Matching is
/// a case-insensitive substring test on the stringified raw value; rendered
/// cell content is not searched.
pub fn matches_search(row: &Row, needle: &str, columns: &[ColumnDef]) -> bool {
    if needle.is_empty() {
        return true;
    }
    columns
        .iter()
        .filter(|column| column.searchable)
        .any(|column| {
            row.get(&column.key)
                .is_some_and(|value| value.to_string().to_lowercase().contains(needle))
        })
}
