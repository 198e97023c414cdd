//! Tri-state sort and the row comparator.

use std::cmp::Ordering;

use serde::Deserialize;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::column::ColumnDef;
use crate::model::Row;
use crate::model::Value;
use crate::model::cmp_f64;

/// Sort direction for ordering rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Ascending order (A-Z, 0-9).
    #[default]
    Asc,
    /// Descending order (Z-A, 9-0).
    Desc,
}

/// The current sort: a column and direction, or unsorted.
///
/// Activating the same column cycles `none -> asc -> desc -> none`;
/// activating a different column starts again at `asc`.
///
/// # Example
///
/// ```
/// use datagrid_lib::query::{Direction, SortState};
///
/// let sort = SortState::none().cycle("amount");
/// assert_eq!(sort, SortState::by("amount", Direction::Asc));
/// let sort = sort.cycle("amount").cycle("amount");
/// assert!(sort.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column: Option<String>,
    pub direction: Direction,
}

impl SortState {
    /// Creates an unsorted state.
    pub fn none() -> Self {
        Self::default()
    }

    /// Creates a sort on `column`.
    pub fn by(column: impl Into<String>, direction: Direction) -> Self {
        Self {
            column: Some(column.into()),
            direction,
        }
    }

    /// Returns `true` if no column is sorted.
    pub fn is_none(&self) -> bool {
        self.column.is_none()
    }

    /// Returns the sorted column and direction.
    pub fn active(&self) -> Option<(&str, Direction)> {
        self.column.as_deref().map(|c| (c, self.direction))
    }

    /// Returns the state after activating `column`'s header.
    pub fn cycle(&self, column: &str) -> Self {
        match self.active() {
            Some((current, Direction::Asc)) if current == column => Self::by(column, Direction::Desc),
            Some((current, Direction::Desc)) if current == column => Self::none(),
            _ => Self::by(column, Direction::Asc),
        }
    }
}

/// Collation key approximating locale-aware comparison: compatibility
/// decomposition, combining marks stripped, lowercased.
fn collation_key(s: &str) -> String {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Compares strings the way a user expects a name column to sort.
///
/// Accents and case are ignored first; ties then put lowercase before
/// uppercase, then fall back to code points so the order is total.
pub fn compare_strings(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| {
            let case = |s: &str| s.chars().map(char::is_uppercase).collect::<Vec<_>>();
            case(a).cmp(&case(b))
        })
        .then_with(|| a.cmp(b))
}

/// Three-way ascending comparison of two non-null values.
///
/// Numbers sort before everything else and compare numerically. All other
/// values compare by [`compare_strings`] on their stringified form, so a
/// column mixing numbers and text still has a total order.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => cmp_f64(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => match (a, b) {
            (Value::String(x), Value::String(y)) => compare_strings(x, y),
            _ => compare_strings(&a.to_string(), &b.to_string()),
        },
    }
}

/// Compares two rows on `key`. Nulls sort last in both directions.
pub fn compare_rows(a: &Row, b: &Row, key: &str, direction: Direction) -> Ordering {
    let (a, b) = (a.value(key), b.value(key));
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ordering = compare_values(a, b);
            match direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            }
        }
    }
}

/// Stable-sorts row indices by `sort`.
///
/// Sorting on an unknown or non-sortable column leaves the order unchanged.
pub fn sort_indices(indices: &mut [usize], rows: &[Row], sort: &SortState, columns: &[ColumnDef]) {
    let Some((key, direction)) = sort.active() else {
        return;
    };
    if !columns.iter().any(|c| c.key == key && c.sortable) {
        return;
    }
    indices.sort_by(|&a, &b| compare_rows(&rows[a], &rows[b], key, direction));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tri_state_cycle() {
        let first = SortState::none().cycle("a");
        assert_eq!(first.active(), Some(("a", Direction::Asc)));
        let second = first.cycle("a");
        assert_eq!(second.active(), Some(("a", Direction::Desc)));
        assert!(second.cycle("a").is_none());
    }

    #[test]
    fn test_other_column_restarts_ascending() {
        let sort = SortState::by("a", Direction::Desc).cycle("b");
        assert_eq!(sort.active(), Some(("b", Direction::Asc)));
    }

    #[test]
    fn test_compare_strings_ignores_case_and_accents() {
        assert_eq!(compare_strings("apple", "Banana"), Ordering::Less);
        assert_eq!(compare_strings("éclair", "eclairs"), Ordering::Less);
        assert_eq!(compare_strings("a", "A"), Ordering::Less);
        assert_eq!(compare_strings("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_compare_values_numeric() {
        assert_eq!(compare_values(&Value::Int(9), &Value::Float(10.5)), Ordering::Less);
        // Numeric, not lexicographic.
        assert_eq!(compare_values(&Value::Int(100), &Value::Int(20)), Ordering::Greater);
    }

    #[test]
    fn test_mixed_numbers_and_text() {
        assert_eq!(compare_values(&Value::Int(10), &Value::from("5x")), Ordering::Less);
        assert_eq!(compare_values(&Value::from("5x"), &Value::Int(9)), Ordering::Greater);
        assert_eq!(
            compare_values(&Value::Float(f64::NAN), &Value::Float(1.0)),
            Ordering::Greater
        );

        let rows: Vec<Row> = (0..200i64)
            .map(|i| match i % 3 {
                0 => Row::new().set("v", i),
                1 => Row::new().set("v", format!("{}x", i)),
                _ => Row::new().set("v", 1000 - i),
            })
            .collect();
        let columns = vec![ColumnDef::new("v", "V").sortable()];
        let mut indices: Vec<usize> = (0..rows.len()).collect();
        sort_indices(&mut indices, &rows, &SortState::by("v", Direction::Asc), &columns);

        let sorted: Vec<&Value> = indices.iter().map(|&i| rows[i].value("v")).collect();
        let first_text = sorted.iter().position(|v| v.as_f64().is_none()).unwrap();
        assert!(sorted[..first_text].iter().all(|v| v.as_f64().is_some()));
        assert!(sorted[first_text..].iter().all(|v| v.as_f64().is_none()));
        for pair in sorted.windows(2) {
            assert_ne!(compare_values(pair[0], pair[1]), Ordering::Greater);
        }
    }

    #[test]
    fn test_nulls_last_both_directions() {
        let a = Row::new().set("v", 1i64);
        let b = Row::new().set("v", Value::Null);
        assert_eq!(compare_rows(&a, &b, "v", Direction::Asc), Ordering::Less);
        assert_eq!(compare_rows(&a, &b, "v", Direction::Desc), Ordering::Less);
        assert_eq!(compare_rows(&b, &Row::new(), "v", Direction::Asc), Ordering::Equal);
    }

    #[test]
    fn test_non_sortable_column_is_noop() {
        let rows = vec![Row::new().set("v", 2i64), Row::new().set("v", 1i64)];
        let columns = vec![ColumnDef::new("v", "V")];
        let mut indices = vec![0, 1];
        sort_indices(&mut indices, &rows, &SortState::by("v", Direction::Asc), &columns);
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_sort_is_stable() {
        let rows = vec![
            Row::new().set("k", "x").set("n", 1i64),
            Row::new().set("k", "x").set("n", 2i64),
            Row::new().set("k", "a").set("n", 3i64),
        ];
        let columns = vec![ColumnDef::new("k", "K").sortable()];
        let mut indices = vec![0, 1, 2];
        sort_indices(&mut indices, &rows, &SortState::by("k", Direction::Desc), &columns);
        assert_eq!(indices, vec![0, 1, 2]);
        sort_indices(&mut indices, &rows, &SortState::by("k", Direction::Asc), &columns);
        assert_eq!(indices, vec![2, 0, 1]);
    }
}
