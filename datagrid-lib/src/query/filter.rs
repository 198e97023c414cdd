//! Active filter set and filter matching.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use serde::Deserialize;
use serde::Serialize;

use crate::column::FilterDescriptor;
use crate::column::FilterKind;
use crate::model::Row;
use crate::model::Value;
use crate::model::parse_datetime;

/// Suffix of the inclusive lower bound of a date range filter.
pub const RANGE_START_SUFFIX: &str = "_start";
/// Suffix of the inclusive upper bound of a date range filter.
pub const RANGE_END_SUFFIX: &str = "_end";

/// A filter value: a single string, or several for any-of matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    One(String),
    Many(Vec<String>),
}

impl FilterValue {
    /// Returns `true` if the value places no constraint.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::One(s) => s.trim().is_empty(),
            Self::Many(values) => values.iter().all(|v| v.trim().is_empty()),
        }
    }

    /// Iterates the non-empty values.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Self::One(s) => std::slice::from_ref(s),
            Self::Many(values) => values,
        };
        slice
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Returns the first non-empty value.
    pub fn first(&self) -> Option<&str> {
        self.values().next()
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::One(v.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::One(v)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(v: Vec<String>) -> Self {
        Self::Many(v)
    }
}

/// Which side of a date range a filter key bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Start,
    End,
}

/// Splits `issued_start` into `("issued", Start)`.
fn split_range_key(key: &str) -> Option<(&str, Bound)> {
    if let Some(base) = key.strip_suffix(RANGE_START_SUFFIX) {
        return Some((base, Bound::Start));
    }
    key.strip_suffix(RANGE_END_SUFFIX)
        .map(|base| (base, Bound::End))
}

/// The currently applied filters, `key -> value`.
///
/// Date ranges use the `{key}_start` / `{key}_end` convention; either bound
/// may be absent. Empty values are never stored, so an empty set always means
/// "unfiltered".
///
/// # Example
///
/// ```
/// use datagrid_lib::query::ActiveFilters;
///
/// let filters = ActiveFilters::new()
///     .with("status", "paid")
///     .with("issued_start", "2024-01-01")
///     .with("issued_end", "");
/// assert_eq!(filters.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActiveFilters {
    entries: BTreeMap<String, FilterValue>,
}

impl ActiveFilters {
    /// Creates an empty filter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a filter (builder pattern).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets a filter; an empty value removes it. Returns `true` if the set changed.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> bool {
        let key = key.into();
        let value = value.into();
        if value.is_empty() {
            return self.entries.remove(&key).is_some();
        }
        self.entries.insert(key, value.clone()) != Some(value)
    }

    /// Removes a filter. Returns `true` if it was set.
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Removes every filter.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the value for `key`.
    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.get(key)
    }

    /// Returns the number of active filters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no filter is active.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns `true` if `row` satisfies every active filter.
    ///
    /// `descriptors` choose the match semantics per key; keys without a
    /// descriptor match as text.
    pub fn matches(&self, row: &Row, descriptors: &[FilterDescriptor]) -> bool {
        self.entries.iter().all(|(key, value)| {
            if value.is_empty() {
                return true;
            }
            if let Some((base, bound)) = split_range_key(key) {
                return matches_bound(row.value(base), value, bound);
            }
            let kind = descriptors
                .iter()
                .find(|d| &d.key == key)
                .map(|d| d.kind)
                .unwrap_or_default();
            matches_value(row.value(key), value, kind)
        })
    }
}

impl<K: Into<String>, V: Into<FilterValue>> FromIterator<(K, V)> for ActiveFilters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut filters = Self::new();
        for (k, v) in iter {
            filters.set(k, v);
        }
        filters
    }
}

/// A parsed range bound. Date-only upper bounds extend to the end of the day.
fn parse_bound(raw: &str, bound: Bound) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if bound == Bound::End
        && let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    {
        let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)?;
        return Some(date.and_time(end_of_day));
    }
    parse_datetime(raw)
}

fn matches_bound(cell: &Value, value: &FilterValue, bound: Bound) -> bool {
    let Some(limit) = value.first().and_then(|raw| parse_bound(raw, bound)) else {
        // An unreadable bound constrains nothing.
        return true;
    };
    let Some(at) = cell.as_datetime() else {
        return false;
    };
    match bound {
        Bound::Start => at >= limit,
        Bound::End => at <= limit,
    }
}

fn matches_value(cell: &Value, value: &FilterValue, kind: FilterKind) -> bool {
    match kind {
        FilterKind::Text => {
            let haystack = cell.to_string().to_lowercase();
            value
                .values()
                .any(|needle| haystack.contains(&needle.to_lowercase()))
        }
        FilterKind::Select => {
            let cells: Vec<String> = match cell {
                Value::List(items) => items.iter().map(|v| v.to_string().to_lowercase()).collect(),
                other => vec![other.to_string().to_lowercase()],
            };
            value
                .values()
                .any(|wanted| cells.iter().any(|c| *c == wanted.to_lowercase()))
        }
        FilterKind::Number => {
            let actual = cell
                .as_f64()
                .or_else(|| cell.as_str().and_then(|s| s.trim().parse().ok()));
            let Some(actual) = actual else {
                return false;
            };
            value
                .values()
                .filter_map(|v| v.parse::<f64>().ok())
                .any(|wanted| wanted == actual)
        }
        FilterKind::Date | FilterKind::DateRange => {
            let Some(day) = cell.as_datetime().map(|dt| dt.date()) else {
                return false;
            };
            value
                .values()
                .filter_map(parse_datetime)
                .any(|wanted| wanted.date() == day)
        }
    }
}
