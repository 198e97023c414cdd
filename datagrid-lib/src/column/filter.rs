//! Filter descriptors.

use serde::Deserialize;
use serde::Serialize;

/// How a filter value is matched against a row value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    /// Case-insensitive substring.
    #[default]
    Text,
    /// Case-insensitive equality, any-of for list values.
    Select,
    /// Same calendar day.
    Date,
    /// Inclusive range through `{key}_start` / `{key}_end`.
    DateRange,
    /// Numeric equality.
    Number,
}

/// A selectable filter option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

impl FilterOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Describes one filter offered for a table.
///
/// # Example
///
/// ```
/// use datagrid_lib::column::{FilterDescriptor, FilterKind, FilterOption};
///
/// let status = FilterDescriptor::new("status", "Status", FilterKind::Select)
///     .with_option(FilterOption::new("paid", "Paid"))
///     .with_option(FilterOption::new("late", "Late"));
/// let issued = FilterDescriptor::new("issued", "Issued", FilterKind::DateRange);
/// assert_eq!(issued.range_keys(), Some(("issued_start".into(), "issued_end".into())));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDescriptor {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FilterKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FilterOption>,
}

impl FilterDescriptor {
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: FilterKind) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind,
            options: Vec::new(),
        }
    }

    /// Adds a selectable option.
    pub fn with_option(mut self, option: FilterOption) -> Self {
        self.options.push(option);
        self
    }

    /// Returns the `(start, end)` filter keys for a date range descriptor.
    pub fn range_keys(&self) -> Option<(String, String)> {
        match self.kind {
            FilterKind::DateRange => Some((
                format!("{}{}", self.key, crate::query::RANGE_START_SUFFIX),
                format!("{}{}", self.key, crate::query::RANGE_END_SUFFIX),
            )),
            _ => None,
        }
    }
}
