//! Column definitions.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::cell::CellNode;
use crate::error::RenderError;
use crate::model::Row;
use crate::model::Value;

/// Horizontal alignment for column content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    /// Returns the CSS `text-align` keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column render rule: `(value, row) -> CellNode`.
pub type RenderFn = Arc<dyn Fn(&Value, &Row) -> Result<CellNode, RenderError> + Send + Sync>;

/// Column configuration.
///
/// `key` is the join key between the schema, persisted settings and row
/// lookup, so it must be unique within a table and stable across releases.
///
/// # Example
///
/// ```
/// use datagrid_lib::cell::CellNode;
/// use datagrid_lib::column::{Alignment, ColumnDef};
///
/// let columns = vec![
///     ColumnDef::new("name", "Name").sortable(),
///     ColumnDef::new("amount", "Amount").sortable().align(Alignment::Right),
///     ColumnDef::new("status", "Status").filterable().with_render(|value, _row| {
///         Ok(CellNode::badge(value.to_string(), "green"))
///     }),
/// ];
/// assert!(columns[0].searchable);
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    /// Unique, stable column key.
    pub key: String,
    /// Header text.
    pub label: String,
    /// Whether header activation cycles the sort.
    #[serde(default)]
    pub sortable: bool,
    /// Whether free-text search scans this column.
    #[serde(default = "default_true")]
    pub searchable: bool,
    /// Whether the column offers a filter.
    #[serde(default)]
    pub filterable: bool,
    /// On-screen alignment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Alignment>,
    /// Cell background color (hex).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// Hidden by user customization.
    #[serde(default)]
    pub hidden: bool,
    /// Render rule; the raw value is shown stringified when absent.
    #[serde(skip)]
    render: Option<RenderFn>,
}

fn default_true() -> bool {
    true
}

impl ColumnDef {
    /// Creates a visible, searchable column with no sort or filter.
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            sortable: false,
            searchable: true,
            filterable: false,
            align: None,
            background_color: None,
            hidden: false,
            render: None,
        }
    }

    /// Make the column sortable.
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Include or exclude the column from free-text search.
    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    /// Make the column filterable.
    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    /// Set the column alignment.
    pub fn align(mut self, align: Alignment) -> Self {
        self.align = Some(align);
        self
    }

    /// Set the cell background color.
    pub fn background(mut self, color: impl Into<String>) -> Self {
        self.background_color = Some(color.into());
        self
    }

    /// Mark the column hidden.
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Set the render rule.
    pub fn with_render<F>(mut self, render: F) -> Self
    where
        F: Fn(&Value, &Row) -> Result<CellNode, RenderError> + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(render));
        self
    }

    /// Set a shared render rule.
    pub fn with_render_fn(mut self, render: RenderFn) -> Self {
        self.render = Some(render);
        self
    }

    /// Returns `true` if the column has a render rule.
    pub fn has_render(&self) -> bool {
        self.render.is_some()
    }

    /// Renders this column's cell for `row`.
    ///
    /// Without a render rule the raw value is returned as text. Panics inside
    /// the rule are not caught here; the export pipeline isolates them.
    pub fn render(&self, row: &Row) -> Result<CellNode, RenderError> {
        let value = row.value(&self.key);
        match &self.render {
            Some(render) => render(value, row),
            None => Ok(CellNode::from(value)),
        }
    }

    /// Returns the background color when it is set and non-empty.
    pub fn background_color(&self) -> Option<&str> {
        self.background_color
            .as_deref()
            .filter(|color| !color.trim().is_empty())
    }
}

impl fmt::Debug for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("sortable", &self.sortable)
            .field("searchable", &self.searchable)
            .field("filterable", &self.filterable)
            .field("align", &self.align)
            .field("background_color", &self.background_color)
            .field("hidden", &self.hidden)
            .field("render", &self.render.is_some())
            .finish()
    }
}

/// Returns the column with `key`, if any.
pub fn find_column<'a>(columns: &'a [ColumnDef], key: &str) -> Option<&'a ColumnDef> {
    columns.iter().find(|c| c.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_defaults() {
        let col: ColumnDef = serde_json::from_str(r#"{"key": "name", "label": "Name"}"#).unwrap();
        assert!(col.searchable);
        assert!(!col.sortable);
        assert!(!col.hidden);
        assert!(!col.has_render());
    }

    #[test]
    fn test_deserialize_camel_case() {
        let col: ColumnDef = serde_json::from_str(
            r##"{"key": "a", "label": "A", "backgroundColor": "#fff", "align": "right", "searchable": false}"##,
        )
        .unwrap();
        assert_eq!(col.background_color(), Some("#fff"));
        assert_eq!(col.align, Some(Alignment::Right));
        assert!(!col.searchable);
    }

    #[test]
    fn test_render_without_rule_uses_raw_value() {
        let col = ColumnDef::new("amount", "Amount");
        let row = Row::new().set("amount", 12.5);
        assert_eq!(col.render(&row).unwrap(), CellNode::text("12.5"));
    }

    #[test]
    fn test_render_with_rule() {
        let col = ColumnDef::new("status", "Status")
            .with_render(|value, _| Ok(CellNode::badge(value.to_string(), "blue")));
        let row = Row::new().set("status", "open");
        assert_eq!(col.render(&row).unwrap(), CellNode::badge("open", "blue"));
    }

    #[test]
    fn test_empty_background_is_none() {
        let col = ColumnDef::new("a", "A").background("  ");
        assert_eq!(col.background_color(), None);
    }
}
