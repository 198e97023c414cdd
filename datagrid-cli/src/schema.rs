//! Row and column files.
//!
//! Rows are a JSON array of objects. Columns are a JSON array of column
//! definitions, or an object `{"columns": [...], "filters": [...]}` that also
//! carries filter descriptors. A column may declare a `render` rule:
//!
//! ```json
//! {"key": "status", "label": "Status",
//!  "render": {"type": "badge", "colors": {"paid": "green", "late": "red"}}}
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use chrono::format::StrftimeItems;
use datagrid_lib::cell::CellNode;
use datagrid_lib::column::ColumnDef;
use datagrid_lib::column::FilterDescriptor;
use datagrid_lib::column::RenderFn;
use datagrid_lib::error::RenderError;
use datagrid_lib::model::Row;
use datagrid_lib::model::Value;
use serde::Deserialize;

/// A declarative render rule.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderRule {
    /// Value as a badge, colored by value.
    Badge {
        #[serde(default)]
        colors: HashMap<String, String>,
        #[serde(default = "default_badge_color")]
        default: String,
    },
    /// Fixed-point number with optional prefix and suffix.
    Number {
        #[serde(default)]
        decimals: usize,
        #[serde(default)]
        prefix: String,
        #[serde(default)]
        suffix: String,
    },
    /// Date or timestamp reformatted with a strftime pattern.
    Date { format: String },
    /// Text with `{field}` placeholders filled from the row.
    Template { template: String },
    /// Value as an image URL, alt text from another field.
    Image {
        #[serde(default)]
        alt_field: Option<String>,
    },
    /// Several rules over the same value, shown side by side.
    Group { rules: Vec<RenderRule> },
}

fn default_badge_color() -> String {
    "gray".to_string()
}

impl RenderRule {
    /// Checks patterns that can only fail at render time.
    fn validate(&self) -> Result<(), String> {
        match self {
            RenderRule::Date { format } => {
                if StrftimeItems::new(format).any(|item| matches!(item, chrono::format::Item::Error)) {
                    return Err(format!("invalid date format '{}'", format));
                }
                Ok(())
            }
            RenderRule::Group { rules } => rules.iter().try_for_each(RenderRule::validate),
            _ => Ok(()),
        }
    }

    /// Renders `value` of column `key`.
    pub fn render(&self, key: &str, value: &Value, row: &Row) -> Result<CellNode, RenderError> {
        match self {
            RenderRule::Badge { colors, default } => {
                if value.is_null() {
                    return Ok(CellNode::text(""));
                }
                let text = value.to_string();
                let color = colors.get(&text).unwrap_or(default);
                Ok(CellNode::badge(text, color.clone()))
            }
            RenderRule::Number {
                decimals,
                prefix,
                suffix,
            } => {
                if value.is_null() {
                    return Ok(CellNode::text(""));
                }
                let number = value
                    .as_f64()
                    .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
                    .ok_or_else(|| RenderError::new(key, format!("'{}' is not a number", value)))?;
                Ok(CellNode::text(format!(
                    "{}{:.*}{}",
                    prefix, decimals, number, suffix
                )))
            }
            RenderRule::Date { format } => {
                if value.is_null() {
                    return Ok(CellNode::text(""));
                }
                let at = value
                    .as_datetime()
                    .ok_or_else(|| RenderError::new(key, format!("'{}' is not a date", value)))?;
                Ok(CellNode::text(at.format(format).to_string()))
            }
            RenderRule::Template { template } => Ok(CellNode::text(fill_template(template, row))),
            RenderRule::Image { alt_field } => {
                let Some(src) = value.as_str().filter(|s| !s.is_empty()) else {
                    return Ok(CellNode::text(""));
                };
                let alt = alt_field
                    .as_deref()
                    .map(|field| row.value(field).to_string())
                    .filter(|alt| !alt.is_empty());
                Ok(CellNode::image(src, alt))
            }
            RenderRule::Group { rules } => rules
                .iter()
                .map(|rule| rule.render(key, value, row))
                .collect::<Result<Vec<_>, _>>()
                .map(CellNode::Group),
        }
    }
}

/// Replaces each `{field}` in `template` with the row's value.
fn fill_template(template: &str, row: &Row) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                out.push_str(&row.value(&after[..close]).to_string());
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[derive(Deserialize)]
struct ColumnSpec {
    #[serde(flatten)]
    column: ColumnDef,
    #[serde(default)]
    render: Option<RenderRule>,
}

impl ColumnSpec {
    fn into_column(self) -> Result<ColumnDef> {
        let Some(rule) = self.render else {
            return Ok(self.column);
        };
        rule.validate()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("column '{}'", self.column.key))?;
        let key = self.column.key.clone();
        let render: RenderFn = Arc::new(move |value, row| rule.render(&key, value, row));
        Ok(self.column.with_render_fn(render))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SchemaFile {
    Full {
        columns: Vec<ColumnSpec>,
        #[serde(default)]
        filters: Vec<FilterDescriptor>,
    },
    Columns(Vec<ColumnSpec>),
}

/// Columns and filter descriptors of one table.
#[derive(Debug)]
pub struct Schema {
    pub columns: Vec<ColumnDef>,
    pub filters: Vec<FilterDescriptor>,
}

impl Schema {
    pub fn parse(json: &str) -> Result<Self> {
        let file: SchemaFile = serde_json::from_str(json).context("invalid column file")?;
        let (specs, filters) = match file {
            SchemaFile::Full { columns, filters } => (columns, filters),
            SchemaFile::Columns(columns) => (columns, Vec::new()),
        };
        let columns = specs
            .into_iter()
            .map(ColumnSpec::into_column)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { columns, filters })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("cannot read column file {}", path.display()))?;
        Self::parse(&json).with_context(|| format!("in {}", path.display()))
    }
}

/// Reads a JSON array of row objects.
pub fn load_rows(path: &Path) -> Result<Vec<Row>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("cannot read row file {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("invalid row file {}", path.display()))
}
