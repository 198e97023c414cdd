//! The format-independent export snapshot.

use chrono::DateTime;
use chrono::Local;
use serde::Serialize;

use super::ExportScope;
use crate::column::Alignment;
use crate::column::TableStyle;
use crate::model::Value;

/// One exported cell in every representation an encoder may need.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportCell {
    /// Escaped markup lowering.
    pub html: String,
    /// Plain-text lowering.
    pub text: String,
    /// The row's raw value for the column.
    pub raw: Value,
    /// Palette color of the cell's first badge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
}

impl ExportCell {
    /// Creates a cell whose markup is the escaped text.
    pub fn plain(text: impl Into<String>, raw: Value) -> Self {
        let text = text.into();
        Self {
            html: super::escape_html(&text),
            text,
            raw,
            accent: None,
        }
    }
}

/// Describes an export run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub title: String,
    pub generated_at: DateTime<Local>,
    /// Scope the rows were taken from.
    pub scope: ExportScope,
    /// Scope the caller asked for. Differs from `scope` only on fallback.
    pub requested_scope: ExportScope,
    /// `true` when `selected` was requested without selection tracking and the
    /// current page was exported instead.
    pub scope_fallback: bool,
    /// Rows in the filtered set.
    pub total_records: usize,
    /// Rows in this export.
    pub exported_records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
    /// Cells whose render rule failed and that show the raw value instead.
    pub degraded_cells: usize,
}

/// Immutable snapshot handed to every encoder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    /// Column labels.
    pub columns: Vec<String>,
    pub column_keys: Vec<String>,
    pub column_alignments: Vec<Alignment>,
    pub column_backgrounds: Vec<Option<String>>,
    pub style: TableStyle,
    /// Row-major cells, one per exported column.
    pub rows: Vec<Vec<ExportCell>>,
    pub metadata: ExportMetadata,
}

impl ExportPayload {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the alignment of column `index`, left when out of range.
    pub fn alignment(&self, index: usize) -> Alignment {
        self.column_alignments.get(index).copied().unwrap_or_default()
    }

    /// Returns the background color of column `index`, if set.
    pub fn background(&self, index: usize) -> Option<&str> {
        self.column_backgrounds.get(index).and_then(|c| c.as_deref())
    }
}
