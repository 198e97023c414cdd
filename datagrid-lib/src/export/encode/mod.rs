//! Format encoders.
//!
//! Every encoder turns the same [`ExportPayload`] into bytes. Hosts can
//! replace the built-in encoder for a format through [`EncoderRegistry`].

mod csv;
mod excel;
mod html;
mod pdf;
mod word;

pub use csv::*;
pub use excel::*;
pub use html::*;
pub use pdf::*;
pub use word::*;

use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use super::ExportFormat;
use super::ExportPayload;
use crate::config::ExportOptions;
use crate::error::ExportError;

/// Encodes an export payload into one format.
///
/// Encoders run on a blocking thread and should call [`check_cancelled`]
/// between rows so an abandoned export stops early.
pub trait Encoder: Send + Sync {
    /// Returns the format this encoder produces.
    fn format(&self) -> ExportFormat;

    /// Encodes `payload`.
    fn encode(
        &self,
        payload: &ExportPayload,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, ExportError>;
}

/// Returns [`ExportError::Cancelled`] once `cancel` has fired.
pub fn check_cancelled(cancel: &CancellationToken) -> Result<(), ExportError> {
    if cancel.is_cancelled() {
        Err(ExportError::Cancelled)
    } else {
        Ok(())
    }
}

/// Returns the built-in encoder for `format`.
pub fn builtin_encoder(format: ExportFormat, options: &ExportOptions) -> Arc<dyn Encoder> {
    match format {
        ExportFormat::Csv => Arc::new(CsvEncoder::new(options.include_bom)),
        ExportFormat::Excel => Arc::new(ExcelEncoder),
        ExportFormat::Word => Arc::new(WordEncoder),
        ExportFormat::Pdf => Arc::new(PdfEncoder::default()),
        ExportFormat::Html => Arc::new(HtmlEncoder::html()),
        ExportFormat::Print => Arc::new(HtmlEncoder::print()),
    }
}

/// Encoders by format, falling back to the built-in ones.
pub struct EncoderRegistry {
    options: ExportOptions,
    overrides: DashMap<ExportFormat, Arc<dyn Encoder>>,
}

impl EncoderRegistry {
    pub fn new(options: ExportOptions) -> Self {
        Self {
            options,
            overrides: DashMap::new(),
        }
    }

    /// Options the built-in encoders and export payloads are built with.
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Replaces the encoder for its format.
    pub fn register(&self, encoder: Arc<dyn Encoder>) {
        self.overrides.insert(encoder.format(), encoder);
    }

    /// Restores the built-in encoder for `format`.
    pub fn unregister(&self, format: ExportFormat) -> bool {
        self.overrides.remove(&format).is_some()
    }

    /// Returns the encoder for `format`.
    pub fn get(&self, format: ExportFormat) -> Arc<dyn Encoder> {
        match self.overrides.get(&format) {
            Some(encoder) => Arc::clone(encoder.value()),
            None => builtin_encoder(format, &self.options),
        }
    }
}

impl Default for EncoderRegistry {
    fn default() -> Self {
        Self::new(ExportOptions::default())
    }
}

impl std::fmt::Debug for EncoderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let overridden: Vec<ExportFormat> = self.overrides.iter().map(|e| *e.key()).collect();
        f.debug_struct("EncoderRegistry")
            .field("options", &self.options)
            .field("overrides", &overridden)
            .finish()
    }
}

/// One-line summary of the export for document headers.
pub(crate) fn summary_line(payload: &ExportPayload) -> String {
    let meta = &payload.metadata;
    let mut line = format!(
        "Generated {} | {} of {} records | scope: {}",
        meta.generated_at.format("%Y-%m-%d %H:%M"),
        meta.exported_records,
        meta.total_records,
        meta.scope
    );
    if let (Some(page), Some(size)) = (meta.current_page, meta.page_size) {
        line.push_str(&format!(" | page {} ({} per page)", page, size));
    }
    if meta.scope_fallback {
        line.push_str(&format!(" | requested: {}", meta.requested_scope));
    }
    line
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Local;
    use chrono::TimeZone;

    use crate::column::Alignment;
    use crate::column::TableStyle;
    use crate::export::ExportCell;
    use crate::export::ExportMetadata;
    use crate::export::ExportPayload;
    use crate::export::ExportScope;
    use crate::model::Value;

    /// A two-column payload with `rows` rows.
    pub fn payload(rows: usize) -> ExportPayload {
        ExportPayload {
            columns: vec!["Name".into(), "Status".into()],
            column_keys: vec!["name".into(), "status".into()],
            column_alignments: vec![Alignment::Left, Alignment::Right],
            column_backgrounds: vec![None, Some("#ffeeaa".into())],
            style: TableStyle {
                show_vertical_borders: true,
                header_background_color: "#003366".into(),
            },
            rows: (1..=rows)
                .map(|i| {
                    vec![
                        ExportCell::plain(format!("Row {}", i), Value::Int(i as i64)),
                        ExportCell {
                            html: r#"<span style="background-color:#52c41a">Paid</span>"#.into(),
                            text: "Paid".into(),
                            raw: Value::from("paid"),
                            accent: Some("#52c41a".into()),
                        },
                    ]
                })
                .collect(),
            metadata: ExportMetadata {
                title: "Invoices".into(),
                generated_at: Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
                scope: ExportScope::All,
                requested_scope: ExportScope::All,
                scope_fallback: false,
                total_records: rows,
                exported_records: rows,
                current_page: None,
                page_size: None,
                degraded_cells: 0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl Encoder for Fixed {
        fn format(&self) -> ExportFormat {
            ExportFormat::Csv
        }

        fn encode(&self, _: &ExportPayload, _: &CancellationToken) -> Result<Vec<u8>, ExportError> {
            Ok(b"fixed".to_vec())
        }
    }

    #[test]
    fn test_registry_override() {
        let registry = EncoderRegistry::default();
        let payload = fixtures::payload(1);
        let cancel = CancellationToken::new();
        registry.register(Arc::new(Fixed));
        let bytes = registry.get(ExportFormat::Csv).encode(&payload, &cancel).unwrap();
        assert_eq!(bytes, b"fixed");
        assert!(registry.unregister(ExportFormat::Csv));
        assert_eq!(registry.get(ExportFormat::Csv).format(), ExportFormat::Csv);
        assert_ne!(registry.get(ExportFormat::Csv).encode(&payload, &cancel).unwrap(), b"fixed");
    }

    #[test]
    fn test_builtin_formats() {
        let options = ExportOptions::default();
        for format in ExportFormat::ALL {
            assert_eq!(builtin_encoder(format, &options).format(), format);
        }
    }

    #[test]
    fn test_cancelled_encoders_stop() {
        let options = ExportOptions::default();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let payload = fixtures::payload(3);
        for format in ExportFormat::ALL {
            let result = builtin_encoder(format, &options).encode(&payload, &cancel);
            assert!(matches!(result, Err(ExportError::Cancelled)), "{}", format);
        }
    }

    #[test]
    fn test_summary_line() {
        let mut payload = fixtures::payload(2);
        payload.metadata.scope_fallback = true;
        payload.metadata.requested_scope = crate::export::ExportScope::Selected;
        let line = summary_line(&payload);
        assert!(line.contains("2 of 2 records"));
        assert!(line.contains("requested: selected"));
    }
}
