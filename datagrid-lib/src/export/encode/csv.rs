//! CSV encoder.

use ::csv::Writer;
use tokio_util::sync::CancellationToken;

use super::Encoder;
use super::check_cancelled;
use crate::error::ExportError;
use crate::export::ExportFormat;
use crate::export::ExportPayload;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// RFC 4180 CSV of the plain-text lowering.
#[derive(Debug, Clone, Copy)]
pub struct CsvEncoder {
    include_bom: bool,
}

impl CsvEncoder {
    pub fn new(include_bom: bool) -> Self {
        Self { include_bom }
    }
}

impl Default for CsvEncoder {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Encoder for CsvEncoder {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }

    fn encode(
        &self,
        payload: &ExportPayload,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, ExportError> {
        let buffer = if self.include_bom {
            BOM.to_vec()
        } else {
            Vec::new()
        };
        let mut writer = Writer::from_writer(buffer);
        writer.write_record(&payload.columns)?;
        for row in &payload.rows {
            check_cancelled(cancel)?;
            writer.write_record(row.iter().map(|cell| cell.text.as_str()))?;
        }
        writer.flush()?;
        writer
            .into_inner()
            .map_err(|e| ExportError::Io(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::encode::fixtures;

    #[test]
    fn test_csv_text_lowering() {
        let bytes = CsvEncoder::new(false)
            .encode(&fixtures::payload(2), &CancellationToken::new())
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "Name,Status\nRow 1,Paid\nRow 2,Paid\n");
    }

    #[test]
    fn test_csv_bom_and_quoting() {
        let mut payload = fixtures::payload(1);
        payload.rows[0][0].text = "Smith, \"Jr\"".into();
        let bytes = CsvEncoder::default()
            .encode(&payload, &CancellationToken::new())
            .unwrap();
        assert!(bytes.starts_with(BOM));
        let text = String::from_utf8(bytes[BOM.len()..].to_vec()).unwrap();
        assert!(text.contains("\"Smith, \"\"Jr\"\"\",Paid"));
    }
}
