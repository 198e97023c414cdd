//! Word encoder.
//!
//! Word opens an HTML document saved with the `.doc` extension when it
//! declares the Office namespaces, keeping badges, colors and images.

use std::fmt::Write as _;

use tokio_util::sync::CancellationToken;

use super::Encoder;
use super::html::write_table;
use crate::error::ExportError;
use crate::export::ExportFormat;
use crate::export::ExportPayload;
use crate::export::escape_html;

const WORD_CSS: &str = "\
@page Section1 { size: 841.9pt 595.3pt; mso-page-orientation: landscape; margin: 36pt; }
div.Section1 { page: Section1; }
body { font-family: Calibri, Arial, sans-serif; font-size: 10pt; }
h1 { font-size: 14pt; }
.meta, .warning { color: #666; }
table { border-collapse: collapse; width: 100%; }
th, td { padding: 4pt; border: 0.5pt solid #bfbfbf; }
";

#[derive(Debug, Clone, Copy, Default)]
pub struct WordEncoder;

impl Encoder for WordEncoder {
    fn format(&self) -> ExportFormat {
        ExportFormat::Word
    }

    fn encode(
        &self,
        payload: &ExportPayload,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, ExportError> {
        let mut out = String::from(concat!(
            "<html xmlns:o=\"urn:schemas-microsoft-com:office:office\" ",
            "xmlns:w=\"urn:schemas-microsoft-com:office:word\" ",
            "xmlns=\"http://www.w3.org/TR/REC-html40\">\n<head>\n",
            "<meta charset=\"utf-8\">\n",
            "<!--[if gte mso 9]><xml><w:WordDocument><w:View>Print</w:View></w:WordDocument></xml><![endif]-->\n"
        ));
        let _ = writeln!(out, "<title>{}</title>", escape_html(&payload.metadata.title));
        let _ = writeln!(out, "<style>\n{}</style>\n</head>\n<body>\n<div class=\"Section1\">", WORD_CSS);
        write_table(&mut out, payload, cancel)?;
        out.push_str("</div>\n</body>\n</html>\n");
        Ok(out.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::encode::fixtures;

    #[test]
    fn test_word_document() {
        let bytes = WordEncoder
            .encode(&fixtures::payload(2), &CancellationToken::new())
            .unwrap();
        let doc = String::from_utf8(bytes).unwrap();
        assert!(doc.contains("urn:schemas-microsoft-com:office:word"));
        assert!(doc.contains("mso-page-orientation: landscape"));
        assert!(doc.contains("background-color:#52c41a"));
        assert_eq!(doc.matches("<tr>").count(), 3);
    }
}
