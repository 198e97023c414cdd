//! HTML and print encoders.

use std::fmt::Write as _;

use tokio_util::sync::CancellationToken;

use super::Encoder;
use super::check_cancelled;
use super::summary_line;
use crate::error::ExportError;
use crate::export::ExportFormat;
use crate::export::ExportPayload;
use crate::export::escape_html;

const BASE_CSS: &str = "\
body { font-family: Arial, Helvetica, sans-serif; font-size: 12px; color: #222; margin: 24px; }
h1 { font-size: 18px; margin: 0 0 4px 0; }
.meta { color: #666; margin-bottom: 12px; }
.warning { color: #ad6800; margin-bottom: 12px; }
table { border-collapse: collapse; width: 100%; }
th, td { padding: 6px 8px; border-bottom: 1px solid #e8e8e8; }
th { font-weight: bold; background: #fafafa; }
";

const VERTICAL_BORDERS_CSS: &str = "th, td { border-left: 1px solid #e8e8e8; border-right: 1px solid #e8e8e8; }\n";

const PRINT_CSS: &str = "\
@page { size: landscape; margin: 12mm; }
@media print {
  body { margin: 0; }
  thead { display: table-header-group; }
  tr { page-break-inside: avoid; }
}
";

const PRINT_SCRIPT: &str = "<script>window.addEventListener('load', function () { window.print(); });</script>\n";

/// Writes the title, summary and `<table>` of `payload` as HTML.
///
/// Shared by the HTML, print and Word encoders.
pub(crate) fn write_table(
    out: &mut String,
    payload: &ExportPayload,
    cancel: &CancellationToken,
) -> Result<(), ExportError> {
    let meta = &payload.metadata;
    let _ = writeln!(out, "<h1>{}</h1>", escape_html(&meta.title));
    let _ = writeln!(out, "<div class=\"meta\">{}</div>", escape_html(&summary_line(payload)));
    if meta.scope_fallback {
        let _ = writeln!(
            out,
            "<div class=\"warning\">Requested scope '{}' was unavailable; exported {} instead.</div>",
            meta.requested_scope, meta.scope
        );
    }
    if meta.degraded_cells > 0 {
        let _ = writeln!(
            out,
            "<div class=\"warning\">{} cell(s) could not be rendered and show their raw value.</div>",
            meta.degraded_cells
        );
    }

    let header_style = match (
        payload.style.header_background(),
        payload.style.header_text_color(),
    ) {
        (Some(bg), Some(fg)) => format!(" style=\"background-color:{};color:{}\"", escape_html(bg), fg),
        _ => String::new(),
    };

    out.push_str("<table>\n<thead><tr>");
    for (i, label) in payload.columns.iter().enumerate() {
        let _ = write!(
            out,
            "<th align=\"{}\"{}>{}</th>",
            payload.alignment(i),
            header_style,
            escape_html(label)
        );
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for row in &payload.rows {
        check_cancelled(cancel)?;
        out.push_str("<tr>");
        for (i, cell) in row.iter().enumerate() {
            let background = payload
                .background(i)
                .map(|bg| format!(" style=\"background-color:{}\"", escape_html(bg)))
                .unwrap_or_default();
            let _ = write!(
                out,
                "<td align=\"{}\"{}>{}</td>",
                payload.alignment(i),
                background,
                cell.html
            );
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
    Ok(())
}

/// Standalone HTML document; with `print`, it opens the print dialog on load.
#[derive(Debug, Clone, Copy)]
pub struct HtmlEncoder {
    print: bool,
}

impl HtmlEncoder {
    pub fn html() -> Self {
        Self { print: false }
    }

    pub fn print() -> Self {
        Self { print: true }
    }
}

impl Encoder for HtmlEncoder {
    fn format(&self) -> ExportFormat {
        if self.print {
            ExportFormat::Print
        } else {
            ExportFormat::Html
        }
    }

    fn encode(
        &self,
        payload: &ExportPayload,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, ExportError> {
        let mut out = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        let _ = writeln!(out, "<title>{}</title>", escape_html(&payload.metadata.title));
        out.push_str("<style>\n");
        out.push_str(BASE_CSS);
        if payload.style.show_vertical_borders {
            out.push_str(VERTICAL_BORDERS_CSS);
        }
        if self.print {
            out.push_str(PRINT_CSS);
        }
        out.push_str("</style>\n</head>\n<body>\n");
        write_table(&mut out, payload, cancel)?;
        if self.print {
            out.push_str(PRINT_SCRIPT);
        }
        out.push_str("</body>\n</html>\n");
        Ok(out.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportScope;
    use crate::export::encode::fixtures;

    fn encode(encoder: HtmlEncoder, payload: &ExportPayload) -> String {
        String::from_utf8(encoder.encode(payload, &CancellationToken::new()).unwrap()).unwrap()
    }

    #[test]
    fn test_html_document() {
        let html = encode(HtmlEncoder::html(), &fixtures::payload(2));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Invoices</title>"));
        assert!(html.contains("background-color:#003366;color:#ffffff"));
        assert!(html.contains("border-left"));
        assert!(html.contains("<td align=\"right\" style=\"background-color:#ffeeaa\">"));
        assert!(html.contains("<td align=\"left\">Row 2</td>"));
        assert!(!html.contains("window.print"));
    }

    #[test]
    fn test_print_document() {
        let html = encode(HtmlEncoder::print(), &fixtures::payload(1));
        assert!(html.contains("@page"));
        assert!(html.contains("window.print()"));
    }

    #[test]
    fn test_fallback_notice() {
        let mut payload = fixtures::payload(1);
        payload.metadata.requested_scope = ExportScope::Selected;
        payload.metadata.scope = ExportScope::CurrentPage;
        payload.metadata.scope_fallback = true;
        let html = encode(HtmlEncoder::html(), &payload);
        assert!(html.contains("Requested scope 'selected' was unavailable"));
    }
}
