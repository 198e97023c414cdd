//! Excel encoder (SpreadsheetML 2003).
//!
//! Excel, LibreOffice and Numbers open the XML workbook directly, so no zip
//! container is needed. Cells carry the plain-text lowering; numeric raw
//! values that were not reformatted by a render rule are written as numbers.

use std::fmt::Write as _;

use tokio_util::sync::CancellationToken;

use super::Encoder;
use super::check_cancelled;
use crate::column::Alignment;
use crate::error::ExportError;
use crate::export::ExportCell;
use crate::export::ExportFormat;
use crate::export::ExportPayload;
use crate::export::escape_html;
use crate::model::Value;

const MAX_SHEET_NAME: usize = 31;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExcelEncoder;

fn sheet_name(title: &str) -> String {
    let name: String = title
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(MAX_SHEET_NAME)
        .collect();
    if name.trim().is_empty() {
        "Export".to_string()
    } else {
        name
    }
}

fn style_id(align: Alignment) -> &'static str {
    match align {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
    }
}

/// Escapes `s` for XML text and attributes, dropping characters XML 1.0
/// cannot carry (control characters other than tab, newline and carriage
/// return, and the U+FFFE/U+FFFF noncharacters).
fn xml_text(s: &str) -> String {
    let allowed = |c: char| {
        !matches!(c, '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}')
    };
    if s.chars().all(allowed) {
        return escape_html(s);
    }
    escape_html(&s.chars().filter(|&c| allowed(c)).collect::<String>())
}

/// Returns the cell's number when its text is the untouched raw number.
/// NaN and infinities are not numbers to a spreadsheet and stay text.
fn numeric(cell: &ExportCell) -> Option<String> {
    let finite = match cell.raw {
        Value::Int(_) => true,
        Value::Float(f) => f.is_finite(),
        _ => false,
    };
    (finite && cell.raw.to_string() == cell.text).then(|| cell.text.clone())
}

impl Encoder for ExcelEncoder {
    fn format(&self) -> ExportFormat {
        ExportFormat::Excel
    }

    fn encode(
        &self,
        payload: &ExportPayload,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, ExportError> {
        let header_fill = payload
            .style
            .header_background()
            .map(|color| {
                format!(
                    r#"<Interior ss:Color="{}" ss:Pattern="Solid"/><Font ss:Bold="1" ss:Color="{}"/>"#,
                    xml_text(color),
                    payload.style.header_text_color().unwrap_or("#000000")
                )
            })
            .unwrap_or_else(|| r#"<Font ss:Bold="1"/>"#.to_string());

        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<?mso-application progid=\"Excel.Sheet\"?>\n");
        xml.push_str(concat!(
            r#"<Workbook xmlns="urn:schemas-microsoft-com:office:spreadsheet" "#,
            r#"xmlns:o="urn:schemas-microsoft-com:office:office" "#,
            r#"xmlns:x="urn:schemas-microsoft-com:office:excel" "#,
            r#"xmlns:ss="urn:schemas-microsoft-com:office:spreadsheet">"#,
            "\n"
        ));
        // Infallible: writing into a String.
        let _ = write!(
            xml,
            "<DocumentProperties xmlns=\"urn:schemas-microsoft-com:office:office\"><Title>{}</Title></DocumentProperties>\n",
            xml_text(&payload.metadata.title)
        );
        xml.push_str("<Styles>\n");
        let _ = writeln!(xml, r#"<Style ss:ID="header">{}</Style>"#, header_fill);
        for align in [Alignment::Left, Alignment::Center, Alignment::Right] {
            let _ = writeln!(
                xml,
                r#"<Style ss:ID="{}"><Alignment ss:Horizontal="{}"/></Style>"#,
                style_id(align),
                match align {
                    Alignment::Left => "Left",
                    Alignment::Center => "Center",
                    Alignment::Right => "Right",
                }
            );
        }
        xml.push_str("</Styles>\n");

        let _ = writeln!(
            xml,
            r#"<Worksheet ss:Name="{}"><Table>"#,
            xml_text(&sheet_name(&payload.metadata.title))
        );
        xml.push_str("<Row>");
        for label in &payload.columns {
            let _ = write!(
                xml,
                r#"<Cell ss:StyleID="header"><Data ss:Type="String">{}</Data></Cell>"#,
                xml_text(label)
            );
        }
        xml.push_str("</Row>\n");

        for row in &payload.rows {
            check_cancelled(cancel)?;
            xml.push_str("<Row>");
            for (i, cell) in row.iter().enumerate() {
                let (kind, data) = match numeric(cell) {
                    Some(number) => ("Number", number),
                    None => ("String", xml_text(&cell.text)),
                };
                let _ = write!(
                    xml,
                    r#"<Cell ss:StyleID="{}"><Data ss:Type="{}">{}</Data></Cell>"#,
                    style_id(payload.alignment(i)),
                    kind,
                    data
                );
            }
            xml.push_str("</Row>\n");
        }
        xml.push_str("</Table></Worksheet>\n</Workbook>\n");
        Ok(xml.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::encode::fixtures;

    fn encode(payload: &ExportPayload) -> String {
        let bytes = ExcelEncoder.encode(payload, &CancellationToken::new()).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_workbook_structure() {
        let xml = encode(&fixtures::payload(2));
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(r#"<Worksheet ss:Name="Invoices">"#));
        assert_eq!(xml.matches("<Row>").count(), 3);
        assert!(xml.contains(r##"ss:Color="#003366""##));
        assert!(xml.contains(r#"<Cell ss:StyleID="right"><Data ss:Type="String">Paid</Data>"#));
    }

    #[test]
    fn test_numbers_and_escaping() {
        let mut payload = fixtures::payload(1);
        payload.rows[0][0] = ExportCell::plain("42", Value::Int(42));
        payload.rows[0][1].text = "A & B".into();
        let xml = encode(&payload);
        assert!(xml.contains(r#"<Data ss:Type="Number">42</Data>"#));
        assert!(xml.contains("A &amp; B"));
    }

    #[test]
    fn test_sheet_name() {
        assert_eq!(sheet_name("Q1/Q2 [draft]"), "Q1Q2 draft");
        assert_eq!(sheet_name("???"), "Export");
        assert_eq!(sheet_name(&"x".repeat(40)).len(), 31);
    }

    #[test]
    fn test_non_finite_floats_are_text() {
        let mut payload = fixtures::payload(1);
        payload.rows[0][0] = ExportCell::plain("NaN", Value::Float(f64::NAN));
        payload.rows[0][1] = ExportCell::plain("inf", Value::Float(f64::INFINITY));
        let xml = encode(&payload);
        assert!(xml.contains(r#"<Data ss:Type="String">NaN</Data>"#));
        assert!(xml.contains(r#"<Data ss:Type="String">inf</Data>"#));
        assert!(!xml.contains(r#"<Data ss:Type="Number">NaN"#));
        assert!(!xml.contains(r#"<Data ss:Type="Number">inf"#));
    }

    #[test]
    fn test_control_characters_dropped() {
        let mut payload = fixtures::payload(1);
        payload.metadata.title = "Q\u{1}3".into();
        payload.rows[0][1].text = "a\u{0}b\u{1b}c\td\ne".into();
        let xml = encode(&payload);
        assert!(xml.contains("abc\td\ne"));
        assert!(xml.contains("<Title>Q3</Title>"));
        assert!(!xml.chars().any(|c| c.is_control() && !matches!(c, '\t' | '\n' | '\r')));
    }
}
