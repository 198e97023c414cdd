//! PDF encoder.
//!
//! Writes a minimal PDF 1.4 document by hand: landscape A4 pages, the
//! standard Helvetica fonts in WinAnsi encoding, and one content stream per
//! page. The table header repeats on every page. Text widths are estimated
//! from an average glyph width, which is enough for alignment and truncation
//! but not for exact kerning.

use std::fmt::Write as _;

use tokio_util::sync::CancellationToken;

use super::Encoder;
use super::check_cancelled;
use super::summary_line;
use crate::column::Alignment;
use crate::contrast::Rgb;
use crate::error::ExportError;
use crate::export::ExportCell;
use crate::export::ExportFormat;
use crate::export::ExportPayload;

const PAGE_WIDTH: f32 = 841.89;
const PAGE_HEIGHT: f32 = 595.28;
const MARGIN: f32 = 36.0;
const TITLE_SIZE: f32 = 14.0;
const CELL_PADDING: f32 = 4.0;
const FOOTER_HEIGHT: f32 = 16.0;
/// Average Helvetica glyph width, as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;
const MIN_COLUMN_WEIGHT: usize = 4;
const MAX_COLUMN_WEIGHT: usize = 40;

/// Landscape A4 PDF of the plain-text lowering, badges drawn in color.
#[derive(Debug, Clone, Copy)]
pub struct PdfEncoder {
    font_size: f32,
}

impl PdfEncoder {
    pub fn new(font_size: f32) -> Self {
        Self {
            font_size: font_size.clamp(5.0, 16.0),
        }
    }

    fn row_height(&self) -> f32 {
        self.font_size * 1.8
    }

    fn text_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.font_size * AVG_GLYPH_WIDTH
    }

    /// Cuts `text` to fit `width`, ending in `...` when shortened.
    fn fit(&self, text: &str, width: f32) -> String {
        let max = (width / (self.font_size * AVG_GLYPH_WIDTH)).floor().max(0.0) as usize;
        let count = text.chars().count();
        if count <= max {
            text.to_string()
        } else if max > 3 {
            let mut cut: String = text.chars().take(max - 3).collect();
            cut.push_str("...");
            cut
        } else {
            text.chars().take(max).collect()
        }
    }
}

impl Default for PdfEncoder {
    fn default() -> Self {
        Self::new(9.0)
    }
}

/// Escapes `text` as the body of a PDF literal string in WinAnsi encoding.
///
/// Characters outside WinAnsi become `?`.
fn pdf_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            '\u{a0}'..='\u{ff}' => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            '€' => out.push_str("\\200"),
            '‘' => out.push_str("\\221"),
            '’' => out.push_str("\\222"),
            '“' => out.push_str("\\223"),
            '”' => out.push_str("\\224"),
            '•' => out.push_str("\\225"),
            '–' => out.push_str("\\226"),
            '—' => out.push_str("\\227"),
            '\t' | '\n' | '\r' => out.push(' '),
            _ => out.push('?'),
        }
    }
    out
}

fn fill_color(hex: &str) -> Option<String> {
    Rgb::from_hex(hex).map(|c| {
        format!(
            "{:.3} {:.3} {:.3} rg",
            c.r as f32 / 255.0,
            c.g as f32 / 255.0,
            c.b as f32 / 255.0
        )
    })
}

/// Horizontal layout of the table.
struct Columns {
    lefts: Vec<f32>,
    widths: Vec<f32>,
}

impl Columns {
    /// Splits the usable width in proportion to each column's longest text.
    fn measure(payload: &ExportPayload) -> Self {
        let usable = PAGE_WIDTH - 2.0 * MARGIN;
        let weights: Vec<usize> = payload
            .columns
            .iter()
            .enumerate()
            .map(|(i, label)| {
                payload
                    .rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.text.chars().count())
                    .chain(std::iter::once(label.chars().count()))
                    .max()
                    .unwrap_or(0)
                    .clamp(MIN_COLUMN_WEIGHT, MAX_COLUMN_WEIGHT)
            })
            .collect();
        let total = weights.iter().sum::<usize>().max(1) as f32;
        let widths: Vec<f32> = weights.iter().map(|w| usable * *w as f32 / total).collect();
        let mut lefts = Vec::with_capacity(widths.len());
        let mut x = MARGIN;
        for width in &widths {
            lefts.push(x);
            x += width;
        }
        Self { lefts, widths }
    }
}

/// One page's content stream under construction.
struct Page<'a> {
    encoder: &'a PdfEncoder,
    columns: &'a Columns,
    ops: String,
}

impl Page<'_> {
    fn text(&mut self, font: &str, size: f32, x: f32, y: f32, text: &str) {
        let _ = writeln!(
            self.ops,
            "BT /{} {:.1} Tf {:.2} {:.2} Td ({}) Tj ET",
            font,
            size,
            x,
            y,
            pdf_string(text)
        );
    }

    fn rect(&mut self, color: &str, x: f32, y: f32, width: f32, height: f32) {
        let _ = writeln!(self.ops, "{} {:.2} {:.2} {:.2} {:.2} re f 0 g", color, x, y, width, height);
    }

    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        let _ = writeln!(
            self.ops,
            "0.8 G 0.5 w {:.2} {:.2} m {:.2} {:.2} l S",
            x1, y1, x2, y2
        );
    }

    /// Draws `text` in column `index` of the row whose top edge is `top`.
    fn cell(&mut self, font: &str, index: usize, top: f32, text: &str, align: Alignment) {
        let left = self.columns.lefts[index];
        let width = self.columns.widths[index];
        let fitted = self.encoder.fit(text, width - 2.0 * CELL_PADDING);
        let text_width = self.encoder.text_width(&fitted);
        let x = match align {
            Alignment::Left => left + CELL_PADDING,
            Alignment::Center => left + (width - text_width) / 2.0,
            Alignment::Right => left + width - CELL_PADDING - text_width,
        };
        let row_height = self.encoder.row_height();
        let y = top - row_height + (row_height - self.encoder.font_size) / 2.0 + 1.5;
        let size = self.encoder.font_size;
        self.text(font, size, x, y, &fitted);
    }

    fn header(&mut self, payload: &ExportPayload, top: f32) {
        let row_height = self.encoder.row_height();
        if let Some(color) = payload.style.header_background().and_then(fill_color) {
            self.rect(&color, MARGIN, top - row_height, PAGE_WIDTH - 2.0 * MARGIN, row_height);
        }
        let text_color = payload
            .style
            .header_background()
            .and_then(|_| payload.style.header_text_color())
            .and_then(fill_color);
        if let Some(color) = &text_color {
            let _ = writeln!(self.ops, "{}", color);
        }
        for (i, label) in payload.columns.iter().enumerate() {
            self.cell("F2", i, top, label, payload.alignment(i));
        }
        if text_color.is_some() {
            self.ops.push_str("0 g\n");
        }
        self.line(MARGIN, top - row_height, PAGE_WIDTH - MARGIN, top - row_height);
    }
}

impl Encoder for PdfEncoder {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn encode(
        &self,
        payload: &ExportPayload,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, ExportError> {
        let columns = Columns::measure(payload);
        let row_height = self.row_height();
        let bottom = MARGIN + FOOTER_HEIGHT;
        let first_top = PAGE_HEIGHT - MARGIN - TITLE_SIZE - 2.0 * row_height;
        let other_top = PAGE_HEIGHT - MARGIN;
        let capacity = |top: f32| (((top - row_height - bottom) / row_height).floor() as usize).max(1);

        // Split rows into pages.
        let mut chunks: Vec<(f32, &[Vec<ExportCell>])> = Vec::new();
        let mut rest = payload.rows.as_slice();
        let mut top = first_top;
        loop {
            let take = capacity(top).min(rest.len());
            let (page, tail) = rest.split_at(take);
            chunks.push((top, page));
            rest = tail;
            top = other_top;
            if rest.is_empty() {
                break;
            }
        }

        let page_count = chunks.len();
        let mut streams = Vec::with_capacity(page_count);
        for (number, (top, rows)) in chunks.into_iter().enumerate() {
            let mut page = Page {
                encoder: self,
                columns: &columns,
                ops: String::new(),
            };
            if number == 0 {
                page.text("F2", TITLE_SIZE, MARGIN, PAGE_HEIGHT - MARGIN - TITLE_SIZE, &payload.metadata.title);
                page.text("F1", self.font_size, MARGIN, PAGE_HEIGHT - MARGIN - TITLE_SIZE - row_height, &summary_line(payload));
            }
            page.header(payload, top);

            let mut y = top - row_height;
            for row in rows {
                check_cancelled(cancel)?;
                for (i, cell) in row.iter().enumerate().take(columns.widths.len()) {
                    if let Some(color) = payload.background(i).and_then(fill_color) {
                        page.rect(&color, columns.lefts[i], y - row_height, columns.widths[i], row_height);
                    }
                    let accent = cell.accent.as_deref().and_then(fill_color);
                    if let Some(color) = &accent {
                        let _ = writeln!(page.ops, "{}", color);
                    }
                    page.cell("F1", i, y, &cell.text, payload.alignment(i));
                    if accent.is_some() {
                        page.ops.push_str("0 g\n");
                    }
                }
                page.line(MARGIN, y - row_height, PAGE_WIDTH - MARGIN, y - row_height);
                y -= row_height;
            }

            if payload.style.show_vertical_borders {
                for x in columns.lefts.iter().copied().chain(std::iter::once(PAGE_WIDTH - MARGIN)) {
                    page.line(x, top, x, y);
                }
            }

            let footer = format!("Page {} of {}", number + 1, page_count);
            let footer_x = PAGE_WIDTH - MARGIN - self.text_width(&footer);
            page.text("F1", self.font_size, footer_x, MARGIN, &footer);
            streams.push(page.ops);
        }

        Ok(assemble(&streams))
    }
}

/// Serializes the object graph with a cross-reference table.
///
/// Objects 1-4 are the catalog, page tree and two fonts; each page then takes
/// a page object and a content stream object.
fn assemble(streams: &[String]) -> Vec<u8> {
    let page_ids: Vec<usize> = (0..streams.len()).map(|i| 5 + 2 * i).collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{} 0 R", id))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects: Vec<String> = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, streams.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>".to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>".to_string(),
    ];
    for (stream, page_id) in streams.iter().zip(&page_ids) {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
            PAGE_WIDTH,
            PAGE_HEIGHT,
            page_id + 1
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}endstream",
            stream.len(),
            stream
        ));
    }

    let mut out: Vec<u8> = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }
    let xref = out.len();
    let mut table = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = writeln!(table, "{:010} 00000 n ", offset);
    }
    let _ = write!(
        table,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref
    );
    out.extend_from_slice(table.as_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::encode::fixtures;

    fn encode(rows: usize) -> Vec<u8> {
        PdfEncoder::default()
            .encode(&fixtures::payload(rows), &CancellationToken::new())
            .unwrap()
    }

    fn as_text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn test_single_page() {
        let bytes = encode(2);
        let text = as_text(&bytes);
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(text.ends_with("%%EOF\n"));
        assert!(text.contains("/Count 1"));
        assert!(text.contains("(Invoices) Tj"));
        assert!(text.contains("(Page 1 of 1) Tj"));
    }

    #[test]
    fn test_header_repeats_on_every_page() {
        let text = as_text(&encode(120));
        let pages = text.matches("/Type /Page ").count();
        assert!(pages > 1);
        assert!(text.contains(&format!("/Count {}", pages)));
        assert_eq!(text.matches("(Name) Tj").count(), pages);
        assert!(text.contains("(Row 120) Tj"));
    }

    #[test]
    fn test_empty_payload_has_one_page() {
        let text = as_text(&encode(0));
        assert!(text.contains("/Count 1"));
    }

    #[test]
    fn test_xref_offsets() {
        let bytes = encode(3);
        let text = as_text(&bytes);
        let start = text.rfind("startxref\n").unwrap() + "startxref\n".len();
        let xref: usize = text[start..].lines().next().unwrap().parse().unwrap();
        assert!(bytes[xref..].starts_with(b"xref"));

        let table = as_text(&bytes[xref..]);
        let first_entry = table.lines().nth(3).unwrap();
        let offset: usize = first_entry[..10].parse().unwrap();
        assert!(bytes[offset..].starts_with(b"1 0 obj"));
    }

    #[test]
    fn test_badge_color_and_alignment() {
        let text = as_text(&encode(1));
        // #52c41a
        assert!(text.contains("0.322 0.769 0.102 rg"));
        assert!(text.contains("(Paid) Tj"));
    }

    #[test]
    fn test_pdf_string_escaping() {
        assert_eq!(pdf_string("a(b)\\"), "a\\(b\\)\\\\");
        assert_eq!(pdf_string("é€"), "\\351\\200");
        assert_eq!(pdf_string("日"), "?");
    }

    #[test]
    fn test_fit() {
        let encoder = PdfEncoder::default();
        let width = encoder.font_size * AVG_GLYPH_WIDTH * 8.0;
        assert_eq!(encoder.fit("short", width), "short");
        assert_eq!(encoder.fit("much too long", width), "much ...");
    }
}
