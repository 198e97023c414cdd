//! Export target formats.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;

/// A target encoding for exported rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Excel,
    Word,
    Pdf,
    Html,
    /// HTML that prints itself when opened.
    Print,
}

impl ExportFormat {
    /// Every format, in menu order.
    pub const ALL: [ExportFormat; 6] = [
        ExportFormat::Csv,
        ExportFormat::Excel,
        ExportFormat::Word,
        ExportFormat::Pdf,
        ExportFormat::Html,
        ExportFormat::Print,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "excel",
            ExportFormat::Word => "word",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Html => "html",
            ExportFormat::Print => "print",
        }
    }

    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xls",
            ExportFormat::Word => "doc",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Html | ExportFormat::Print => "html",
        }
    }

    /// Get MIME type for this format
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Excel => "application/vnd.ms-excel",
            ExportFormat::Word => "application/msword",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Html | ExportFormat::Print => "text/html",
        }
    }

    /// Returns `true` if the format keeps markup (badges, images, colors).
    pub fn supports_markup(&self) -> bool {
        !matches!(self, ExportFormat::Csv | ExportFormat::Excel)
    }

    /// Returns `{slug}_{YYYYMMDD_HHMMSS}.{ext}` for an export titled `title`.
    pub fn file_name(&self, title: &str, at: NaiveDateTime) -> String {
        format!(
            "{}_{}.{}",
            slugify(title),
            at.format("%Y%m%d_%H%M%S"),
            self.extension()
        )
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "excel" | "xls" => Ok(ExportFormat::Excel),
            "word" | "doc" => Ok(ExportFormat::Word),
            "pdf" => Ok(ExportFormat::Pdf),
            "html" => Ok(ExportFormat::Html),
            "print" => Ok(ExportFormat::Print),
            other => Err(format!("unknown export format '{}'", other)),
        }
    }
}

/// Lowercases `title` and joins its alphanumeric runs with `_`.
///
/// An empty result becomes `export`.
pub fn slugify(title: &str) -> String {
    let slug = title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_");
    if slug.is_empty() {
        "export".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_extension_and_mime() {
        assert_eq!(ExportFormat::Excel.extension(), "xls");
        assert_eq!(ExportFormat::Print.extension(), "html");
        assert_eq!(ExportFormat::Pdf.mime_type(), "application/pdf");
    }

    #[test]
    fn test_file_name() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 7, 9)
            .unwrap();
        assert_eq!(
            ExportFormat::Csv.file_name("Unpaid Invoices (Q1)", at),
            "unpaid_invoices_q1_20240305_140709.csv"
        );
        assert_eq!(ExportFormat::Pdf.file_name("  ", at), "export_20240305_140709.pdf");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("PDF".parse::<ExportFormat>(), Ok(ExportFormat::Pdf));
        assert_eq!("xls".parse::<ExportFormat>(), Ok(ExportFormat::Excel));
        assert!("docx".parse::<ExportFormat>().is_err());
        for format in ExportFormat::ALL {
            assert_eq!(format.as_str().parse::<ExportFormat>(), Ok(format));
        }
    }
}
