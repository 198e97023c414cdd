//! Table-wide style settings.

use serde::Deserialize;
use serde::Serialize;

/// Table styling chosen by the user, persisted under its own key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableStyle {
    /// Draw borders between columns.
    pub show_vertical_borders: bool,
    /// Header background (hex). Empty means the default header.
    pub header_background_color: String,
}

impl TableStyle {
    /// Returns the header background when one is set.
    pub fn header_background(&self) -> Option<&str> {
        Some(self.header_background_color.trim()).filter(|c| !c.is_empty())
    }

    /// Returns the header text color that contrasts with the header background.
    pub fn header_text_color(&self) -> Option<&'static str> {
        self.header_background()
            .and_then(crate::contrast::contrast_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_partial_json() {
        let style: TableStyle = serde_json::from_str(r#"{"showVerticalBorders": true}"#).unwrap();
        assert!(style.show_vertical_borders);
        assert_eq!(style.header_background(), None);
        assert_eq!(style.header_text_color(), None);
    }

    #[test]
    fn test_header_text_color() {
        let style = TableStyle {
            show_vertical_borders: false,
            header_background_color: "#1f2937".into(),
        };
        assert_eq!(style.header_text_color(), Some("#ffffff"));
    }
}
