//! Lowering [`CellNode`] trees into text and markup.

use crate::cell::CellNode;
use crate::contrast::contrast_color;

/// Badge color used when a palette name is unknown.
pub const DEFAULT_BADGE_COLOR: &str = "#8c8c8c";

/// Returns the fixed hex value of a badge palette name.
///
/// Unknown names map to gray.
pub fn badge_hex(color: &str) -> &'static str {
    match color.trim().to_ascii_lowercase().as_str() {
        "blue" => "#1890ff",
        "green" => "#52c41a",
        "red" => "#f5222d",
        "yellow" => "#fadb14",
        "orange" => "#fa8c16",
        "purple" => "#722ed1",
        "cyan" => "#13c2c2",
        _ => DEFAULT_BADGE_COLOR,
    }
}

/// Escapes a string for HTML/XML text and attribute values.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn unknown_text(json: &serde_json::Value) -> String {
    match json {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn join_nonempty(parts: impl Iterator<Item = String>) -> String {
    parts.filter(|p| !p.is_empty()).collect::<Vec<_>>().join(" ")
}

/// Lowers a cell to plain text: badge colors dropped, images as alt text.
pub fn lower_text(node: &CellNode) -> String {
    match node {
        CellNode::Text(text) | CellNode::Opaque(text) => text.clone(),
        CellNode::Badge { text, .. } => text.clone(),
        CellNode::Group(children) => join_nonempty(children.iter().map(lower_text)),
        CellNode::Image { alt, .. } => alt
            .as_deref()
            .filter(|a| !a.is_empty())
            .unwrap_or("[Image]")
            .to_string(),
        CellNode::Unknown(json) => unknown_text(json),
    }
}

/// Lowers a cell to escaped HTML.
///
/// Badges become colored inline spans from the fixed palette. Images are
/// bounded to `image_max_px` in both dimensions.
pub fn lower_html(node: &CellNode, image_max_px: u32) -> String {
    match node {
        CellNode::Text(text) | CellNode::Opaque(text) => escape_html(text),
        CellNode::Badge { text, color } => {
            let background = badge_hex(color);
            let foreground = contrast_color(background).unwrap_or(crate::contrast::WHITE);
            format!(
                r#"<span style="background-color:{};color:{};padding:1px 8px;border-radius:4px;white-space:nowrap">{}</span>"#,
                background,
                foreground,
                escape_html(text)
            )
        }
        CellNode::Group(children) => {
            join_nonempty(children.iter().map(|child| lower_html(child, image_max_px)))
        }
        CellNode::Image { src, alt } => format!(
            r#"<img src="{}" alt="{}" style="max-width:{}px;max-height:{}px">"#,
            escape_html(src),
            escape_html(alt.as_deref().unwrap_or("")),
            image_max_px,
            image_max_px
        ),
        CellNode::Unknown(json) => escape_html(&unknown_text(json)),
    }
}

/// Returns the palette color of the first badge in the cell, if any.
///
/// Formats that can only color whole cells (PDF) draw the text in this color.
pub fn accent_color(node: &CellNode) -> Option<&'static str> {
    match node {
        CellNode::Badge { color, .. } => Some(badge_hex(color)),
        CellNode::Group(children) => children.iter().find_map(accent_color),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette() {
        assert_eq!(badge_hex("green"), "#52c41a");
        assert_eq!(badge_hex("Blue"), "#1890ff");
        assert_eq!(badge_hex("magenta"), DEFAULT_BADGE_COLOR);
    }

    #[test]
    fn test_text_lowering() {
        let node = CellNode::group([
            CellNode::badge("Paid", "green"),
            CellNode::text("2024-01-01"),
            CellNode::image("/logo.png", None),
            CellNode::opaque("fallback"),
        ]);
        assert_eq!(lower_text(&node), "Paid 2024-01-01 [Image] fallback");
        assert_eq!(
            lower_text(&CellNode::image("/a.png", Some("Logo".into()))),
            "Logo"
        );
    }

    #[test]
    fn test_html_lowering() {
        let html = lower_html(&CellNode::badge("<Paid>", "green"), 50);
        assert!(html.contains("background-color:#52c41a"));
        assert!(html.contains("&lt;Paid&gt;"));

        let img = lower_html(&CellNode::image("/a.png?x=1&y=2", None), 40);
        assert!(img.contains("max-width:40px"));
        assert!(img.contains("x=1&amp;y=2"));
    }

    #[test]
    fn test_unknown_degrades_to_string() {
        let node = CellNode::Unknown(serde_json::json!({"weird": 1}));
        assert_eq!(lower_text(&node), r#"{"weird":1}"#);
        assert_eq!(lower_html(&node, 50), "{&quot;weird&quot;:1}");
    }

    #[test]
    fn test_accent_color() {
        let node = CellNode::group([CellNode::text("x"), CellNode::badge("Late", "red")]);
        assert_eq!(accent_color(&node), Some("#f5222d"));
        assert_eq!(accent_color(&CellNode::text("x")), None);
    }
}
