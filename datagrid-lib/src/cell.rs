//! Serializable cell representation.
//!
//! A column's `render` rule produces a [`CellNode`] tree instead of a live UI
//! object. The tree is plain data, so exporters can walk it headlessly and
//! lower it into each target format.

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::model::Value;

/// The content of one rendered cell.
///
/// Serialized with a `type` tag:
///
/// ```json
/// {"type": "badge", "text": "Paid", "color": "green"}
/// ```
///
/// Any JSON that does not match a known shape deserializes to
/// [`CellNode::Unknown`] rather than failing, and lowers to its string form.
#[derive(Debug, Clone, PartialEq)]
pub enum CellNode {
    /// Literal text.
    Text(String),
    /// Colored tag. `color` is a palette name (`blue`, `green`, ...).
    Badge { text: String, color: String },
    /// Inline sequence of nodes, space-joined when lowered.
    Group(Vec<CellNode>),
    /// Image reference.
    Image { src: String, alt: Option<String> },
    /// Content with no exportable structure; only the fallback text survives.
    Opaque(String),
    /// Unrecognized node, kept verbatim.
    Unknown(serde_json::Value),
}

impl CellNode {
    /// Creates a text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Creates a badge node.
    pub fn badge(text: impl Into<String>, color: impl Into<String>) -> Self {
        Self::Badge {
            text: text.into(),
            color: color.into(),
        }
    }

    /// Creates a group node.
    pub fn group(children: impl IntoIterator<Item = CellNode>) -> Self {
        Self::Group(children.into_iter().collect())
    }

    /// Creates an image node.
    pub fn image(src: impl Into<String>, alt: Option<String>) -> Self {
        Self::Image {
            src: src.into(),
            alt,
        }
    }

    /// Creates an opaque node with fallback text.
    pub fn opaque(fallback: impl Into<String>) -> Self {
        Self::Opaque(fallback.into())
    }

    /// Returns `true` if the node is a group with no children or empty text.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) | Self::Opaque(s) => s.is_empty(),
            Self::Group(children) => children.iter().all(CellNode::is_empty),
            _ => false,
        }
    }
}

impl From<&str> for CellNode {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for CellNode {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&Value> for CellNode {
    fn from(v: &Value) -> Self {
        Self::Text(v.to_string())
    }
}

// =============================================================================
// Serde
// =============================================================================

#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TaggedNode {
    Text {
        text: String,
    },
    Badge {
        text: String,
        #[serde(default)]
        color: String,
    },
    Group {
        children: Vec<serde_json::Value>,
    },
    Image {
        src: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt: Option<String>,
    },
    Opaque {
        fallback: String,
    },
}

impl From<serde_json::Value> for CellNode {
    fn from(json: serde_json::Value) -> Self {
        match serde_json::from_value::<TaggedNode>(json.clone()) {
            Ok(TaggedNode::Text { text }) => Self::Text(text),
            Ok(TaggedNode::Badge { text, color }) => Self::Badge { text, color },
            Ok(TaggedNode::Group { children }) => {
                Self::Group(children.into_iter().map(CellNode::from).collect())
            }
            Ok(TaggedNode::Image { src, alt }) => Self::Image { src, alt },
            Ok(TaggedNode::Opaque { fallback }) => Self::Opaque(fallback),
            Err(_) => Self::Unknown(json),
        }
    }
}

impl CellNode {
    fn to_json(&self) -> serde_json::Value {
        let tagged = match self {
            Self::Unknown(json) => return json.clone(),
            Self::Text(text) => TaggedNode::Text { text: text.clone() },
            Self::Badge { text, color } => TaggedNode::Badge {
                text: text.clone(),
                color: color.clone(),
            },
            Self::Group(children) => TaggedNode::Group {
                children: children.iter().map(CellNode::to_json).collect(),
            },
            Self::Image { src, alt } => TaggedNode::Image {
                src: src.clone(),
                alt: alt.clone(),
            },
            Self::Opaque(fallback) => TaggedNode::Opaque {
                fallback: fallback.clone(),
            },
        };
        serde_json::to_value(tagged).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for CellNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CellNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(CellNode::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_known_nodes() {
        let node: CellNode = serde_json::from_str(
            r#"{"type": "group", "children": [
                {"type": "badge", "text": "Paid", "color": "green"},
                {"type": "image", "src": "a.png"},
                {"type": "opaque", "fallback": "chart"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(
            node,
            CellNode::group([
                CellNode::badge("Paid", "green"),
                CellNode::image("a.png", None),
                CellNode::opaque("chart"),
            ])
        );
    }

    #[test]
    fn test_unknown_node_does_not_fail() {
        let node: CellNode = serde_json::from_str(r#"{"type": "sparkline", "points": [1, 2]}"#).unwrap();
        assert!(matches!(node, CellNode::Unknown(_)));

        let node: CellNode = serde_json::from_str(r#""bare string""#).unwrap();
        assert_eq!(node, CellNode::Unknown(serde_json::json!("bare string")));
    }

    #[test]
    fn test_serialize_badge() {
        let json = serde_json::to_value(CellNode::badge("Late", "red")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "badge", "text": "Late", "color": "red"})
        );
    }

    #[test]
    fn test_is_empty() {
        assert!(CellNode::text("").is_empty());
        assert!(CellNode::group([CellNode::text("")]).is_empty());
        assert!(!CellNode::badge("", "red").is_empty());
    }
}
