//! Core types for outline resolution and page rendering

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Indirect object reference identifying a page object
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRef {
    /// Object number
    pub num: u32,
    /// Generation counter
    #[serde(rename = "gen")]
    pub generation: u16,
}

impl PageRef {
    #[must_use]
    pub const fn new(num: u32, generation: u16) -> Self {
        Self { num, generation }
    }
}

impl std::fmt::Display for PageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.num, self.generation)
    }
}

/// One element of a destination list.
///
/// Explicit destinations are arrays such as `[page_ref /XYZ left top zoom]`;
/// only the `PageRef` entries can be turned into a page index.
#[derive(Clone, Debug, PartialEq)]
pub enum DestEntry {
    PageRef(PageRef),
    Name(String),
    Number(f64),
    Null,
    Other,
}

impl DestEntry {
    #[must_use]
    pub fn page_ref(&self) -> Option<PageRef> {
        match self {
            DestEntry::PageRef(r) => Some(*r),
            _ => None,
        }
    }
}

/// Destination carried by an outline node
#[derive(Clone, Debug, PartialEq)]
pub enum Destination {
    /// Named destination, resolved through the document's name lookup
    Named(String),
    /// Explicit destination list
    Direct(Vec<DestEntry>),
}

/// Raw outline node as exposed by the document backend
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutlineNode {
    pub title: Option<String>,
    pub dest: Option<Destination>,
    pub items: Option<Vec<OutlineNode>>,
}

impl OutlineNode {
    /// Leaf node with a title and no destination
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_dest(mut self, dest: Destination) -> Self {
        self.dest = Some(dest);
        self
    }

    #[must_use]
    pub fn with_items(mut self, items: Vec<OutlineNode>) -> Self {
        self.items = Some(items);
        self
    }

    /// Total number of nodes in this subtree, including self
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self
            .items
            .as_ref()
            .map_or(0, |items| items.iter().map(OutlineNode::node_count).sum())
    }

    /// Lenient decoding of a pdf.js-shaped outline item.
    ///
    /// Unknown shapes never fail: a non-string title becomes `None`, a
    /// non-array `items` becomes `None`.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        let title = value
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string);

        let dest = match value.get("dest") {
            Some(Value::String(name)) if name.is_empty() => None,
            Some(Value::String(name)) => Some(Destination::Named(name.clone())),
            Some(Value::Array(entries)) => Some(Destination::Direct(
                entries.iter().map(dest_entry_from_json).collect(),
            )),
            Some(Value::Null) | None => None,
            Some(other) => Some(Destination::Direct(vec![dest_entry_from_json(other)])),
        };

        let items = value
            .get("items")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(OutlineNode::from_json).collect());

        Self { title, dest, items }
    }
}

/// Decode a top-level outline. Anything other than an array is treated as
/// an absent outline.
#[must_use]
pub fn outline_from_json(value: &Value) -> Option<Vec<OutlineNode>> {
    value
        .as_array()
        .map(|items| items.iter().map(OutlineNode::from_json).collect())
}

fn dest_entry_from_json(value: &Value) -> DestEntry {
    match value {
        Value::Null => DestEntry::Null,
        Value::Number(n) => n.as_f64().map_or(DestEntry::Other, DestEntry::Number),
        Value::Object(map) => {
            let num = map.get("num").and_then(Value::as_u64);
            let generation = map.get("gen").and_then(Value::as_u64);
            match (num, generation) {
                (Some(num), Some(generation)) => {
                    match (u32::try_from(num), u16::try_from(generation)) {
                        (Ok(num), Ok(generation)) => {
                            DestEntry::PageRef(PageRef::new(num, generation))
                        }
                        _ => DestEntry::Other,
                    }
                }
                _ => match map.get("name").and_then(Value::as_str) {
                    Some(name) => DestEntry::Name(name.to_string()),
                    None => DestEntry::Other,
                },
            }
        }
        _ => DestEntry::Other,
    }
}

/// Normalized table-of-contents node
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub title: String,
    /// Zero-based page index as a decimal string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Link>,
}

impl Link {
    /// Page index encoded in `href`, if any
    #[must_use]
    pub fn page_index(&self) -> Option<usize> {
        self.href.as_deref().and_then(|h| h.parse().ok())
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Link::node_count).sum::<usize>()
    }
}

/// A single row of a flattened table of contents
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocEntry {
    /// Display title
    pub title: String,
    /// Nesting level (0 = top level)
    pub level: usize,
    /// Target page (0-indexed)
    pub page: Option<usize>,
}

/// Rectangular frame a page is rendered into at a given scale
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

impl Viewport {
    /// Viewport for a page of the given intrinsic size at `scale`
    #[must_use]
    pub fn from_page_size(page_width: f32, page_height: f32, scale: f32) -> Self {
        Self {
            width: page_width * scale,
            height: page_height * scale,
            scale,
        }
    }

    /// Backing store dimensions for this viewport.
    ///
    /// Fractional pixels are truncated, as a canvas does when assigned a
    /// fractional width.
    #[must_use]
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width.max(0.0) as u32, self.height.max(0.0) as u32)
    }
}

/// Size of the container the reader is mounted into
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContainerSize {
    pub width: u32,
    pub height: u32,
}

impl ContainerSize {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outline_from_non_array_is_absent() {
        assert_eq!(outline_from_json(&Value::Null), None);
        assert_eq!(outline_from_json(&json!({})), None);
        assert_eq!(outline_from_json(&json!("outline")), None);
        assert_eq!(outline_from_json(&json!([])), Some(vec![]));
    }

    #[test]
    fn from_json_decodes_destination_shapes() {
        let named = OutlineNode::from_json(&json!({"title": "A", "dest": "chap1"}));
        assert_eq!(named.dest, Some(Destination::Named("chap1".to_string())));

        let blank = OutlineNode::from_json(&json!({"title": "Blank", "dest": ""}));
        assert_eq!(blank.dest, None);

        let single = OutlineNode::from_json(&json!({"title": "B", "dest": {"num": 3, "gen": 0}}));
        assert_eq!(
            single.dest,
            Some(Destination::Direct(vec![DestEntry::PageRef(PageRef::new(3, 0))]))
        );

        let list = OutlineNode::from_json(&json!({
            "title": "C",
            "dest": [{"num": 7, "gen": 1}, {"name": "XYZ"}, 0, 792, null, {"badField": 1}]
        }));
        assert_eq!(
            list.dest,
            Some(Destination::Direct(vec![
                DestEntry::PageRef(PageRef::new(7, 1)),
                DestEntry::Name("XYZ".to_string()),
                DestEntry::Number(0.0),
                DestEntry::Number(792.0),
                DestEntry::Null,
                DestEntry::Other,
            ]))
        );
    }

    #[test]
    fn from_json_tolerates_bad_title_and_items() {
        let node = OutlineNode::from_json(&json!({"title": 42, "items": "nope"}));
        assert_eq!(node.title, None);
        assert_eq!(node.items, None);
        assert_eq!(node.dest, None);
    }

    #[test]
    fn viewport_pixel_size_truncates() {
        let vp = Viewport::from_page_size(612.0, 792.5, 1.0);
        assert_eq!(vp.pixel_size(), (612, 792));

        let vp = Viewport::from_page_size(400.0, 600.0, 2.0);
        assert_eq!(vp.pixel_size(), (800, 1200));
    }

    #[test]
    fn link_serializes_without_empty_fields() {
        let link = Link {
            title: "Intro".to_string(),
            href: None,
            children: vec![],
        };
        assert_eq!(serde_json::to_value(&link).unwrap(), json!({"title": "Intro"}));

        let link = Link {
            title: "Intro".to_string(),
            href: Some("4".to_string()),
            children: vec![Link::default()],
        };
        assert_eq!(link.page_index(), Some(4));
        assert_eq!(link.node_count(), 2);
    }
}
