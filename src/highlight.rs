use serde::{Deserialize, Serialize};

/// Action type emitted when the user clicks a highlight
pub const HIGHLIGHT_CLICK_ID: &str = "READER_HIGHLIGHT_CLICK";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

/// A highlight drawn over the reader content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub id: String,
    pub color: HighlightColor,
    #[serde(default)]
    pub pointer_interaction: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightClickPayload {
    /// Resource the highlight belongs to
    pub href: String,
    #[serde(rename = "ref")]
    pub highlight_ref: Highlight,
}

/// Actions dispatched by the reader to the application store.
///
/// Serializes as `{ "type": ..., "payload": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ReaderAction {
    #[serde(rename = "READER_HIGHLIGHT_CLICK")]
    HighlightClick(HighlightClickPayload),
}

impl ReaderAction {
    pub fn action_type(&self) -> &'static str {
        match self {
            ReaderAction::HighlightClick(_) => HIGHLIGHT_CLICK_ID,
        }
    }
}

impl std::fmt::Display for ReaderAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.action_type())
    }
}

/// Build the highlight-click action
pub fn build(data: HighlightClickPayload) -> ReaderAction {
    ReaderAction::HighlightClick(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn highlight() -> Highlight {
        Highlight {
            id: "hl-1".to_string(),
            color: HighlightColor {
                red: 255,
                green: 210,
                blue: 0,
            },
            pointer_interaction: true,
        }
    }

    #[test]
    fn build_wraps_payload() {
        let payload = HighlightClickPayload {
            href: "h1".to_string(),
            highlight_ref: highlight(),
        };
        let action = build(payload.clone());

        assert_eq!(action, ReaderAction::HighlightClick(payload.clone()));
        assert_eq!(action.action_type(), "READER_HIGHLIGHT_CLICK");
        assert_eq!(build(payload.clone()), build(payload));
    }

    #[test]
    fn serializes_to_tagged_shape() {
        let action = build(HighlightClickPayload {
            href: "h1".to_string(),
            highlight_ref: highlight(),
        });

        assert_eq!(
            serde_json::to_value(&action).unwrap(),
            json!({
                "type": "READER_HIGHLIGHT_CLICK",
                "payload": {
                    "href": "h1",
                    "ref": {
                        "id": "hl-1",
                        "color": {"red": 255, "green": 210, "blue": 0},
                        "pointerInteraction": true
                    }
                }
            })
        );
    }

    #[test]
    fn deserializes_store_action() {
        let action: ReaderAction = serde_json::from_value(json!({
            "type": "READER_HIGHLIGHT_CLICK",
            "payload": {
                "href": "chapter2.xhtml",
                "ref": {"id": "x", "color": {"red": 1, "green": 2, "blue": 3}}
            }
        }))
        .unwrap();

        let ReaderAction::HighlightClick(payload) = action;
        assert_eq!(payload.href, "chapter2.xhtml");
        assert!(!payload.highlight_ref.pointer_interaction);
        assert_eq!(build(payload).to_string(), "READER_HIGHLIGHT_CLICK");
    }
}
