use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use surfpilot_core_types::MouseButton;

use crate::cookies::Cookie;
use crate::error::AdapterError;

/// One accessibility node as exposed by the browser.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AxNode {
    pub node_id: String,
    pub role: String,
    pub name: String,
    pub description: String,
    pub value: String,
    pub ignored: bool,
    pub properties: BTreeMap<String, Value>,
    pub child_ids: Vec<String>,
}

impl AxNode {
    pub fn new(node_id: impl Into<String>, role: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            role: role.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.child_ids = children.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Boolean or tristate property (`"true"`, `"mixed"`) read as a flag.
    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.properties.get(name)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => Some(s == "true" || s == "mixed"),
            _ => None,
        }
    }

    /// Parse the JSON shape of `Accessibility.getFullAXTree` nodes.
    pub fn from_cdp_json(raw: &Value) -> Option<Self> {
        let node_id = raw.get("nodeId")?.as_str()?.to_string();
        let ax_value = |key: &str| -> String {
            match raw.get(key).and_then(|v| v.get("value")) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            }
        };
        let properties = raw
            .get("properties")
            .and_then(Value::as_array)
            .map(|props| {
                props
                    .iter()
                    .filter_map(|prop| {
                        let name = prop.get("name")?.as_str()?.to_string();
                        let value = prop.get("value")?.get("value").cloned().unwrap_or(Value::Null);
                        Some((name, value))
                    })
                    .collect()
            })
            .unwrap_or_default();
        let child_ids = raw
            .get("childIds")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| id.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            node_id,
            role: ax_value("role"),
            name: ax_value("name"),
            description: ax_value("description"),
            value: ax_value("value"),
            ignored: raw.get("ignored").and_then(Value::as_bool).unwrap_or(false),
            properties,
            child_ids,
        })
    }
}

/// Live-element queries a driver must answer with every match it finds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum ElementQuery {
    /// Accessible role plus name, exact or case-insensitive substring.
    Role {
        role: String,
        name: String,
        exact: bool,
    },
    XPath {
        xpath: String,
    },
    Css {
        selector: String,
    },
    Attribute {
        name: String,
        value: String,
    },
}

impl ElementQuery {
    pub fn describe(&self) -> String {
        match self {
            ElementQuery::Role { role, name, exact } => {
                let op = if *exact { "=" } else { "*=" };
                format!("role={role}[name{op}{name:?}]")
            }
            ElementQuery::XPath { xpath } => format!("xpath={xpath}"),
            ElementQuery::Css { selector } => format!("css={selector}"),
            ElementQuery::Attribute { name, value } => format!("[{name}={value:?}]"),
        }
    }
}

/// Opaque, driver-issued handle to a live element found by a query.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    pub id: String,
    pub description: String,
}

/// Click strategies the execution layer escalates through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickMode {
    /// Pointer click at the element centre after a hit test.
    Standard,
    /// Pointer click at the element centre without checking what is on top.
    Forced,
    /// `element.click()` dispatched from page script.
    Script,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollTo {
    By(i64),
    Top,
    Bottom,
}

/// Everything the agent needs from one open page.
///
/// Implementations bound every call by their own timeout and report it as
/// [`crate::AdapterErrorKind::Timeout`].
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn url(&self) -> Result<String, AdapterError>;

    async fn accessibility_tree(&self) -> Result<Vec<AxNode>, AdapterError>;

    /// Serialized DOM.
    async fn content(&self) -> Result<String, AdapterError>;

    /// Rendered text of the document body.
    async fn visible_text(&self) -> Result<String, AdapterError>;

    async fn count_interactive(&self) -> Result<usize, AdapterError>;

    async fn query(&self, query: &ElementQuery) -> Result<Vec<ElementHandle>, AdapterError>;

    async fn attributes(&self, element: &ElementHandle)
        -> Result<HashMap<String, String>, AdapterError>;

    async fn click(
        &self,
        element: &ElementHandle,
        mode: ClickMode,
        timeout: Duration,
    ) -> Result<(), AdapterError>;

    async fn focus(&self, element: &ElementHandle) -> Result<(), AdapterError>;

    async fn clear(&self, element: &ElementHandle) -> Result<(), AdapterError>;

    async fn type_char(&self, ch: char) -> Result<(), AdapterError>;

    /// Press a key or a `+`-joined chord such as `Control+A`.
    async fn press_key(&self, key: &str) -> Result<(), AdapterError>;

    async fn select_option(&self, element: &ElementHandle, option: &str)
        -> Result<(), AdapterError>;

    async fn hover(&self, element: &ElementHandle) -> Result<(), AdapterError>;

    async fn set_files(&self, element: &ElementHandle, files: &[PathBuf])
        -> Result<(), AdapterError>;

    async fn mouse_move(&self, x: f64, y: f64) -> Result<(), AdapterError>;

    async fn mouse_down(&self, x: f64, y: f64, button: MouseButton) -> Result<(), AdapterError>;

    async fn mouse_up(&self, x: f64, y: f64, button: MouseButton) -> Result<(), AdapterError>;

    async fn click_at(&self, x: f64, y: f64, button: MouseButton) -> Result<(), AdapterError> {
        self.mouse_move(x, y).await?;
        self.mouse_down(x, y, button).await?;
        self.mouse_up(x, y, button).await
    }

    async fn wheel(&self, x: f64, y: f64, delta_x: f64, delta_y: f64)
        -> Result<(), AdapterError>;

    async fn scroll_into_view(&self, element: &ElementHandle) -> Result<(), AdapterError>;

    async fn scroll_window(&self, to: ScrollTo) -> Result<(), AdapterError>;

    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), AdapterError>;

    async fn reload(&self, timeout: Duration) -> Result<(), AdapterError>;

    async fn go_back(&self) -> Result<(), AdapterError>;

    async fn go_forward(&self) -> Result<(), AdapterError>;

    /// Wait until the document reports `complete`, or the timeout passes.
    async fn wait_for_load(&self, timeout: Duration) -> Result<(), AdapterError>;

    async fn evaluate(&self, script: &str) -> Result<Value, AdapterError>;

    /// PNG of the viewport, or of the whole scrollable page when `full_page` is set.
    async fn screenshot(&self, full_page: bool) -> Result<Vec<u8>, AdapterError>;

    /// PNG clipped to one element's bounding box.
    async fn element_screenshot(&self, element: &ElementHandle) -> Result<Vec<u8>, AdapterError>;

    async fn set_cookies(&self, cookies: &[Cookie]) -> Result<(), AdapterError>;

    async fn add_init_script(&self, source: &str) -> Result<(), AdapterError>;

    /// Release the page and its browser. Called once per session.
    async fn close(&self) -> Result<(), AdapterError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_cdp_ax_node_shape() {
        let raw = json!({
            "nodeId": "12",
            "ignored": false,
            "role": {"type": "role", "value": "checkbox"},
            "name": {"type": "computedString", "value": "Remember me"},
            "properties": [
                {"name": "checked", "value": {"type": "tristate", "value": "true"}},
                {"name": "focusable", "value": {"type": "booleanOrUndefined", "value": true}}
            ],
            "childIds": ["13", "14"]
        });
        let node = AxNode::from_cdp_json(&raw).expect("node");
        assert_eq!(node.role, "checkbox");
        assert_eq!(node.name, "Remember me");
        assert_eq!(node.flag("checked"), Some(true));
        assert_eq!(node.flag("disabled"), None);
        assert_eq!(node.child_ids, vec!["13", "14"]);
    }

    #[test]
    fn query_descriptions_are_readable() {
        let exact = ElementQuery::Role {
            role: "button".into(),
            name: "Search".into(),
            exact: true,
        };
        assert_eq!(exact.describe(), "role=button[name=\"Search\"]");
    }
}
