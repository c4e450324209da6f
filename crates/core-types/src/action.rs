//! Typed action taxonomy.
//!
//! Model output arrives as loosely shaped JSON. [`Action::from_value`] turns it into exactly
//! one variant carrying only the fields legal for that action, or a [`ParseError`] naming
//! what was missing.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::registry::{lookup, normalize_action_type, ActionCategory};

const DEFAULT_SCROLL_PX: i64 = 500;
const DEFAULT_WHEEL_PX: f64 = 300.0;
const DEFAULT_MOVE_STEPS: u32 = 10;

/// Canonical action names. Serialized as the `action_type` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Click,
    InputText,
    SelectOption,
    Hover,
    UploadFile,
    ClickXy,
    MoveXy,
    DragXy,
    MouseDown,
    MouseUp,
    Wheel,
    Keypress,
    TypeText,
    GotoUrl,
    Reload,
    GoBack,
    GoForward,
    Scroll,
    Wait,
    Screenshot,
    Extract,
    Complete,
    Terminate,
}

impl ActionKind {
    pub fn name(self) -> &'static str {
        lookup(self).name
    }

    pub fn category(self) -> ActionCategory {
        lookup(self).category
    }

    pub fn is_terminal(self) -> bool {
        self.category() == ActionCategory::Terminal
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
    /// One row per object; only for arrays of objects.
    Csv,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "md",
            OutputFormat::Csv => "csv",
        }
    }
}

/// Where a scroll action points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollTarget {
    /// Bring a referenced element into view.
    Element(String),
    /// Scroll the viewport by signed pixels (negative is up).
    Pixels(i64),
    Top,
    Bottom,
}

/// One executable action. Each variant holds only the fields legal for its tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action_type", rename_all = "snake_case")]
pub enum Action {
    Click {
        element_id: String,
    },
    InputText {
        element_id: String,
        text: String,
    },
    SelectOption {
        element_id: String,
        option: String,
    },
    Hover {
        element_id: String,
    },
    UploadFile {
        element_id: String,
        path: String,
    },
    ClickXy {
        x: f64,
        y: f64,
        #[serde(default)]
        button: MouseButton,
    },
    MoveXy {
        x: f64,
        y: f64,
        steps: u32,
    },
    DragXy {
        x: f64,
        y: f64,
        steps: u32,
        #[serde(default)]
        button: MouseButton,
    },
    MouseDown {
        x: f64,
        y: f64,
        #[serde(default)]
        button: MouseButton,
    },
    MouseUp {
        x: f64,
        y: f64,
        #[serde(default)]
        button: MouseButton,
    },
    Wheel {
        x: f64,
        y: f64,
        delta_x: f64,
        delta_y: f64,
    },
    Keypress {
        keys: String,
    },
    TypeText {
        text: String,
    },
    GotoUrl {
        url: String,
    },
    Reload,
    GoBack,
    GoForward,
    Scroll {
        target: ScrollTarget,
    },
    Wait {
        seconds: f64,
    },
    /// PNG of the viewport, the full page, or one referenced element.
    Screenshot {
        #[serde(default)]
        element_id: Option<String>,
        #[serde(default)]
        full_page: bool,
        #[serde(default)]
        filename: Option<String>,
    },
    Extract {
        extracted_data: Value,
        #[serde(default)]
        output_format: OutputFormat,
        #[serde(default)]
        output_title: Option<String>,
    },
    Complete {
        #[serde(default)]
        extracted_data: Option<Value>,
        #[serde(default)]
        output_format: OutputFormat,
        #[serde(default)]
        output_title: Option<String>,
    },
    Terminate {
        reason: String,
    },
}

/// Reasons an untyped payload could not become an [`Action`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    #[error("model output is not valid JSON: {0}")]
    Json(String),

    #[error("action payload must be a JSON object")]
    NotAnObject,

    #[error("action payload has no action_type")]
    MissingActionType,

    #[error("unknown action_type: {0}")]
    UnknownActionType(String),

    #[error("{action} requires field '{field}'")]
    MissingField {
        action: &'static str,
        field: &'static str,
    },

    #[error("field '{field}' is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl Action {
    /// Convert an untyped action payload into a typed variant.
    pub fn from_value(value: &Value) -> Result<Self, ParseError> {
        let obj = value.as_object().ok_or(ParseError::NotAnObject)?;
        let raw_type = obj
            .get("action_type")
            .or_else(|| obj.get("action"))
            .and_then(Value::as_str)
            .ok_or(ParseError::MissingActionType)?;
        let kind = normalize_action_type(raw_type)
            .ok_or_else(|| ParseError::UnknownActionType(raw_type.to_string()))?;
        Self::from_fields(kind, obj)
    }

    /// Build the variant for an already-normalized kind.
    pub fn from_fields(kind: ActionKind, obj: &Map<String, Value>) -> Result<Self, ParseError> {
        let name = kind.name();
        let fields = Fields { obj, action: name };

        let action = match kind {
            ActionKind::Click => Action::Click {
                element_id: fields.require_str("element_id")?,
            },
            ActionKind::InputText => Action::InputText {
                element_id: fields.require_str("element_id")?,
                text: fields.require_str("text")?,
            },
            ActionKind::SelectOption => Action::SelectOption {
                element_id: fields.require_str("element_id")?,
                option: fields
                    .string("option")
                    .or_else(|| fields.string("text"))
                    .ok_or(ParseError::MissingField {
                        action: name,
                        field: "option",
                    })?,
            },
            ActionKind::Hover => Action::Hover {
                element_id: fields.require_str("element_id")?,
            },
            ActionKind::UploadFile => Action::UploadFile {
                element_id: fields.require_str("element_id")?,
                path: fields
                    .string("path")
                    .or_else(|| fields.string("text"))
                    .ok_or(ParseError::MissingField {
                        action: name,
                        field: "path",
                    })?,
            },
            ActionKind::ClickXy => Action::ClickXy {
                x: fields.require_number("x")?,
                y: fields.require_number("y")?,
                button: fields.button()?,
            },
            ActionKind::MoveXy => Action::MoveXy {
                x: fields.require_number("x")?,
                y: fields.require_number("y")?,
                steps: fields.steps()?,
            },
            ActionKind::DragXy => Action::DragXy {
                x: fields.require_number("x")?,
                y: fields.require_number("y")?,
                steps: fields.steps()?,
                button: fields.button()?,
            },
            ActionKind::MouseDown => Action::MouseDown {
                x: fields.require_number("x")?,
                y: fields.require_number("y")?,
                button: fields.button()?,
            },
            ActionKind::MouseUp => Action::MouseUp {
                x: fields.require_number("x")?,
                y: fields.require_number("y")?,
                button: fields.button()?,
            },
            ActionKind::Wheel => {
                let amount = fields.number("amount")?.unwrap_or(DEFAULT_WHEEL_PX).abs();
                let direction = fields.string("direction").unwrap_or_default();
                let (delta_x, delta_y) = match direction.to_ascii_lowercase().as_str() {
                    "up" => (0.0, -amount),
                    "left" => (-amount, 0.0),
                    "right" => (amount, 0.0),
                    _ => (0.0, amount),
                };
                Action::Wheel {
                    x: fields.require_number("x")?,
                    y: fields.require_number("y")?,
                    delta_x,
                    delta_y,
                }
            }
            ActionKind::Keypress => Action::Keypress {
                keys: fields.keys()?,
            },
            ActionKind::TypeText => Action::TypeText {
                text: fields.require_str("text")?,
            },
            ActionKind::GotoUrl => Action::GotoUrl {
                url: fields.require_str("url")?,
            },
            ActionKind::Reload => Action::Reload,
            ActionKind::GoBack => Action::GoBack,
            ActionKind::GoForward => Action::GoForward,
            ActionKind::Scroll => Action::Scroll {
                target: fields.scroll_target()?,
            },
            ActionKind::Wait => {
                let seconds = fields.require_number("seconds")?;
                if !seconds.is_finite() || seconds < 0.0 {
                    return Err(ParseError::InvalidField {
                        field: "seconds",
                        reason: format!("{seconds} is not a non-negative duration"),
                    });
                }
                Action::Wait { seconds }
            }
            ActionKind::Screenshot => Action::Screenshot {
                element_id: fields.string("element_id"),
                full_page: fields.flag("full_page")?,
                filename: fields.string("filename"),
            },
            ActionKind::Extract => Action::Extract {
                extracted_data: fields
                    .present("extracted_data")
                    .cloned()
                    .ok_or(ParseError::MissingField {
                        action: name,
                        field: "extracted_data",
                    })?,
                output_format: fields.output_format(),
                output_title: fields.string("output_title"),
            },
            ActionKind::Complete => Action::Complete {
                extracted_data: fields.present("extracted_data").cloned(),
                output_format: fields.output_format(),
                output_title: fields.string("output_title"),
            },
            ActionKind::Terminate => Action::Terminate {
                reason: fields
                    .joined("errors")
                    .or_else(|| fields.string("reason"))
                    .or_else(|| fields.string("reasoning"))
                    .unwrap_or_else(|| "terminated by model".to_string()),
            },
        };
        Ok(action)
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Click { .. } => ActionKind::Click,
            Action::InputText { .. } => ActionKind::InputText,
            Action::SelectOption { .. } => ActionKind::SelectOption,
            Action::Hover { .. } => ActionKind::Hover,
            Action::UploadFile { .. } => ActionKind::UploadFile,
            Action::ClickXy { .. } => ActionKind::ClickXy,
            Action::MoveXy { .. } => ActionKind::MoveXy,
            Action::DragXy { .. } => ActionKind::DragXy,
            Action::MouseDown { .. } => ActionKind::MouseDown,
            Action::MouseUp { .. } => ActionKind::MouseUp,
            Action::Wheel { .. } => ActionKind::Wheel,
            Action::Keypress { .. } => ActionKind::Keypress,
            Action::TypeText { .. } => ActionKind::TypeText,
            Action::GotoUrl { .. } => ActionKind::GotoUrl,
            Action::Reload => ActionKind::Reload,
            Action::GoBack => ActionKind::GoBack,
            Action::GoForward => ActionKind::GoForward,
            Action::Scroll { .. } => ActionKind::Scroll,
            Action::Wait { .. } => ActionKind::Wait,
            Action::Screenshot { .. } => ActionKind::Screenshot,
            Action::Extract { .. } => ActionKind::Extract,
            Action::Complete { .. } => ActionKind::Complete,
            Action::Terminate { .. } => ActionKind::Terminate,
        }
    }

    /// Snapshot reference this action targets, if any.
    pub fn element_id(&self) -> Option<&str> {
        match self {
            Action::Click { element_id }
            | Action::InputText { element_id, .. }
            | Action::SelectOption { element_id, .. }
            | Action::Hover { element_id }
            | Action::UploadFile { element_id, .. } => Some(element_id),
            Action::Scroll {
                target: ScrollTarget::Element(element_id),
            } => Some(element_id),
            Action::Screenshot {
                element_id: Some(element_id),
                ..
            } => Some(element_id),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind().is_terminal()
    }

    /// Short single-line description used in memory and history.
    pub fn summary(&self) -> String {
        match self {
            Action::Click { element_id } => format!("click [{element_id}]"),
            Action::InputText { element_id, text } => {
                format!("input_text [{element_id}] {:?}", clip(text, 40))
            }
            Action::SelectOption { element_id, option } => {
                format!("select_option [{element_id}] {option:?}")
            }
            Action::Hover { element_id } => format!("hover [{element_id}]"),
            Action::UploadFile { element_id, path } => format!("upload_file [{element_id}] {path}"),
            Action::ClickXy { x, y, .. } => format!("click_xy ({x:.0}, {y:.0})"),
            Action::MoveXy { x, y, .. } => format!("move_xy ({x:.0}, {y:.0})"),
            Action::DragXy { x, y, .. } => format!("drag_xy to ({x:.0}, {y:.0})"),
            Action::MouseDown { x, y, .. } => format!("mouse_down ({x:.0}, {y:.0})"),
            Action::MouseUp { x, y, .. } => format!("mouse_up ({x:.0}, {y:.0})"),
            Action::Wheel { delta_x, delta_y, .. } => format!("wheel ({delta_x:.0}, {delta_y:.0})"),
            Action::Keypress { keys } => format!("keypress {keys}"),
            Action::TypeText { text } => format!("type_text {:?}", clip(text, 40)),
            Action::GotoUrl { url } => format!("goto_url {url}"),
            Action::Reload => "reload".to_string(),
            Action::GoBack => "go_back".to_string(),
            Action::GoForward => "go_forward".to_string(),
            Action::Scroll { target } => match target {
                ScrollTarget::Element(id) => format!("scroll to [{id}]"),
                ScrollTarget::Pixels(px) => format!("scroll {px}px"),
                ScrollTarget::Top => "scroll to top".to_string(),
                ScrollTarget::Bottom => "scroll to bottom".to_string(),
            },
            Action::Wait { seconds } => format!("wait {seconds}s"),
            Action::Screenshot {
                element_id, full_page, ..
            } => match element_id {
                Some(id) => format!("screenshot [{id}]"),
                None if *full_page => "screenshot full page".to_string(),
                None => "screenshot".to_string(),
            },
            Action::Extract { output_title, .. } => match output_title {
                Some(title) => format!("extract {title:?}"),
                None => "extract".to_string(),
            },
            Action::Complete { .. } => "complete".to_string(),
            Action::Terminate { reason } => format!("terminate: {}", clip(reason, 60)),
        }
    }
}

/// A parsed model decision. Invalid decisions keep the reason so it can be fed back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub kind: ActionKind,
    pub action: Option<Action>,
    pub reasoning: String,
    pub error: Option<String>,
}

impl Decision {
    pub fn valid(action: Action, reasoning: impl Into<String>) -> Self {
        Self {
            kind: action.kind(),
            action: Some(action),
            reasoning: reasoning.into(),
            error: None,
        }
    }

    pub fn invalid(
        kind: ActionKind,
        action: Option<Action>,
        reasoning: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            action,
            reasoning: reasoning.into(),
            error: Some(error.into()),
        }
    }

    /// Safe default for output that could not be understood.
    pub fn fallback_wait(reasoning: impl Into<String>) -> Self {
        Self::valid(Action::Wait { seconds: 2.0 }, reasoning)
    }

    pub fn terminate(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::valid(
            Action::Terminate {
                reason: reason.clone(),
            },
            reason,
        )
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none() && self.action.is_some()
    }
}

struct Fields<'a> {
    obj: &'a Map<String, Value>,
    action: &'static str,
}

impl<'a> Fields<'a> {
    /// Field value, treating JSON null as absent.
    fn present(&self, key: &str) -> Option<&'a Value> {
        self.obj.get(key).filter(|value| !value.is_null())
    }

    fn string(&self, key: &str) -> Option<String> {
        match self.present(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn require_str(&self, key: &'static str) -> Result<String, ParseError> {
        self.string(key).ok_or(ParseError::MissingField {
            action: self.action,
            field: key,
        })
    }

    fn number(&self, key: &'static str) -> Result<Option<f64>, ParseError> {
        match self.present(key) {
            None => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(Value::String(s)) => {
                s.trim()
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|_| ParseError::InvalidField {
                        field: key,
                        reason: format!("expected a number, got {s:?}"),
                    })
            }
            Some(other) => Err(ParseError::InvalidField {
                field: key,
                reason: format!("expected a number, got {other}"),
            }),
        }
    }

    fn flag(&self, key: &'static str) -> Result<bool, ParseError> {
        match self.present(key) {
            None => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(true),
                "false" | "no" | "0" | "" => Ok(false),
                other => Err(ParseError::InvalidField {
                    field: key,
                    reason: format!("expected a boolean, got {other:?}"),
                }),
            },
            Some(other) => Err(ParseError::InvalidField {
                field: key,
                reason: format!("expected a boolean, got {other}"),
            }),
        }
    }

    fn require_number(&self, key: &'static str) -> Result<f64, ParseError> {
        self.number(key)?.ok_or(ParseError::MissingField {
            action: self.action,
            field: key,
        })
    }

    fn steps(&self) -> Result<u32, ParseError> {
        let steps = self.number("steps")?.unwrap_or(DEFAULT_MOVE_STEPS as f64);
        Ok(steps.clamp(1.0, 100.0) as u32)
    }

    fn button(&self) -> Result<MouseButton, ParseError> {
        match self.string("button").map(|b| b.to_ascii_lowercase()) {
            None => Ok(MouseButton::Left),
            Some(b) if b == "left" => Ok(MouseButton::Left),
            Some(b) if b == "right" => Ok(MouseButton::Right),
            Some(b) if b == "middle" => Ok(MouseButton::Middle),
            Some(other) => Err(ParseError::InvalidField {
                field: "button",
                reason: format!("unknown mouse button {other:?}"),
            }),
        }
    }

    fn keys(&self) -> Result<String, ParseError> {
        self.joined("keys")
            .or_else(|| self.string("key"))
            .ok_or(ParseError::MissingField {
                action: self.action,
                field: "keys",
            })
    }

    /// String field, or a string array joined with spaces.
    fn joined(&self, key: &str) -> Option<String> {
        match self.present(key)? {
            Value::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s.clone()),
                        Value::Null => None,
                        other => Some(other.to_string()),
                    })
                    .collect();
                (!parts.is_empty()).then(|| parts.join(" "))
            }
            _ => self.string(key),
        }
    }

    fn output_format(&self) -> OutputFormat {
        match self.string("output_format").map(|f| f.to_ascii_lowercase()) {
            Some(f) if f == "markdown" || f == "md" => OutputFormat::Markdown,
            Some(f) if f == "csv" => OutputFormat::Csv,
            _ => OutputFormat::Json,
        }
    }

    fn scroll_target(&self) -> Result<ScrollTarget, ParseError> {
        if let Some(element_id) = self.string("element_id") {
            return Ok(ScrollTarget::Element(element_id));
        }
        let direction = self
            .string("direction")
            .ok_or(ParseError::MissingField {
                action: self.action,
                field: "direction",
            })?
            .to_ascii_lowercase();
        let amount = self
            .number("amount")?
            .map(|a| a.abs() as i64)
            .unwrap_or(DEFAULT_SCROLL_PX);
        match direction.as_str() {
            "down" => Ok(ScrollTarget::Pixels(amount)),
            "up" => Ok(ScrollTarget::Pixels(-amount)),
            "top" => Ok(ScrollTarget::Top),
            "bottom" => Ok(ScrollTarget::Bottom),
            other => Err(ParseError::InvalidField {
                field: "direction",
                reason: format!("expected up, down, top or bottom, got {other:?}"),
            }),
        }
    }
}

fn clip(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let mut out: String = value.chars().take(max).collect();
        out.push_str("...");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_element_action_with_only_legal_fields() {
        let action = Action::from_value(&json!({
            "action_type": "input_text",
            "element_id": "e4",
            "text": "rust async",
            "url": "ignored",
            "seconds": 3
        }))
        .expect("action");
        assert_eq!(
            action,
            Action::InputText {
                element_id: "e4".into(),
                text: "rust async".into()
            }
        );
    }

    #[test]
    fn missing_required_field_is_reported() {
        let err = Action::from_value(&json!({"action_type": "click"})).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingField {
                action: "click",
                field: "element_id"
            }
        );
    }

    #[test]
    fn scroll_direction_and_amount_become_signed_pixels() {
        let up = Action::from_value(&json!({"action_type": "scroll", "direction": "up", "amount": "250"}))
            .expect("scroll");
        assert_eq!(up, Action::Scroll { target: ScrollTarget::Pixels(-250) });

        let bottom =
            Action::from_value(&json!({"action_type": "scroll", "direction": "bottom"})).expect("scroll");
        assert_eq!(bottom, Action::Scroll { target: ScrollTarget::Bottom });

        let element =
            Action::from_value(&json!({"action_type": "scroll", "element_id": "e2"})).expect("scroll");
        assert_eq!(element.element_id(), Some("e2"));
    }

    #[test]
    fn unknown_action_type_is_an_error() {
        let err = Action::from_value(&json!({"action_type": "teleport"})).unwrap_err();
        assert_eq!(err, ParseError::UnknownActionType("teleport".into()));
    }

    #[test]
    fn terminate_collects_error_list() {
        let action = Action::from_value(&json!({
            "action_type": "terminate",
            "errors": ["captcha", "login wall"]
        }))
        .expect("terminate");
        assert_eq!(
            action,
            Action::Terminate {
                reason: "captcha login wall".into()
            }
        );
    }

    #[test]
    fn serialized_form_parses_back_to_the_same_variant() {
        let original = Action::DragXy {
            x: 10.0,
            y: 20.0,
            steps: 5,
            button: MouseButton::Left,
        };
        let value = serde_json::to_value(&original).expect("serialize");
        assert_eq!(value["action_type"], "drag_xy");
        let reparsed: Action = serde_json::from_value(value).expect("deserialize");
        assert_eq!(reparsed, original);
    }

    #[test]
    fn screenshot_fields_are_optional() {
        let page = Action::from_value(&json!({"action_type": "screenshot", "full_page": "true"}))
            .expect("screenshot");
        assert_eq!(
            page,
            Action::Screenshot {
                element_id: None,
                full_page: true,
                filename: None
            }
        );
        assert_eq!(page.element_id(), None);

        let element = Action::from_value(&json!({
            "action_type": "take_screenshot",
            "element_id": "e3",
            "filename": "chart"
        }))
        .expect("screenshot");
        assert_eq!(element.element_id(), Some("e3"));
        assert_eq!(element.summary(), "screenshot [e3]");
    }

    #[test]
    fn csv_output_format_is_recognized() {
        let action = Action::from_value(&json!({
            "action_type": "extract",
            "extracted_data": [{"title": "a"}],
            "output_format": "CSV"
        }))
        .expect("extract");
        assert!(matches!(action, Action::Extract { output_format: OutputFormat::Csv, .. }));
    }

    #[test]
    fn negative_wait_is_rejected() {
        let err = Action::from_value(&json!({"action_type": "wait", "seconds": -1})).unwrap_err();
        assert!(matches!(err, ParseError::InvalidField { field: "seconds", .. }));
    }
}
