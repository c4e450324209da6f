//! Static action registration table.
//!
//! Every action the agent understands is listed here once, in a fixed order, together with
//! the aliases models tend to emit and the fields the prompt advertises for it.

use serde::{Deserialize, Serialize};

use crate::action::ActionKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    Element,
    Coordinate,
    Keyboard,
    Navigation,
    Control,
    Terminal,
}

#[derive(Debug)]
pub struct ActionSpec {
    pub kind: ActionKind,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub category: ActionCategory,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    pub description: &'static str,
}

pub static ACTION_REGISTRY: &[ActionSpec] = &[
    ActionSpec {
        kind: ActionKind::Click,
        name: "click",
        aliases: &["click_element", "click_button", "click_link", "tap", "press_button"],
        category: ActionCategory::Element,
        required: &["element_id"],
        optional: &[],
        description: "click an element from the snapshot",
    },
    ActionSpec {
        kind: ActionKind::InputText,
        name: "input_text",
        aliases: &["fill", "fill_input", "input", "enter_text", "type_into", "set_value"],
        category: ActionCategory::Element,
        required: &["element_id", "text"],
        optional: &[],
        description: "replace the value of a text field",
    },
    ActionSpec {
        kind: ActionKind::SelectOption,
        name: "select_option",
        aliases: &["select", "choose_option", "select_dropdown"],
        category: ActionCategory::Element,
        required: &["element_id", "option"],
        optional: &[],
        description: "pick an option in a dropdown",
    },
    ActionSpec {
        kind: ActionKind::Hover,
        name: "hover",
        aliases: &["hover_element", "mouse_over"],
        category: ActionCategory::Element,
        required: &["element_id"],
        optional: &[],
        description: "hover over an element",
    },
    ActionSpec {
        kind: ActionKind::UploadFile,
        name: "upload_file",
        aliases: &["upload", "attach_file"],
        category: ActionCategory::Element,
        required: &["element_id", "path"],
        optional: &[],
        description: "attach a local file to a file input",
    },
    ActionSpec {
        kind: ActionKind::ClickXy,
        name: "click_xy",
        aliases: &["click_at", "click_coordinates", "click_position"],
        category: ActionCategory::Coordinate,
        required: &["x", "y"],
        optional: &["button"],
        description: "click at viewport coordinates",
    },
    ActionSpec {
        kind: ActionKind::MoveXy,
        name: "move_xy",
        aliases: &["move_mouse", "mouse_move", "move_to"],
        category: ActionCategory::Coordinate,
        required: &["x", "y"],
        optional: &["steps"],
        description: "move the pointer to viewport coordinates",
    },
    ActionSpec {
        kind: ActionKind::DragXy,
        name: "drag_xy",
        aliases: &["drag", "drag_to", "drag_and_drop"],
        category: ActionCategory::Coordinate,
        required: &["x", "y"],
        optional: &["steps", "button"],
        description: "drag from the current pointer position to coordinates",
    },
    ActionSpec {
        kind: ActionKind::MouseDown,
        name: "mouse_down",
        aliases: &["mousedown", "press_mouse"],
        category: ActionCategory::Coordinate,
        required: &["x", "y"],
        optional: &["button"],
        description: "press a mouse button at coordinates",
    },
    ActionSpec {
        kind: ActionKind::MouseUp,
        name: "mouse_up",
        aliases: &["mouseup", "release_mouse"],
        category: ActionCategory::Coordinate,
        required: &["x", "y"],
        optional: &["button"],
        description: "release a mouse button at coordinates",
    },
    ActionSpec {
        kind: ActionKind::Wheel,
        name: "wheel",
        aliases: &["mouse_wheel", "scroll_wheel"],
        category: ActionCategory::Coordinate,
        required: &["x", "y"],
        optional: &["direction", "amount"],
        description: "dispatch a wheel event at coordinates",
    },
    ActionSpec {
        kind: ActionKind::Keypress,
        name: "keypress",
        aliases: &["press_key", "key_press", "press", "send_keys", "hotkey"],
        category: ActionCategory::Keyboard,
        required: &["keys"],
        optional: &[],
        description: "press keys such as Enter, Tab or Control+A",
    },
    ActionSpec {
        kind: ActionKind::TypeText,
        name: "type_text",
        aliases: &["type", "keyboard_type", "type_keys"],
        category: ActionCategory::Keyboard,
        required: &["text"],
        optional: &[],
        description: "type text into the focused element",
    },
    ActionSpec {
        kind: ActionKind::GotoUrl,
        name: "goto_url",
        aliases: &["goto", "navigate", "go_to_url", "open_url", "visit", "open"],
        category: ActionCategory::Navigation,
        required: &["url"],
        optional: &[],
        description: "navigate to a URL",
    },
    ActionSpec {
        kind: ActionKind::Reload,
        name: "reload",
        aliases: &["refresh", "reload_page"],
        category: ActionCategory::Navigation,
        required: &[],
        optional: &[],
        description: "reload the current page",
    },
    ActionSpec {
        kind: ActionKind::GoBack,
        name: "go_back",
        aliases: &["back", "navigate_back", "history_back"],
        category: ActionCategory::Navigation,
        required: &[],
        optional: &[],
        description: "go back in history",
    },
    ActionSpec {
        kind: ActionKind::GoForward,
        name: "go_forward",
        aliases: &["forward", "navigate_forward", "history_forward"],
        category: ActionCategory::Navigation,
        required: &[],
        optional: &[],
        description: "go forward in history",
    },
    ActionSpec {
        kind: ActionKind::Scroll,
        name: "scroll",
        aliases: &["scroll_page", "scroll_to"],
        category: ActionCategory::Navigation,
        required: &["direction"],
        optional: &["amount", "element_id"],
        description: "scroll up/down by pixels, to top/bottom, or to an element",
    },
    ActionSpec {
        kind: ActionKind::Wait,
        name: "wait",
        aliases: &["sleep", "pause", "delay"],
        category: ActionCategory::Control,
        required: &["seconds"],
        optional: &[],
        description: "wait for the page to change",
    },
    ActionSpec {
        kind: ActionKind::Screenshot,
        name: "screenshot",
        aliases: &["take_screenshot", "capture_screenshot", "snap"],
        category: ActionCategory::Control,
        required: &[],
        optional: &["element_id", "full_page", "filename"],
        description: "save a PNG of the viewport, the full page, or one element",
    },
    ActionSpec {
        kind: ActionKind::Extract,
        name: "extract",
        aliases: &["extract_data", "scrape", "save_data"],
        category: ActionCategory::Terminal,
        required: &["extracted_data"],
        optional: &["output_format", "output_title"],
        description: "save structured data read from the page as json, markdown or csv",
    },
    ActionSpec {
        kind: ActionKind::Complete,
        name: "complete",
        aliases: &["done", "finish", "task_complete", "success"],
        category: ActionCategory::Terminal,
        required: &[],
        optional: &["extracted_data", "output_format", "output_title"],
        description: "the goal is achieved",
    },
    ActionSpec {
        kind: ActionKind::Terminate,
        name: "terminate",
        aliases: &["fail", "abort", "stop", "give_up", "quit"],
        category: ActionCategory::Terminal,
        required: &[],
        optional: &["errors"],
        description: "the goal cannot be achieved",
    },
];

/// Registry entry for a kind. Every kind has exactly one entry.
pub fn lookup(kind: ActionKind) -> &'static ActionSpec {
    ACTION_REGISTRY
        .iter()
        .find(|spec| spec.kind == kind)
        .unwrap_or(&ACTION_REGISTRY[ACTION_REGISTRY.len() - 1])
}

/// Map a raw `action_type` (canonical name or alias, any case, `-` or space separated)
/// to its kind.
pub fn normalize_action_type(raw: &str) -> Option<ActionKind> {
    let key: String = raw
        .trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' | '.' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect();
    ACTION_REGISTRY
        .iter()
        .find(|spec| spec.name == key || spec.aliases.contains(&key.as_str()))
        .map(|spec| spec.kind)
}
