//! In-memory [`PageDriver`] for tests that must not launch a browser.
//!
//! [`FakePage`] keeps a scripted element list, an accessibility tree and a history stack, and
//! records every interaction so tests can assert on what the agent actually did.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use surfpilot_core_types::MouseButton;

use crate::cookies::Cookie;
use crate::driver::{AxNode, ClickMode, ElementHandle, ElementQuery, PageDriver, ScrollTo};
use crate::error::{AdapterError, AdapterErrorKind};

/// What happens to the page when an element is clicked or submitted.
#[derive(Clone, Debug, Default)]
pub enum ClickEffect {
    /// Nothing observable changes.
    None,
    /// Page content changes in place.
    #[default]
    Mutate,
    /// The page navigates.
    Navigate(String),
    /// A new element appears.
    Reveal(Box<FakeElement>),
}

#[derive(Clone, Debug)]
pub struct FakeElement {
    pub handle: String,
    pub tag: String,
    pub role: String,
    pub name: String,
    pub xpath: Option<String>,
    pub attributes: HashMap<String, String>,
    pub selectors: Vec<String>,
    pub value: String,
    pub options: Vec<String>,
    pub failing_click_modes: HashSet<ClickMode>,
    pub on_click: ClickEffect,
    /// Pressing Enter while this element has focus navigates here.
    pub submits_to: Option<String>,
    pub removed: bool,
    pub files: Vec<PathBuf>,
}

impl FakeElement {
    pub fn new(
        handle: impl Into<String>,
        tag: impl Into<String>,
        role: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            handle: handle.into(),
            tag: tag.into(),
            role: role.into(),
            name: name.into(),
            xpath: None,
            attributes: HashMap::new(),
            selectors: Vec::new(),
            value: String::new(),
            options: Vec::new(),
            failing_click_modes: HashSet::new(),
            on_click: ClickEffect::default(),
            submits_to: None,
            removed: false,
            files: Vec::new(),
        }
    }

    pub fn with_xpath(mut self, xpath: impl Into<String>) -> Self {
        self.xpath = Some(xpath.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selectors.push(selector.into());
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn failing_on(mut self, mode: ClickMode) -> Self {
        self.failing_click_modes.insert(mode);
        self
    }

    pub fn on_click(mut self, effect: ClickEffect) -> Self {
        self.on_click = effect;
        self
    }

    pub fn submits_to(mut self, url: impl Into<String>) -> Self {
        self.submits_to = Some(url.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClickRecord {
    pub handle: String,
    pub mode: ClickMode,
    pub succeeded: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MouseRecord {
    Move { x: f64, y: f64 },
    Down { x: f64, y: f64, button: MouseButton },
    Up { x: f64, y: f64, button: MouseButton },
    Wheel { x: f64, y: f64, delta_x: f64, delta_y: f64 },
}

#[derive(Clone, Debug, PartialEq)]
pub enum ScrollRecord {
    Window(ScrollTo),
    Element(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScreenshotRecord {
    pub element: Option<String>,
    pub full_page: bool,
}

/// Bytes every fake capture starts with, so callers can check they got a PNG.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

#[derive(Default)]
struct FakeState {
    history: Vec<String>,
    cursor: usize,
    ax_nodes: Vec<AxNode>,
    ax_error: Option<String>,
    html: String,
    text: String,
    revision: u64,
    elements: Vec<FakeElement>,
    focused: Option<String>,
    hovered: Option<String>,
    keys: Vec<String>,
    clicks: Vec<ClickRecord>,
    mouse: Vec<MouseRecord>,
    scrolls: Vec<ScrollRecord>,
    cookies: Vec<Cookie>,
    init_scripts: Vec<String>,
    evaluations: HashMap<String, Value>,
    failing_urls: HashSet<String>,
    url_failures: usize,
    screenshots: Vec<ScreenshotRecord>,
    close_count: usize,
}

impl FakeState {
    fn url(&self) -> String {
        self.history
            .get(self.cursor)
            .cloned()
            .unwrap_or_else(|| "about:blank".to_string())
    }

    fn navigate(&mut self, url: &str) {
        self.history.truncate(self.cursor + 1);
        self.history.push(url.to_string());
        self.cursor = self.history.len() - 1;
        self.focused = None;
        self.revision += 1;
    }

    fn element(&self, handle: &ElementHandle) -> Result<&FakeElement, AdapterError> {
        self.elements
            .iter()
            .find(|el| el.handle == handle.id && !el.removed)
            .ok_or_else(|| AdapterError::not_found(format!("{} is detached", handle.id)))
    }

    fn element_mut(&mut self, handle: &ElementHandle) -> Result<&mut FakeElement, AdapterError> {
        self.elements
            .iter_mut()
            .find(|el| el.handle == handle.id && !el.removed)
            .ok_or_else(|| AdapterError::not_found(format!("{} is detached", handle.id)))
    }

    fn apply(&mut self, effect: ClickEffect) {
        match effect {
            ClickEffect::None => {}
            ClickEffect::Mutate => self.revision += 1,
            ClickEffect::Navigate(url) => self.navigate(&url),
            ClickEffect::Reveal(element) => {
                self.elements.push(*element);
                self.revision += 1;
            }
        }
    }
}

/// Scripted page. Cheap to clone state out of for assertions.
pub struct FakePage {
    state: Mutex<FakeState>,
}

impl FakePage {
    pub fn new(url: impl Into<String>) -> Self {
        let state = FakeState {
            history: vec![url.into()],
            ..FakeState::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn with_ax_nodes(self, nodes: Vec<AxNode>) -> Self {
        self.state.lock().ax_nodes = nodes;
        self
    }

    pub fn with_html(self, html: impl Into<String>) -> Self {
        self.state.lock().html = html.into();
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.state.lock().text = text.into();
        self
    }

    pub fn with_element(self, element: FakeElement) -> Self {
        self.state.lock().elements.push(element);
        self
    }

    pub fn set_ax_nodes(&self, nodes: Vec<AxNode>) {
        self.state.lock().ax_nodes = nodes;
    }

    pub fn fail_accessibility(&self, reason: impl Into<String>) {
        self.state.lock().ax_error = Some(reason.into());
    }

    pub fn fail_navigation_to(&self, url: impl Into<String>) {
        self.state.lock().failing_urls.insert(url.into());
    }

    /// Make the next `count` calls to [`PageDriver::url`] fail.
    pub fn fail_url_reads(&self, count: usize) {
        self.state.lock().url_failures = count;
    }

    pub fn set_evaluate_result(&self, script: impl Into<String>, value: Value) {
        self.state.lock().evaluations.insert(script.into(), value);
    }

    /// Simulate a navigation the agent did not cause.
    pub fn set_url(&self, url: impl Into<String>) {
        let url = url.into();
        self.state.lock().navigate(&url);
    }

    pub fn remove_element(&self, handle: &str) {
        let mut state = self.state.lock();
        if let Some(el) = state.elements.iter_mut().find(|el| el.handle == handle) {
            el.removed = true;
        }
        state.revision += 1;
    }

    pub fn current_url(&self) -> String {
        self.state.lock().url()
    }

    pub fn value_of(&self, handle: &str) -> Option<String> {
        self.state
            .lock()
            .elements
            .iter()
            .find(|el| el.handle == handle)
            .map(|el| el.value.clone())
    }

    pub fn files_of(&self, handle: &str) -> Vec<PathBuf> {
        self.state
            .lock()
            .elements
            .iter()
            .find(|el| el.handle == handle)
            .map(|el| el.files.clone())
            .unwrap_or_default()
    }

    pub fn clicks(&self) -> Vec<ClickRecord> {
        self.state.lock().clicks.clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.state.lock().keys.clone()
    }

    pub fn mouse_events(&self) -> Vec<MouseRecord> {
        self.state.lock().mouse.clone()
    }

    pub fn scrolls(&self) -> Vec<ScrollRecord> {
        self.state.lock().scrolls.clone()
    }

    pub fn cookies(&self) -> Vec<Cookie> {
        self.state.lock().cookies.clone()
    }

    pub fn init_scripts(&self) -> Vec<String> {
        self.state.lock().init_scripts.clone()
    }

    pub fn focused(&self) -> Option<String> {
        self.state.lock().focused.clone()
    }

    pub fn hovered(&self) -> Option<String> {
        self.state.lock().hovered.clone()
    }

    pub fn revision(&self) -> u64 {
        self.state.lock().revision
    }

    pub fn screenshots(&self) -> Vec<ScreenshotRecord> {
        self.state.lock().screenshots.clone()
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().close_count
    }
}

fn handle_of(element: &FakeElement) -> ElementHandle {
    ElementHandle {
        id: element.handle.clone(),
        description: format!("{} {:?}", element.tag, element.name),
    }
}

fn matches(element: &FakeElement, query: &ElementQuery) -> bool {
    match query {
        ElementQuery::Role { role, name, exact } => {
            if !element.role.eq_ignore_ascii_case(role) {
                return false;
            }
            let have = element.name.trim().to_lowercase();
            let want = name.trim().to_lowercase();
            if *exact {
                have == want
            } else {
                have.contains(&want)
            }
        }
        ElementQuery::XPath { xpath } => element.xpath.as_deref() == Some(xpath.as_str()),
        ElementQuery::Css { selector } => element.selectors.iter().any(|s| s == selector),
        ElementQuery::Attribute { name, value } => {
            element.attributes.get(name).map(String::as_str) == Some(value.as_str())
        }
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn url(&self) -> Result<String, AdapterError> {
        let mut state = self.state.lock();
        if state.url_failures > 0 {
            state.url_failures -= 1;
            return Err(AdapterError::io("target closed while reading url"));
        }
        Ok(state.url())
    }

    async fn accessibility_tree(&self) -> Result<Vec<AxNode>, AdapterError> {
        let state = self.state.lock();
        match &state.ax_error {
            Some(reason) => Err(AdapterError::io(reason.clone())),
            None => Ok(state.ax_nodes.clone()),
        }
    }

    async fn content(&self) -> Result<String, AdapterError> {
        let state = self.state.lock();
        Ok(format!("<!-- rev {} -->{}", state.revision, state.html))
    }

    async fn visible_text(&self) -> Result<String, AdapterError> {
        let state = self.state.lock();
        Ok(format!("{}\nrev {}", state.text, state.revision))
    }

    async fn count_interactive(&self) -> Result<usize, AdapterError> {
        Ok(self.state.lock().elements.iter().filter(|el| !el.removed).count())
    }

    async fn query(&self, query: &ElementQuery) -> Result<Vec<ElementHandle>, AdapterError> {
        Ok(self
            .state
            .lock()
            .elements
            .iter()
            .filter(|el| !el.removed && matches(el, query))
            .map(handle_of)
            .collect())
    }

    async fn attributes(&self, element: &ElementHandle) -> Result<HashMap<String, String>, AdapterError> {
        let state = self.state.lock();
        let el = state.element(element)?;
        let mut attrs = el.attributes.clone();
        attrs.insert("tag".to_string(), el.tag.clone());
        Ok(attrs)
    }

    async fn click(&self, element: &ElementHandle, mode: ClickMode, _timeout: Duration) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        let el = state.element(element)?;
        let succeeded = !el.failing_click_modes.contains(&mode);
        let effect = el.on_click.clone();
        state.clicks.push(ClickRecord {
            handle: element.id.clone(),
            mode,
            succeeded,
        });
        if !succeeded {
            return Err(AdapterError::new(AdapterErrorKind::NotInteractable)
                .with_hint(format!("{} rejected {mode:?} click", element.id)));
        }
        state.focused = Some(element.id.clone());
        state.apply(effect);
        Ok(())
    }

    async fn focus(&self, element: &ElementHandle) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        state.element(element)?;
        state.focused = Some(element.id.clone());
        Ok(())
    }

    async fn clear(&self, element: &ElementHandle) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        state.element_mut(element)?.value.clear();
        Ok(())
    }

    async fn type_char(&self, ch: char) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        let Some(focused) = state.focused.clone() else {
            return Ok(());
        };
        if let Some(el) = state.elements.iter_mut().find(|el| el.handle == focused) {
            el.value.push(ch);
        }
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        state.keys.push(key.to_string());
        if key == "Enter" {
            let target = state.focused.as_ref().and_then(|focused| {
                state
                    .elements
                    .iter()
                    .find(|el| &el.handle == focused)
                    .and_then(|el| el.submits_to.clone())
            });
            if let Some(url) = target {
                state.navigate(&url);
            }
        }
        Ok(())
    }

    async fn select_option(&self, element: &ElementHandle, option: &str) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        let el = state.element_mut(element)?;
        let wanted = option.trim().to_lowercase();
        let Some(found) = el
            .options
            .iter()
            .find(|candidate| candidate.to_lowercase() == wanted)
            .cloned()
        else {
            return Err(AdapterError::new(AdapterErrorKind::OptionNotFound).with_hint(option.to_string()));
        };
        el.value = found;
        state.revision += 1;
        Ok(())
    }

    async fn hover(&self, element: &ElementHandle) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        state.element(element)?;
        state.hovered = Some(element.id.clone());
        Ok(())
    }

    async fn set_files(&self, element: &ElementHandle, files: &[PathBuf]) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        state.element_mut(element)?.files = files.to_vec();
        Ok(())
    }

    async fn mouse_move(&self, x: f64, y: f64) -> Result<(), AdapterError> {
        self.state.lock().mouse.push(MouseRecord::Move { x, y });
        Ok(())
    }

    async fn mouse_down(&self, x: f64, y: f64, button: MouseButton) -> Result<(), AdapterError> {
        self.state.lock().mouse.push(MouseRecord::Down { x, y, button });
        Ok(())
    }

    async fn mouse_up(&self, x: f64, y: f64, button: MouseButton) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        state.mouse.push(MouseRecord::Up { x, y, button });
        state.revision += 1;
        Ok(())
    }

    async fn wheel(&self, x: f64, y: f64, delta_x: f64, delta_y: f64) -> Result<(), AdapterError> {
        self.state.lock().mouse.push(MouseRecord::Wheel {
            x,
            y,
            delta_x,
            delta_y,
        });
        Ok(())
    }

    async fn scroll_into_view(&self, element: &ElementHandle) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        state.element(element)?;
        state.scrolls.push(ScrollRecord::Element(element.id.clone()));
        Ok(())
    }

    async fn scroll_window(&self, to: ScrollTo) -> Result<(), AdapterError> {
        self.state.lock().scrolls.push(ScrollRecord::Window(to));
        Ok(())
    }

    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        if state.failing_urls.contains(url) {
            return Err(AdapterError::timeout(format!(
                "navigation to {url} exceeded {}ms",
                timeout.as_millis()
            )));
        }
        state.navigate(url);
        Ok(())
    }

    async fn reload(&self, _timeout: Duration) -> Result<(), AdapterError> {
        self.state.lock().revision += 1;
        Ok(())
    }

    async fn go_back(&self) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        if state.cursor > 0 {
            state.cursor -= 1;
            state.revision += 1;
        }
        Ok(())
    }

    async fn go_forward(&self) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        if state.cursor + 1 < state.history.len() {
            state.cursor += 1;
            state.revision += 1;
        }
        Ok(())
    }

    async fn wait_for_load(&self, _timeout: Duration) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, AdapterError> {
        Ok(self
            .state
            .lock()
            .evaluations
            .get(script)
            .cloned()
            .unwrap_or(Value::Null))
    }

    async fn screenshot(&self, full_page: bool) -> Result<Vec<u8>, AdapterError> {
        let mut state = self.state.lock();
        state.screenshots.push(ScreenshotRecord {
            element: None,
            full_page,
        });
        Ok(fake_png(&state.url()))
    }

    async fn element_screenshot(&self, element: &ElementHandle) -> Result<Vec<u8>, AdapterError> {
        let mut state = self.state.lock();
        state.element(element)?;
        state.screenshots.push(ScreenshotRecord {
            element: Some(element.id.clone()),
            full_page: false,
        });
        Ok(fake_png(&element.id))
    }

    async fn set_cookies(&self, cookies: &[Cookie]) -> Result<(), AdapterError> {
        self.state.lock().cookies.extend_from_slice(cookies);
        Ok(())
    }

    async fn add_init_script(&self, source: &str) -> Result<(), AdapterError> {
        self.state.lock().init_scripts.push(source.to_string());
        Ok(())
    }

    async fn close(&self) -> Result<(), AdapterError> {
        self.state.lock().close_count += 1;
        Ok(())
    }
}

fn fake_png(tag: &str) -> Vec<u8> {
    let mut bytes = PNG_SIGNATURE.to_vec();
    bytes.extend_from_slice(tag.as_bytes());
    bytes
}
