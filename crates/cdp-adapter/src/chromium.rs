use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::accessibility::GetFullAxTreeParams;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, MouseButton as CdpMouseButton,
};
use chromiumoxide::cdp::browser_protocol::network::{SetCookieParams, TimeSinceEpoch};
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat, ReloadParams, Viewport,
};
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use serde_json::Value;
use surfpilot_core_types::MouseButton;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::LaunchOptions;
use crate::cookies::Cookie;
use crate::driver::{AxNode, ClickMode, ElementHandle, ElementQuery, PageDriver, ScrollTo};
use crate::error::{AdapterError, AdapterErrorKind};
use crate::scripts;

const LOAD_POLL: Duration = Duration::from_millis(100);

/// [`PageDriver`] over a locally launched Chromium.
pub struct ChromiumDriver {
    browser: tokio::sync::Mutex<Option<Browser>>,
    page: Page,
    handler: parking_lot::Mutex<Option<JoinHandle<()>>>,
    default_timeout: Duration,
}

impl ChromiumDriver {
    pub async fn launch(options: &LaunchOptions) -> Result<Self, AdapterError> {
        let mut builder = BrowserConfig::builder()
            .window_size(options.viewport_width, options.viewport_height)
            .viewport(None)
            .request_timeout(Duration::from_millis(options.navigation_timeout_ms));
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &options.executable {
            builder = builder.chrome_executable(executable);
        }
        if let Some(dir) = &options.user_data_dir {
            builder = builder.user_data_dir(dir);
        }
        if let Some(ua) = &options.user_agent {
            builder = builder.arg(format!("--user-agent={ua}"));
        }
        for arg in &options.args {
            builder = builder.arg(arg.as_str());
        }
        let config = builder.build().map_err(|err| {
            AdapterError::new(AdapterErrorKind::Launch).with_hint(format!("invalid browser config: {err}"))
        })?;

        info!(
            headless = options.headless,
            executable = ?options.executable,
            "Launching Chromium"
        );
        let (browser, mut handler) = Browser::launch(config).await.map_err(|err| {
            AdapterError::new(AdapterErrorKind::Launch).with_hint(err.to_string())
        })?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(error = %err, "CDP handler stopped");
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(err) => {
                handler_task.abort();
                return Err(AdapterError::new(AdapterErrorKind::Launch)
                    .with_hint(format!("failed to open page: {err}")));
            }
        };

        Ok(Self {
            browser: tokio::sync::Mutex::new(Some(browser)),
            page,
            handler: parking_lot::Mutex::new(Some(handler_task)),
            default_timeout: Duration::from_millis(options.default_timeout_ms),
        })
    }

    async fn bounded<T, E, F>(&self, what: &str, limit: Duration, fut: F) -> Result<T, AdapterError>
    where
        E: Display,
        F: Future<Output = Result<T, E>>,
    {
        match tokio::time::timeout(limit, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(AdapterError::io(format!("{what}: {err}"))),
            Err(_) => Err(AdapterError::timeout(format!(
                "{what} exceeded {}ms",
                limit.as_millis()
            ))),
        }
    }

    async fn eval_value(&self, script: String) -> Result<Value, AdapterError> {
        let result = self
            .bounded("evaluate", self.default_timeout, self.page.evaluate(script))
            .await?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    /// Evaluate an element script and translate its `{ok, reason}` envelope.
    async fn element_call(&self, element: &ElementHandle, script: String) -> Result<Value, AdapterError> {
        let value = self.eval_value(script).await?;
        if value.get("ok").and_then(Value::as_bool) == Some(true) {
            return Ok(value);
        }
        let reason = value
            .get("reason")
            .and_then(Value::as_str)
            .unwrap_or("element rejected the operation");
        let kind = match reason {
            "detached" => AdapterErrorKind::TargetNotFound,
            "option" => AdapterErrorKind::OptionNotFound,
            _ => AdapterErrorKind::NotInteractable,
        };
        Err(AdapterError::new(kind).with_hint(format!("{}: {reason}", element.description)))
    }

    async fn dispatch_mouse(
        &self,
        kind: DispatchMouseEventType,
        x: f64,
        y: f64,
        button: Option<MouseButton>,
    ) -> Result<(), AdapterError> {
        let mut builder = DispatchMouseEventParams::builder().r#type(kind).x(x).y(y);
        if let Some(button) = button {
            builder = builder.button(cdp_button(button)).click_count(1);
        }
        let params = builder.build().map_err(AdapterError::io)?;
        self.bounded("mouse event", self.default_timeout, self.page.execute(params))
            .await?;
        Ok(())
    }

    async fn dispatch_key(
        &self,
        kind: DispatchKeyEventType,
        key: &KeySpec,
        modifiers: i64,
    ) -> Result<(), AdapterError> {
        let mut builder = DispatchKeyEventParams::builder()
            .r#type(kind.clone())
            .key(key.key.clone())
            .code(key.code.clone())
            .modifiers(modifiers);
        if let Some(vk) = key.virtual_key {
            builder = builder
                .windows_virtual_key_code(vk)
                .native_virtual_key_code(vk);
        }
        if matches!(kind, DispatchKeyEventType::Char) {
            if let Some(text) = &key.text {
                builder = builder.text(text.clone());
            }
        }
        let params = builder.build().map_err(AdapterError::io)?;
        self.bounded("key event", self.default_timeout, self.page.execute(params))
            .await?;
        Ok(())
    }

    async fn element_center(&self, element: &ElementHandle) -> Result<Value, AdapterError> {
        self.element_call(element, scripts::click_point(&element.id)).await
    }

    async fn pointer_click(&self, element: &ElementHandle, hit_test: bool) -> Result<(), AdapterError> {
        let point = self.element_center(element).await?;
        if point.get("disabled").and_then(Value::as_bool) == Some(true) {
            return Err(AdapterError::new(AdapterErrorKind::NotInteractable)
                .with_hint(format!("{} is disabled", element.description)));
        }
        if hit_test && point.get("hit").and_then(Value::as_bool) != Some(true) {
            return Err(AdapterError::new(AdapterErrorKind::NotInteractable)
                .with_hint(format!("{} is covered by another element", element.description)));
        }
        let x = point.get("x").and_then(Value::as_f64).unwrap_or_default();
        let y = point.get("y").and_then(Value::as_f64).unwrap_or_default();
        self.click_at(x, y, MouseButton::Left).await
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn url(&self) -> Result<String, AdapterError> {
        let url = self
            .bounded("url", self.default_timeout, self.page.url())
            .await?;
        Ok(url.unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn accessibility_tree(&self) -> Result<Vec<AxNode>, AdapterError> {
        let response = self
            .bounded(
                "accessibility tree",
                self.default_timeout,
                self.page.execute(GetFullAxTreeParams::default()),
            )
            .await?;
        let nodes = response
            .result
            .nodes
            .iter()
            .filter_map(|node| serde_json::to_value(node).ok())
            .filter_map(|raw| AxNode::from_cdp_json(&raw))
            .collect();
        Ok(nodes)
    }

    async fn content(&self) -> Result<String, AdapterError> {
        self.bounded("content", self.default_timeout, self.page.content())
            .await
    }

    async fn visible_text(&self) -> Result<String, AdapterError> {
        let value = self.eval_value(scripts::VISIBLE_TEXT.to_string()).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn count_interactive(&self) -> Result<usize, AdapterError> {
        let value = self.eval_value(scripts::count_interactive()).await?;
        Ok(value.as_u64().unwrap_or_default() as usize)
    }

    async fn query(&self, query: &ElementQuery) -> Result<Vec<ElementHandle>, AdapterError> {
        let value = self.eval_value(scripts::query(query)).await?;
        let handles = value
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        Some(ElementHandle {
                            id: item.get("handle")?.as_str()?.to_string(),
                            description: item
                                .get("description")
                                .and_then(Value::as_str)
                                .unwrap_or_default()
                                .to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(handles)
    }

    async fn attributes(
        &self,
        element: &ElementHandle,
    ) -> Result<HashMap<String, String>, AdapterError> {
        let value = self
            .element_call(element, scripts::attributes(&element.id))
            .await?;
        let attrs = value
            .get("attrs")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .map(|(k, v)| (k.clone(), v.as_str().unwrap_or_default().to_string()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(attrs)
    }

    async fn click(
        &self,
        element: &ElementHandle,
        mode: ClickMode,
        timeout: Duration,
    ) -> Result<(), AdapterError> {
        let attempt = async {
            match mode {
                ClickMode::Standard => self.pointer_click(element, true).await,
                ClickMode::Forced => self.pointer_click(element, false).await,
                ClickMode::Script => self
                    .element_call(element, scripts::script_click(&element.id))
                    .await
                    .map(|_| ()),
            }
        };
        match tokio::time::timeout(timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(AdapterError::timeout(format!(
                "click on {} exceeded {}ms",
                element.description,
                timeout.as_millis()
            ))),
        }
    }

    async fn focus(&self, element: &ElementHandle) -> Result<(), AdapterError> {
        self.element_call(element, scripts::focus(&element.id))
            .await
            .map(|_| ())
    }

    async fn clear(&self, element: &ElementHandle) -> Result<(), AdapterError> {
        self.element_call(element, scripts::clear(&element.id))
            .await
            .map(|_| ())
    }

    async fn type_char(&self, ch: char) -> Result<(), AdapterError> {
        match ch {
            '\n' => self.press_key("Enter").await,
            '\t' => self.press_key("Tab").await,
            _ => {
                let params = DispatchKeyEventParams::builder()
                    .r#type(DispatchKeyEventType::Char)
                    .text(ch.to_string())
                    .build()
                    .map_err(AdapterError::io)?;
                self.bounded("type", self.default_timeout, self.page.execute(params))
                    .await?;
                Ok(())
            }
        }
    }

    async fn press_key(&self, key: &str) -> Result<(), AdapterError> {
        let (modifiers, key) = split_chord(key);
        let spec = KeySpec::for_key(key);
        self.dispatch_key(DispatchKeyEventType::KeyDown, &spec, modifiers)
            .await?;
        if spec.text.is_some() && modifiers == 0 {
            self.dispatch_key(DispatchKeyEventType::Char, &spec, modifiers)
                .await?;
        }
        self.dispatch_key(DispatchKeyEventType::KeyUp, &spec, modifiers)
            .await
    }

    async fn select_option(&self, element: &ElementHandle, option: &str) -> Result<(), AdapterError> {
        self.element_call(element, scripts::select_option(&element.id, option))
            .await
            .map(|_| ())
    }

    async fn hover(&self, element: &ElementHandle) -> Result<(), AdapterError> {
        let point = self.element_center(element).await?;
        let x = point.get("x").and_then(Value::as_f64).unwrap_or_default();
        let y = point.get("y").and_then(Value::as_f64).unwrap_or_default();
        self.mouse_move(x, y).await
    }

    async fn set_files(&self, element: &ElementHandle, files: &[PathBuf]) -> Result<(), AdapterError> {
        let selector = format!("[{}=\"{}\"]", scripts::HANDLE_ATTR, element.id);
        let node = self
            .bounded("find file input", self.default_timeout, self.page.find_element(selector))
            .await?;
        let files = files
            .iter()
            .map(|path| path.to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        let params = SetFileInputFilesParams::builder()
            .files(files)
            .backend_node_id(node.backend_node_id)
            .build()
            .map_err(AdapterError::io)?;
        self.bounded("set files", self.default_timeout, self.page.execute(params))
            .await?;
        Ok(())
    }

    async fn mouse_move(&self, x: f64, y: f64) -> Result<(), AdapterError> {
        self.dispatch_mouse(DispatchMouseEventType::MouseMoved, x, y, None)
            .await
    }

    async fn mouse_down(&self, x: f64, y: f64, button: MouseButton) -> Result<(), AdapterError> {
        self.dispatch_mouse(DispatchMouseEventType::MousePressed, x, y, Some(button))
            .await
    }

    async fn mouse_up(&self, x: f64, y: f64, button: MouseButton) -> Result<(), AdapterError> {
        self.dispatch_mouse(DispatchMouseEventType::MouseReleased, x, y, Some(button))
            .await
    }

    async fn wheel(&self, x: f64, y: f64, delta_x: f64, delta_y: f64) -> Result<(), AdapterError> {
        let params = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseWheel)
            .x(x)
            .y(y)
            .delta_x(delta_x)
            .delta_y(delta_y)
            .build()
            .map_err(AdapterError::io)?;
        self.bounded("wheel", self.default_timeout, self.page.execute(params))
            .await?;
        Ok(())
    }

    async fn scroll_into_view(&self, element: &ElementHandle) -> Result<(), AdapterError> {
        self.element_call(element, scripts::scroll_into_view(&element.id))
            .await
            .map(|_| ())
    }

    async fn scroll_window(&self, to: ScrollTo) -> Result<(), AdapterError> {
        self.eval_value(scripts::scroll_window(to)).await.map(|_| ())
    }

    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), AdapterError> {
        self.bounded("navigation", timeout, self.page.goto(url))
            .await
            .map(|_| ())
    }

    async fn reload(&self, timeout: Duration) -> Result<(), AdapterError> {
        self.bounded("reload", timeout, self.page.execute(ReloadParams::default()))
            .await?;
        Ok(())
    }

    async fn go_back(&self) -> Result<(), AdapterError> {
        self.eval_value("history.back(); true".to_string())
            .await
            .map(|_| ())
    }

    async fn go_forward(&self) -> Result<(), AdapterError> {
        self.eval_value("history.forward(); true".to_string())
            .await
            .map(|_| ())
    }

    async fn wait_for_load(&self, timeout: Duration) -> Result<(), AdapterError> {
        let poll = async {
            loop {
                let state = self.eval_value(scripts::READY_STATE.to_string()).await?;
                if state.as_str() == Some("complete") {
                    return Ok::<(), AdapterError>(());
                }
                tokio::time::sleep(LOAD_POLL).await;
            }
        };
        match tokio::time::timeout(timeout, poll).await {
            Ok(result) => result,
            Err(_) => Err(AdapterError::timeout(format!(
                "page did not finish loading within {}ms",
                timeout.as_millis()
            ))),
        }
    }

    async fn evaluate(&self, script: &str) -> Result<Value, AdapterError> {
        self.eval_value(script.to_string()).await
    }

    async fn screenshot(&self, full_page: bool) -> Result<Vec<u8>, AdapterError> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(full_page)
            .build();
        self.bounded("screenshot", self.default_timeout, self.page.screenshot(params))
            .await
    }

    async fn element_screenshot(&self, element: &ElementHandle) -> Result<Vec<u8>, AdapterError> {
        let rect = self.element_call(element, scripts::element_rect(&element.id)).await?;
        let field = |key: &str| rect.get(key).and_then(Value::as_f64).unwrap_or_default();
        let clip = Viewport {
            x: field("x"),
            y: field("y"),
            width: field("width"),
            height: field("height"),
            scale: 1.0,
        };
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .clip(clip)
            .capture_beyond_viewport(true)
            .build();
        self.bounded("element screenshot", self.default_timeout, self.page.screenshot(params))
            .await
    }

    async fn set_cookies(&self, cookies: &[Cookie]) -> Result<(), AdapterError> {
        for cookie in cookies {
            let mut builder = SetCookieParams::builder()
                .name(cookie.name.clone())
                .value(cookie.value.clone());
            if let Some(domain) = &cookie.domain {
                builder = builder.domain(domain.clone());
            }
            if let Some(path) = &cookie.path {
                builder = builder.path(path.clone());
            }
            if let Some(url) = &cookie.url {
                builder = builder.url(url.clone());
            }
            if let Some(secure) = cookie.secure {
                builder = builder.secure(secure);
            }
            if let Some(http_only) = cookie.http_only {
                builder = builder.http_only(http_only);
            }
            if let Some(expires) = cookie.expires {
                builder = builder.expires(TimeSinceEpoch::new(expires));
            }
            let params = builder.build().map_err(AdapterError::io)?;
            if let Err(err) = self
                .bounded("set cookie", self.default_timeout, self.page.execute(params))
                .await
            {
                warn!(cookie = %cookie.name, error = %err, "Cookie rejected by browser");
            }
        }
        Ok(())
    }

    async fn add_init_script(&self, source: &str) -> Result<(), AdapterError> {
        let params = AddScriptToEvaluateOnNewDocumentParams::builder()
            .source(source.to_string())
            .build()
            .map_err(AdapterError::io)?;
        self.bounded("init script", self.default_timeout, self.page.execute(params))
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), AdapterError> {
        let browser = self.browser.lock().await.take();
        let result = match browser {
            Some(mut browser) => {
                let closed = browser.close().await.map(|_| ());
                if let Err(err) = browser.wait().await {
                    debug!(error = %err, "Browser process wait failed");
                }
                closed.map_err(|err| AdapterError::io(format!("close: {err}")))
            }
            None => Ok(()),
        };
        if let Some(handler) = self.handler.lock().take() {
            handler.abort();
        }
        result
    }
}

fn cdp_button(button: MouseButton) -> CdpMouseButton {
    match button {
        MouseButton::Left => CdpMouseButton::Left,
        MouseButton::Right => CdpMouseButton::Right,
        MouseButton::Middle => CdpMouseButton::Middle,
    }
}

struct KeySpec {
    key: String,
    code: String,
    text: Option<String>,
    virtual_key: Option<i64>,
}

impl KeySpec {
    fn for_key(key: &str) -> Self {
        let (code, text, vk): (&str, Option<&str>, Option<i64>) = match key {
            "Enter" | "Return" => ("Enter", Some("\r"), Some(13)),
            "Tab" => ("Tab", Some("\t"), Some(9)),
            "Escape" | "Esc" => ("Escape", None, Some(27)),
            "Backspace" => ("Backspace", None, Some(8)),
            "Delete" => ("Delete", None, Some(46)),
            "ArrowUp" => ("ArrowUp", None, Some(38)),
            "ArrowDown" => ("ArrowDown", None, Some(40)),
            "ArrowLeft" => ("ArrowLeft", None, Some(37)),
            "ArrowRight" => ("ArrowRight", None, Some(39)),
            "Home" => ("Home", None, Some(36)),
            "End" => ("End", None, Some(35)),
            "PageUp" => ("PageUp", None, Some(33)),
            "PageDown" => ("PageDown", None, Some(34)),
            "Space" | " " => ("Space", Some(" "), Some(32)),
            other => {
                let mut chars = other.chars();
                return match (chars.next(), chars.next()) {
                    (Some(ch), None) => {
                        let upper = ch.to_ascii_uppercase();
                        let code = if upper.is_ascii_alphabetic() {
                            format!("Key{upper}")
                        } else if upper.is_ascii_digit() {
                            format!("Digit{upper}")
                        } else {
                            other.to_string()
                        };
                        Self {
                            key: other.to_string(),
                            code,
                            text: Some(other.to_string()),
                            virtual_key: upper.is_ascii_alphanumeric().then_some(upper as i64),
                        }
                    }
                    _ => Self {
                        key: other.to_string(),
                        code: other.to_string(),
                        text: None,
                        virtual_key: None,
                    },
                };
            }
        };
        let key = match key {
            "Return" => "Enter",
            "Esc" => "Escape",
            "Space" => " ",
            other => other,
        };
        Self {
            key: key.to_string(),
            code: code.to_string(),
            text: text.map(str::to_string),
            virtual_key: vk,
        }
    }
}

/// Split `Control+Shift+A` into a CDP modifier bitmask and the final key.
fn split_chord(raw: &str) -> (i64, &str) {
    let parts: Vec<&str> = raw.split('+').map(str::trim).filter(|p| !p.is_empty()).collect();
    let Some((key, mods)) = parts.split_last() else {
        return (0, raw);
    };
    let mask = mods.iter().fold(0, |acc, m| {
        acc | match m.to_ascii_lowercase().as_str() {
            "alt" | "option" => 1,
            "control" | "ctrl" => 2,
            "meta" | "cmd" | "command" => 4,
            "shift" => 8,
            _ => 0,
        }
    });
    (mask, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chords_become_modifier_masks() {
        assert_eq!(split_chord("Control+A"), (2, "A"));
        assert_eq!(split_chord("ctrl+shift+Tab"), (10, "Tab"));
        assert_eq!(split_chord("Enter"), (0, "Enter"));
        // A lone plus sign is a key, not a separator.
        assert_eq!(split_chord("+"), (0, "+"));
    }

    #[test]
    fn named_keys_carry_virtual_codes() {
        let enter = KeySpec::for_key("Enter");
        assert_eq!(enter.virtual_key, Some(13));
        assert_eq!(enter.text.as_deref(), Some("\r"));

        let letter = KeySpec::for_key("a");
        assert_eq!(letter.code, "KeyA");
        assert_eq!(letter.virtual_key, Some('A' as i64));
    }
}
