//! Action execution engine
//!
//! [`ActionExecutor`] maps every typed [`Action`] onto page primitives:
//! 1. click - resolve, then escalate standard → forced → script click
//! 2. type_text - input_text, type_text and keypress
//! 3. select - select_option, hover and upload_file
//! 4. pointer - coordinate-based mouse actions
//! 5. scroll - element into view, signed pixels, top or bottom
//! 6. navigate - goto_url, reload, go_back, go_forward
//! 7. wait - bounded sleep
//! 8. screenshot - viewport, full page or one element, saved as PNG

mod click;
mod navigate;
mod pointer;
mod screenshot;
mod scroll;
mod select;
mod type_text;
mod wait;

pub use click::*;
pub use navigate::*;
pub use pointer::*;
pub use screenshot::*;
pub use scroll::*;
pub use select::*;
pub use type_text::*;
pub use wait::*;

use std::sync::Arc;
use std::time::Instant;

use action_locator::{DefaultElementResolver, ElementResolver, Resolution};
use cdp_adapter::PageDriver;
use chrono::Utc;
use parking_lot::Mutex;
use perceiver_structural::PageSnapshot;
use surfpilot_core_types::{Action, LogCategory, ScrollTarget};
use tracing::{debug, info, warn, Instrument};

use crate::{
    classifier::{FieldClassifier, RuleTableClassifier},
    errors::ActionError,
    types::{ActionReport, ActionResult, ElementTarget, ExecutorConfig},
};

/// Executes actions against one page. Never returns `Err`: every failure becomes a
/// failed [`ActionResult`].
pub struct ActionExecutor {
    page: Arc<dyn PageDriver>,
    resolver: Arc<dyn ElementResolver>,
    classifier: Arc<dyn FieldClassifier>,
    config: ExecutorConfig,
    /// Last pointer position, the origin for moves and drags.
    pointer: Mutex<(f64, f64)>,
}

impl ActionExecutor {
    pub fn new(page: Arc<dyn PageDriver>) -> Self {
        Self {
            page,
            resolver: Arc::new(DefaultElementResolver::new()),
            classifier: Arc::new(RuleTableClassifier::default()),
            config: ExecutorConfig::default(),
            pointer: Mutex::new((0.0, 0.0)),
        }
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ElementResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn FieldClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn page(&self) -> &dyn PageDriver {
        self.page.as_ref()
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub(crate) fn classifier(&self) -> &dyn FieldClassifier {
        self.classifier.as_ref()
    }

    pub(crate) fn pointer(&self) -> (f64, f64) {
        *self.pointer.lock()
    }

    pub(crate) fn set_pointer(&self, x: f64, y: f64) {
        *self.pointer.lock() = (x, y);
    }

    /// Execute an action decided on `snapshot`. Element references are looked up there.
    pub async fn execute(&self, action: &Action, snapshot: &PageSnapshot) -> ActionResult {
        let target = action.element_id().and_then(|raw| {
            snapshot.get(raw).map(|reference| ElementTarget {
                ref_id: reference.ref_id.clone(),
                hints: reference.hints.clone(),
            })
        });
        self.execute_on(action, target).await
    }

    /// Execute an action against previously recorded locator hints.
    pub async fn execute_on(&self, action: &Action, target: Option<ElementTarget>) -> ActionResult {
        let kind = action.kind();
        let started_at = Utc::now();
        let start_instant = Instant::now();

        let outcome = async {
            info!(action = %kind, summary = %action.summary(), "Executing action");
            self.dispatch(action, target.as_ref()).await
        }
        .instrument(LogCategory::Browser.span("executor"))
        .await;

        let latency_ms = start_instant.elapsed().as_millis() as u64;
        match outcome {
            Ok(report) => {
                debug!(action = %kind, latency_ms, attempts = report.attempts, "Action succeeded");
                ActionResult::success(kind, report, started_at, latency_ms).with_target(target)
            }
            Err(err) => {
                warn!(action = %kind, latency_ms, error = %err, "Action failed");
                let attempts = match &err {
                    ActionError::ClickExhausted { attempts, .. } => *attempts,
                    _ => 1,
                };
                ActionResult::failure(kind, err.to_string(), attempts, started_at, latency_ms)
                    .with_target(target)
            }
        }
    }

    async fn dispatch(
        &self,
        action: &Action,
        target: Option<&ElementTarget>,
    ) -> Result<ActionReport, ActionError> {
        match action {
            Action::Click { element_id } => execute_click(self, target, element_id).await,
            Action::InputText { element_id, text } => {
                execute_input_text(self, target, element_id, text).await
            }
            Action::SelectOption { element_id, option } => {
                execute_select(self, target, element_id, option).await
            }
            Action::Hover { element_id } => execute_hover(self, target, element_id).await,
            Action::UploadFile { element_id, path } => {
                execute_upload(self, target, element_id, path).await
            }
            Action::ClickXy { x, y, button } => execute_click_xy(self, *x, *y, *button).await,
            Action::MoveXy { x, y, steps } => execute_move(self, *x, *y, *steps).await,
            Action::DragXy {
                x,
                y,
                steps,
                button,
            } => execute_drag(self, *x, *y, *steps, *button).await,
            Action::MouseDown { x, y, button } => execute_mouse_down(self, *x, *y, *button).await,
            Action::MouseUp { x, y, button } => execute_mouse_up(self, *x, *y, *button).await,
            Action::Wheel {
                x,
                y,
                delta_x,
                delta_y,
            } => execute_wheel(self, *x, *y, *delta_x, *delta_y).await,
            Action::Keypress { keys } => execute_keypress(self, keys).await,
            Action::TypeText { text } => execute_type_text(self, text).await,
            Action::GotoUrl { url } => execute_navigate(self, url).await,
            Action::Reload => execute_reload(self).await,
            Action::GoBack => execute_history(self, HistoryDirection::Back).await,
            Action::GoForward => execute_history(self, HistoryDirection::Forward).await,
            Action::Scroll { target: scroll } => match scroll {
                ScrollTarget::Element(element_id) => {
                    execute_scroll_element(self, target, element_id).await
                }
                other => execute_scroll_window(self, other).await,
            },
            Action::Wait { seconds } => execute_wait(self, *seconds).await,
            Action::Screenshot {
                element_id,
                full_page,
                filename,
            } => {
                execute_screenshot(
                    self,
                    target,
                    element_id.as_deref(),
                    *full_page,
                    filename.as_deref(),
                )
                .await
            }
            // Terminal actions are handled by the caller.
            Action::Extract { .. } | Action::Complete { .. } | Action::Terminate { .. } => {
                Ok(ActionReport::new().with_detail("terminal"))
            }
        }
    }

    /// Re-find the live element for a snapshot reference.
    pub(crate) async fn resolve(
        &self,
        target: Option<&ElementTarget>,
        ref_id: &str,
    ) -> Result<Resolution, ActionError> {
        let target = target.ok_or_else(|| ActionError::UnknownReference(ref_id.to_string()))?;
        let resolution = self
            .resolver
            .resolve(self.page(), &target.ref_id, &target.hints)
            .await?;
        Ok(resolution)
    }

    /// Fixed pause, skipped when configured to zero.
    pub(crate) async fn pause(&self, delay: std::time::Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
