//! gpui rendering of popup sessions.
//!
//! [`PopupController`] owns the [`PopupLifecycle`] and the open window
//! handles. Each [`PopupWindow`] talks back to it only through
//! [`PopupEvent`]s on an `async_channel`; the controller never reads view
//! state directly.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use gpui::{
    div, point, prelude::*, px, rgb, size, App, Bounds, Context, Render, SharedString,
    Subscription, Timer, Window, WindowBackgroundAppearance, WindowBounds, WindowHandle,
    WindowKind, WindowOptions,
};
use tracing::{debug, warn};

use super::lifecycle::{CaptureOutcome, PopupHost, PopupId, PopupLifecycle};
use super::session::{PopupSession, ResultArea, NOTIFICATION_DURATION};
use crate::config::PopupConfig;
use crate::context::{ActionKind, Language, Tone};
use crate::dispatcher::{spawn_dispatch, Settlement};
use crate::geometry::{Rect, Size};
use crate::logging;
use crate::menu::MenuCommand;
use crate::platform;
use crate::protocol::{Message, SelectionPayload};
use crate::selected_text::{copy_to_clipboard, SelectionCapture};
use crate::selection::AverageAdvance;
use crate::transform::TextTransform;

pub(crate) const BACKGROUND: u32 = 0x1e1e1e;
pub(crate) const SURFACE: u32 = 0x2a2a2a;
pub(crate) const TEXT: u32 = 0xffffff;
pub(crate) const MUTED: u32 = 0x9a9a9a;
pub(crate) const ACCENT: u32 = 0x0078d4;
pub(crate) const ERROR: u32 = 0xe5534b;

/// Popup -> controller.
#[derive(Debug, Clone, PartialEq)]
pub enum PopupEvent {
    /// First frame rendered; the payload may be pushed now.
    Ready(PopupId),
    Blurred(PopupId),
    /// `window:*` chrome message from the popup.
    Chrome(PopupId, Message),
}

/// What every popup window needs.
#[derive(Clone)]
pub struct PopupDeps {
    pub config: PopupConfig,
    pub transform: Arc<dyn TextTransform>,
    pub default_tone: Tone,
    pub events: async_channel::Sender<PopupEvent>,
}

/// Small rounded button; `primary` gets the accent background.
pub(crate) fn button(
    id: impl Into<gpui::ElementId>,
    label: String,
    enabled: bool,
    primary: bool,
) -> gpui::Stateful<gpui::Div> {
    let bg = if primary { ACCENT } else { SURFACE };
    div()
        .id(id)
        .px(px(10.))
        .py(px(4.))
        .rounded(px(4.))
        .bg(rgb(bg))
        .text_xs()
        .text_color(rgb(if enabled { TEXT } else { MUTED }))
        .when(enabled, |el| el.cursor_pointer().hover(|s| s.opacity(0.85)))
        .child(label)
}

pub struct PopupWindow {
    session: PopupSession,
    deps: PopupDeps,
    handle: Option<WindowHandle<PopupWindow>>,
    announced_ready: bool,
    _activation: Subscription,
}

impl PopupWindow {
    fn new(id: PopupId, deps: PopupDeps, window: &mut Window, cx: &mut Context<Self>) -> Self {
        let activation = cx.observe_window_activation(window, |this: &mut Self, window, _cx| {
            if !window.is_window_active() {
                this.send(PopupEvent::Blurred(this.session.id()));
            }
        });
        Self {
            session: PopupSession::new(id, &deps.config),
            deps,
            handle: None,
            announced_ready: false,
            _activation: activation,
        }
    }

    fn send(&self, event: PopupEvent) {
        if self.deps.events.try_send(event).is_err() {
            warn!(popup = %self.session.id(), "Popup event channel closed");
        }
    }

    fn receive(&mut self, payload: SelectionPayload, cx: &mut Context<Self>) {
        self.session.receive(payload);
        cx.notify();
    }

    fn run(&mut self, command: MenuCommand, cx: &mut Context<Self>) {
        if let MenuCommand::Dispatch(request, ticket) = command {
            let Some(handle) = self.handle else {
                warn!("Popup window handle missing, dropping dispatch");
                return;
            };
            let receiver = spawn_dispatch(
                self.deps.transform.clone(),
                request,
                ticket,
                self.deps.default_tone,
            );
            cx.spawn(async move |_this, cx: &mut gpui::AsyncApp| {
                if let Ok(settlement) = receiver.recv().await {
                    let _ = cx.update(|cx| {
                        handle.update(cx, |view, window, cx| view.settle(settlement, window, cx))
                    });
                }
            })
            .detach();
        }
        cx.notify();
    }

    fn settle(&mut self, settlement: Settlement, window: &mut Window, cx: &mut Context<Self>) {
        if !self.session.settle(settlement) {
            return;
        }
        let height = self.session.estimate_content_height(&AverageAdvance::default());
        let grown = self.session.content_measured(height);
        window.resize(size(px(grown.width as f32), px(grown.height as f32)));
        cx.notify();
    }

    fn click(&mut self, kind: ActionKind, cx: &mut Context<Self>) {
        let command = self.session.click(kind);
        self.run(command, cx);
    }

    fn choose_tone(&mut self, tone: Tone, cx: &mut Context<Self>) {
        let command = self.session.choose_tone(tone);
        self.run(command, cx);
    }

    fn choose_language(&mut self, language: Language, cx: &mut Context<Self>) {
        let command = self.session.choose_language(language);
        self.run(command, cx);
    }

    fn copy(&mut self, cx: &mut Context<Self>) {
        match self.session.copy_result(copy_to_clipboard, Instant::now()) {
            Ok(true) => {
                cx.spawn(async move |this, cx: &mut gpui::AsyncApp| {
                    Timer::after(NOTIFICATION_DURATION).await;
                    let _ = cx.update(|cx| {
                        this.update(cx, |view, cx| {
                            view.session.tick(Instant::now());
                            cx.notify();
                        })
                    });
                })
                .detach();
            }
            Ok(false) => {}
            Err(e) => warn!(error = %format!("{:#}", e), "Copy failed"),
        }
        cx.notify();
    }


    fn render_actions(&self, cx: &mut Context<Self>) -> impl IntoElement {
        let busy = self.session.result().clone();
        div()
            .flex()
            .flex_wrap()
            .gap(px(6.))
            .children(self.session.actions().iter().enumerate().map(|(ix, action)| {
                let kind = action.kind();
                let loading = busy == ResultArea::Processing(kind);
                let label = if loading {
                    format!("{}...", action.label())
                } else {
                    action.label()
                };
                let enabled = self.session.is_enabled(kind);
                button(("action", ix), label, enabled, ix == 0).when(enabled, |el| {
                    el.on_click(cx.listener(move |this, _event, _window, cx| this.click(kind, cx)))
                })
            }))
    }

    fn render_submenus(&self, cx: &mut Context<Self>) -> impl IntoElement {
        div()
            .flex()
            .flex_wrap()
            .gap(px(4.))
            .when(self.session.tone_submenu_visible(), |el| {
                el.children(Tone::ALL.into_iter().map(|tone| {
                    button(
                        SharedString::from(format!("tone-{}", tone)),
                        tone.as_str().to_string(),
                        true,
                        false,
                    )
                    .on_click(cx.listener(move |this, _event, _window, cx| {
                        this.choose_tone(tone, cx)
                    }))
                }))
            })
            .when(self.session.language_picker_visible(), |el| {
                el.children(Language::PICKER.into_iter().map(|language| {
                    button(
                        SharedString::from(format!("lang-{}", language.code())),
                        language.name().to_string(),
                        true,
                        false,
                    )
                    .on_click(cx.listener(move |this, _event, _window, cx| {
                        this.choose_language(language, cx)
                    }))
                }))
            })
    }

    fn render_result(&self, cx: &mut Context<Self>) -> impl IntoElement {
        let (title, body, color, copyable) = match self.session.result() {
            ResultArea::Hidden => return div(),
            ResultArea::Processing(kind) => (
                kind.result_label().to_string(),
                "Processing...".to_string(),
                MUTED,
                false,
            ),
            ResultArea::Success { kind, text } => {
                (kind.result_label().to_string(), text.clone(), TEXT, true)
            }
            ResultArea::Error { message } => ("Error".to_string(), message.clone(), ERROR, false),
            ResultArea::NeedsConfiguration { message } => {
                ("Setup required".to_string(), message.clone(), MUTED, false)
            }
        };

        div()
            .flex()
            .flex_col()
            .gap(px(6.))
            .p(px(8.))
            .rounded(px(6.))
            .bg(rgb(SURFACE))
            .child(
                div()
                    .flex()
                    .justify_between()
                    .items_center()
                    .child(div().text_xs().text_color(rgb(MUTED)).child(title))
                    .when(copyable, |el| {
                        el.child(
                            button("copy-result", "Copy".to_string(), true, false)
                                .on_click(cx.listener(|this, _event, _window, cx| this.copy(cx))),
                        )
                    }),
            )
            .child(div().text_sm().text_color(rgb(color)).child(body))
    }
}

impl Render for PopupWindow {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        if !self.announced_ready {
            self.announced_ready = true;
            self.send(PopupEvent::Ready(self.session.id()));
        }

        let preview = self
            .session
            .payload()
            .map(|p| p.text.chars().take(120).collect::<String>())
            .unwrap_or_default();
        let notification = self.session.notification(Instant::now()).map(str::to_string);
        let id = self.session.id();

        div()
            .id("grammary-popup")
            .size_full()
            .flex()
            .flex_col()
            .gap(px(10.))
            .p(px(12.))
            .bg(rgb(BACKGROUND))
            .rounded(px(8.))
            .text_color(rgb(TEXT))
            .child(
                div()
                    .flex()
                    .justify_between()
                    .items_center()
                    .child(div().text_sm().child("Grammary"))
                    .child(
                        div()
                            .id("popup-close")
                            .px(px(6.))
                            .cursor_pointer()
                            .text_color(rgb(MUTED))
                            .child("x")
                            .on_click(cx.listener(move |this, _event, _window, _cx| {
                                this.send(PopupEvent::Chrome(id, Message::WindowClose));
                            })),
                    ),
            )
            .child(
                div()
                    .text_xs()
                    .text_color(rgb(MUTED))
                    .overflow_hidden()
                    .text_ellipsis()
                    .child(preview),
            )
            .child(self.render_actions(cx))
            .child(self.render_submenus(cx))
            .child(self.render_result(cx))
            .when_some(notification, |el, message| {
                el.child(
                    div()
                        .px(px(10.))
                        .py(px(4.))
                        .rounded(px(4.))
                        .bg(rgb(ACCENT))
                        .text_xs()
                        .child(message),
                )
            })
    }
}

/// [`PopupHost`] over gpui windows.
struct GpuiPopupHost<'a> {
    cx: &'a mut App,
    windows: &'a mut HashMap<PopupId, WindowHandle<PopupWindow>>,
    deps: &'a PopupDeps,
}

impl PopupHost for GpuiPopupHost<'_> {
    fn open(&mut self, id: PopupId, bounds: Rect) -> anyhow::Result<()> {
        let window_bounds = Bounds {
            origin: point(px(bounds.left as f32), px(bounds.top as f32)),
            size: size(px(bounds.width as f32), px(bounds.height as f32)),
        };
        let deps = self.deps.clone();
        let handle = self.cx.open_window(
            WindowOptions {
                window_bounds: Some(WindowBounds::Windowed(window_bounds)),
                titlebar: None,
                kind: WindowKind::PopUp,
                is_movable: false,
                is_resizable: false,
                window_background: WindowBackgroundAppearance::Transparent,
                focus: true,
                show: true,
                ..Default::default()
            },
            |window, cx| cx.new(|cx| PopupWindow::new(id, deps, window, cx)),
        )?;

        handle.update(self.cx, |view, window, _cx| {
            view.handle = Some(handle);
            window.activate_window();
        })?;
        self.cx.activate(true);
        self.windows.insert(id, handle);
        Ok(())
    }

    fn close(&mut self, id: PopupId) {
        if let Some(handle) = self.windows.remove(&id) {
            let _ = handle.update(self.cx, |view, window, _cx| {
                view.session.close();
                window.remove_window();
            });
        }
    }

    fn push(&mut self, id: PopupId, payload: &SelectionPayload) {
        let Some(handle) = self.windows.get(&id) else {
            warn!(popup = %id, "Push for unknown popup");
            return;
        };
        let payload = payload.clone();
        let _ = handle.update(self.cx, |view, _window, cx| view.receive(payload, cx));
    }
}

/// Owns the popup lifecycle for the process. Lives in a gpui entity.
pub struct PopupController {
    lifecycle: PopupLifecycle,
    windows: HashMap<PopupId, WindowHandle<PopupWindow>>,
    deps: PopupDeps,
    capture: Arc<dyn SelectionCapture>,
}

impl PopupController {
    pub fn new(deps: PopupDeps, capture: Arc<dyn SelectionCapture>) -> Self {
        Self {
            lifecycle: PopupLifecycle::new(Size::new(deps.config.width, deps.config.height)),
            windows: HashMap::new(),
            deps,
            capture,
        }
    }

    /// Capture hotkey pressed: read the OS selection off the UI thread.
    pub fn on_hotkey(&mut self, cx: &mut Context<Self>) {
        if !self.lifecycle.hotkey_pressed(platform::pointer_position()) {
            debug!("Capture already running, ignoring hotkey");
            return;
        }
        let capture = self.capture.clone();
        cx.spawn(async move |this, cx: &mut gpui::AsyncApp| {
            let result = cx
                .background_executor()
                .spawn(async move { capture.capture() })
                .await;
            let _ = cx.update(|cx| this.update(cx, |controller, cx| controller.on_captured(result, cx)));
        })
        .detach();
    }

    fn on_captured(&mut self, result: anyhow::Result<String>, cx: &mut Context<Self>) {
        let displays = platform::display_frames();
        let mut host = GpuiPopupHost {
            cx,
            windows: &mut self.windows,
            deps: &self.deps,
        };
        match self.lifecycle.captured(result, &displays, &mut host) {
            CaptureOutcome::Opened(id) => debug!(popup = %id, "Popup opened"),
            CaptureOutcome::NoSelection => logging::log("POPUP", "No selection captured"),
            CaptureOutcome::Failed(message) => logging::log("POPUP", &message),
            CaptureOutcome::Ignored => {}
        }
    }

    pub fn on_event(&mut self, event: PopupEvent, cx: &mut Context<Self>) {
        let mut host = GpuiPopupHost {
            cx,
            windows: &mut self.windows,
            deps: &self.deps,
        };
        match event {
            PopupEvent::Ready(id) => {
                self.lifecycle.ready(id, &mut host);
            }
            PopupEvent::Blurred(id) => {
                self.lifecycle.blurred(id, &mut host);
            }
            PopupEvent::Chrome(id, Message::WindowClose) => {
                self.lifecycle.close_requested(id, &mut host);
            }
            PopupEvent::Chrome(id, other) => {
                debug!(popup = %id, channel = other.channel(), "Chrome message ignored by popup");
            }
        }
    }
}
