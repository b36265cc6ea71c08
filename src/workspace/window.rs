//! gpui rendering of the main window.
//!
//! One window per process. [`open_workspace`] brings an existing one to the
//! front instead of opening a second.

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use gpui::{
    div, prelude::*, px, rgb, size, App, Bounds, Context, FocusHandle, KeyDownEvent,
    MouseButton, MouseDownEvent, MouseMoveEvent, Pixels, Render, ScrollDelta, ScrollWheelEvent,
    SharedString, Task, Timer, TitlebarOptions, Window, WindowBounds, WindowHandle, WindowKind,
    WindowOptions,
};
use parking_lot::Mutex;
use tracing::{debug, info};

use super::editing::{char_index_at, EditKey, FieldEditor};
use super::settings::{KeyForm, KeyStatus};
use super::{
    clamp_scroll, field_rect, menu_origin, CONTENT_PADDING, FIELD_HEIGHT, FIELD_PADDING_X,
    HEADER_HEIGHT,
};
use crate::config::Config;
use crate::context::{ActionKind, Language, Tone};
use crate::geometry::{Size, Viewport};
use crate::hotkeys;
use crate::logging;
use crate::menu::MenuState;
use crate::popup::window::{button, ACCENT, BACKGROUND, ERROR, MUTED, SURFACE, TEXT};
use crate::protocol::Backend;
use crate::selection::{char_slice, AverageAdvance, FieldFont, Observation};
use crate::surface::{SelectionSite, SurfaceContent, SurfaceController};
use crate::transform::TextTransform;

const WINDOW_WIDTH: f32 = 520.;
const WINDOW_HEIGHT: f32 = 560.;
/// Paint tick for the observer and the menu animation.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);
const FIELD_FONT_SIZE: f64 = 14.0;
/// Pixels per wheel line.
const SCROLL_LINE: f32 = 20.;
const ACTIVITY_LINES: usize = 8;
const MENU_WIDTH: f64 = 240.0;
const MENU_HEIGHT: f64 = 44.0;

static WORKSPACE_WINDOW: OnceLock<Mutex<Option<WindowHandle<WorkspaceWindow>>>> =
    OnceLock::new();

/// What the main window needs.
#[derive(Clone)]
pub struct WorkspaceDeps {
    pub config: Config,
    pub transform: Arc<dyn TextTransform>,
    pub backend: Arc<Backend>,
}

pub struct WorkspaceWindow {
    surface: SurfaceController,
    editor: FieldEditor,
    key_form: KeyForm,
    backend: Arc<Backend>,
    measure: AverageAdvance,
    hotkey: String,
    field_focus: FocusHandle,
    key_focus: FocusHandle,
    dragging: bool,
    /// Last shown menu, drawn while it fades out after `state` is cleared.
    fading_menu: Option<MenuState>,
    _frames: Task<()>,
}

impl WorkspaceWindow {
    fn new(deps: WorkspaceDeps, window: &mut Window, cx: &mut Context<Self>) -> Self {
        let viewport_size = window.viewport_size();
        let width: f32 = viewport_size.width.into();
        let height: f32 = viewport_size.height.into();
        let viewport = Viewport::new(width as f64, height as f64);

        let mut content = SurfaceContent::new(viewport);
        content.field_rect = field_rect(viewport);
        content.field_font = FieldFont {
            size: FIELD_FONT_SIZE,
            ..FieldFont::default()
        };
        content.site = Some(SelectionSite::Field);

        let mut surface = SurfaceController::new(
            content,
            &deps.config,
            Box::new(AverageAdvance::default()),
            deps.transform.clone(),
        );
        surface.set_menu_size(Size::new(MENU_WIDTH, MENU_HEIGHT));

        let mut key_form = KeyForm::default();
        key_form.load(&deps.backend);

        let frames = cx.spawn(async move |this, cx: &mut gpui::AsyncApp| loop {
            Timer::after(FRAME_INTERVAL).await;
            let alive = matches!(
                cx.update(|cx| this.update(cx, |view, cx| view.frame(cx))),
                Ok(Ok(()))
            );
            if !alive {
                break;
            }
        });

        Self {
            surface,
            editor: FieldEditor::default(),
            key_form,
            backend: deps.backend,
            measure: AverageAdvance::default(),
            hotkey: hotkeys::hotkey_display(&deps.config.hotkey),
            field_focus: cx.focus_handle(),
            key_focus: cx.focus_handle(),
            dragging: false,
            fading_menu: None,
            _frames: frames,
        }
    }

    /// Paint tick: run the observer, pick up finished dispatches, keep the
    /// menu animation going.
    fn frame(&mut self, cx: &mut Context<Self>) {
        let now = Instant::now();
        let observation = self.surface.on_frame(now);
        if let Some(state) = self.surface.menu().state() {
            self.fading_menu = Some(state.clone());
        }

        let applied = self.surface.poll_settlement(now);
        if let Some(applied) = &applied {
            debug!(?applied, "Result settled");
            self.editor.sync(&self.surface.content.field);
        }

        let mounted = self.surface.menu().transition().is_mounted();
        if !mounted {
            self.fading_menu = None;
        }
        if observation != Observation::Unchanged || applied.is_some() || mounted {
            cx.notify();
        }
    }

    fn sync_viewport(&mut self, window: &Window) {
        let viewport_size = window.viewport_size();
        let width: f32 = viewport_size.width.into();
        let height: f32 = viewport_size.height.into();
        let current = self.surface.content.viewport;
        if (current.width, current.height) == (width as f64, height as f64) {
            return;
        }
        let viewport =
            Viewport::new(width as f64, height as f64).scrolled(current.scroll_x, current.scroll_y);
        self.surface.resized(viewport);
        self.surface.content.field_rect = field_rect(viewport);
    }

    fn scroll(&mut self, event: &ScrollWheelEvent, cx: &mut Context<Self>) {
        let delta: f32 = match event.delta {
            ScrollDelta::Lines(point) => point.y * SCROLL_LINE,
            ScrollDelta::Pixels(point) => point.y.into(),
        };
        let current = self.surface.content.viewport;
        let scroll_y = clamp_scroll(current, -(delta as f64));
        if scroll_y == current.scroll_y {
            return;
        }
        let viewport = current.scrolled(current.scroll_x, scroll_y);
        self.surface.scrolled(viewport, Instant::now());
        self.surface.content.field_rect = field_rect(viewport);
        cx.notify();
    }

    fn field_index_at(&self, x: Pixels) -> usize {
        let x: f32 = x.into();
        let content = &self.surface.content;
        char_index_at(
            &self.measure,
            &content.field_font,
            &content.field.value,
            x as f64 - content.field_rect.left - FIELD_PADDING_X,
        )
    }

    fn field_key(&mut self, event: &KeyDownEvent, cx: &mut Context<Self>) {
        let keystroke = &event.keystroke;
        if keystroke.key == "escape" {
            self.surface.dismiss(Instant::now());
            cx.notify();
            return;
        }
        let Some(key) = EditKey::parse(
            &keystroke.key,
            keystroke.modifiers.platform,
            keystroke.key_char.as_deref(),
        ) else {
            return;
        };
        let effect = self
            .editor
            .apply(&mut self.surface.content.field, key, keystroke.modifiers.shift);
        if effect.any() {
            self.surface.selection_changed();
            cx.notify();
        }
    }

    fn field_mouse_down(
        &mut self,
        event: &MouseDownEvent,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        window.focus(&self.field_focus);
        self.surface.pointer_down(false, Instant::now());
        let index = self.field_index_at(event.position.x);
        let effect = self
            .editor
            .press(&mut self.surface.content.field, index, event.modifiers.shift);
        self.dragging = true;
        if effect.any() {
            self.surface.selection_changed();
        }
        cx.stop_propagation();
        cx.notify();
    }

    fn field_mouse_move(&mut self, event: &MouseMoveEvent, cx: &mut Context<Self>) {
        if !self.dragging || event.pressed_button != Some(MouseButton::Left) {
            return;
        }
        let index = self.field_index_at(event.position.x);
        if self.editor.drag(&mut self.surface.content.field, index).any() {
            self.surface.selection_changed();
            cx.notify();
        }
    }

    fn key_input_key(&mut self, event: &KeyDownEvent, cx: &mut Context<Self>) {
        let keystroke = &event.keystroke;
        if keystroke.key == "enter" {
            self.save_key(cx);
            return;
        }
        if let Some(key) = EditKey::parse(
            &keystroke.key,
            keystroke.modifiers.platform,
            keystroke.key_char.as_deref(),
        ) {
            if self.key_form.edit(key, keystroke.modifiers.shift).any() {
                cx.notify();
            }
        }
    }

    fn save_key(&mut self, cx: &mut Context<Self>) {
        if self.key_form.save(&self.backend) {
            logging::log("WORKSPACE", "API key saved");
        }
        cx.notify();
    }

    fn click(&mut self, kind: ActionKind, cx: &mut Context<Self>) {
        self.surface.click(kind);
        cx.notify();
    }

    fn choose_tone(&mut self, tone: Tone, cx: &mut Context<Self>) {
        self.surface.choose_tone(tone);
        cx.notify();
    }

    fn choose_language(&mut self, language: Language, cx: &mut Context<Self>) {
        self.surface.choose_language(language);
        cx.notify();
    }

    fn render_field(&self, window: &Window, cx: &mut Context<Self>) -> impl IntoElement {
        let field = &self.surface.content.field;
        let focused = self.field_focus.is_focused(window);
        let (start, end) = (field.selection_start, field.selection_end);
        let before = char_slice(&field.value, 0, start).to_string();
        let selected = char_slice(&field.value, start, end).to_string();
        let after = char_slice(&field.value, end, usize::MAX).to_string();
        let empty = field.value.is_empty();

        div()
            .id("scratch-field")
            .track_focus(&self.field_focus)
            .on_key_down(cx.listener(|this, event: &KeyDownEvent, _window, cx| {
                this.field_key(event, cx)
            }))
            .on_mouse_down(
                MouseButton::Left,
                cx.listener(|this, event: &MouseDownEvent, window, cx| {
                    this.field_mouse_down(event, window, cx)
                }),
            )
            .on_mouse_move(cx.listener(|this, event: &MouseMoveEvent, _window, cx| {
                this.field_mouse_move(event, cx)
            }))
            .h(px(FIELD_HEIGHT as f32))
            .w_full()
            .flex()
            .items_center()
            .px(px(FIELD_PADDING_X as f32))
            .rounded(px(6.))
            .bg(rgb(SURFACE))
            .border_1()
            .border_color(rgb(if focused { ACCENT } else { SURFACE }))
            .cursor_text()
            .overflow_hidden()
            .text_size(px(FIELD_FONT_SIZE as f32))
            .when(empty && !focused, |el| {
                el.child(
                    div()
                        .text_color(rgb(MUTED))
                        .child("Type or paste text, then select part of it"),
                )
            })
            .when(!empty || focused, |el| {
                el.child(div().child(before))
                    .when(focused && selected.is_empty(), |el| {
                        el.child(div().w(px(2.)).h(px(18.)).bg(rgb(TEXT)))
                    })
                    .child(div().bg(rgb(ACCENT)).child(selected))
                    .child(div().child(after))
            })
    }

    fn render_menu(&self, now: Instant, cx: &mut Context<Self>) -> Option<impl IntoElement> {
        let menu = self.surface.menu();
        if !menu.transition().is_mounted() {
            return None;
        }
        let interactive = menu.state().is_some();
        let state = menu.state().or(self.fading_menu.as_ref())?;
        let appearance = menu.appearance(now);
        let (left, top) = menu_origin(&state.placement, self.surface.content.viewport, appearance);

        let actions = state.actions.iter().enumerate().map(|(ix, action)| {
            let kind = action.kind();
            let label = if state.is_loading(kind) {
                format!("{}...", action.label())
            } else {
                action.label()
            };
            let enabled = interactive && state.is_enabled(kind);
            button(("menu-action", ix), label, enabled, ix == 0).when(enabled, |el| {
                el.on_click(cx.listener(move |this, _event, _window, cx| this.click(kind, cx)))
            })
        });

        Some(
            div()
                .id("selection-menu")
                .absolute()
                .left(px(left))
                .top(px(top))
                .max_w(px(MENU_WIDTH as f32 * 1.5))
                .opacity(appearance.opacity)
                .flex()
                .flex_col()
                .gap(px(4.))
                .p(px(6.))
                .rounded(px(8.))
                .bg(rgb(BACKGROUND))
                .border_1()
                .border_color(rgb(SURFACE))
                .on_mouse_down(
                    MouseButton::Left,
                    cx.listener(|this, _event: &MouseDownEvent, _window, cx| {
                        this.surface.pointer_down(true, Instant::now());
                        cx.stop_propagation();
                    }),
                )
                .child(div().flex().flex_wrap().gap(px(4.)).children(actions))
                .when(interactive && state.tone_submenu_visible, |el| {
                    el.child(div().flex().flex_wrap().gap(px(4.)).children(
                        Tone::ALL.into_iter().map(|tone| {
                            button(
                                SharedString::from(format!("menu-tone-{}", tone)),
                                tone.as_str().to_string(),
                                true,
                                false,
                            )
                            .on_click(cx.listener(move |this, _event, _window, cx| {
                                this.choose_tone(tone, cx)
                            }))
                        }),
                    ))
                })
                .when(interactive && state.language_picker_visible, |el| {
                    el.child(div().flex().flex_wrap().gap(px(4.)).children(
                        Language::PICKER.into_iter().map(|language| {
                            button(
                                SharedString::from(format!("menu-lang-{}", language.code())),
                                language.name().to_string(),
                                true,
                                false,
                            )
                            .on_click(cx.listener(move |this, _event, _window, cx| {
                                this.choose_language(language, cx)
                            }))
                        }),
                    ))
                }),
        )
    }

    fn render_notices(&self, cx: &mut Context<Self>) -> impl IntoElement {
        div()
            .flex()
            .flex_col()
            .gap(px(4.))
            .mt(px(8.))
            .children(self.surface.notices().iter().enumerate().map(|(ix, notice)| {
                div()
                    .flex()
                    .justify_between()
                    .items_center()
                    .px(px(10.))
                    .py(px(6.))
                    .rounded(px(4.))
                    .bg(rgb(SURFACE))
                    .text_xs()
                    .text_color(rgb(ERROR))
                    .child(notice.message.clone())
                    .child(
                        div()
                            .id(("dismiss-notice", ix))
                            .px(px(6.))
                            .cursor_pointer()
                            .text_color(rgb(MUTED))
                            .child("x")
                            .on_click(cx.listener(move |this, _event, _window, cx| {
                                this.surface.dismiss_notice(ix);
                                cx.notify();
                            })),
                    )
            }))
    }

    fn render_key_form(&self, window: &Window, cx: &mut Context<Self>) -> impl IntoElement {
        let focused = self.key_focus.is_focused(window);
        let masked = self.key_form.masked_input();
        let (status, color) = match self.key_form.status() {
            Some(KeyStatus::Stored(masked)) => (format!("Stored: {}", masked), MUTED),
            Some(KeyStatus::Missing) | None => (
                "No key stored. Actions will ask for one until it is added.".to_string(),
                MUTED,
            ),
            Some(KeyStatus::Saved) => ("Saved".to_string(), ACCENT),
            Some(KeyStatus::Failed(message)) => (message.clone(), ERROR),
        };

        div()
            .flex()
            .flex_col()
            .gap(px(6.))
            .mt(px(24.))
            .child(div().text_sm().child("OpenRouter API key"))
            .child(
                div()
                    .flex()
                    .gap(px(8.))
                    .items_center()
                    .child(
                        div()
                            .id("api-key-input")
                            .track_focus(&self.key_focus)
                            .on_key_down(cx.listener(|this, event: &KeyDownEvent, _window, cx| {
                                this.key_input_key(event, cx)
                            }))
                            .on_click(cx.listener(|this, _event, window, cx| {
                                window.focus(&this.key_focus);
                                cx.notify();
                            }))
                            .flex_1()
                            .h(px(32.))
                            .flex()
                            .items_center()
                            .px(px(10.))
                            .rounded(px(6.))
                            .bg(rgb(SURFACE))
                            .border_1()
                            .border_color(rgb(if focused { ACCENT } else { SURFACE }))
                            .cursor_text()
                            .text_sm()
                            .when(masked.is_empty(), |el| {
                                el.text_color(rgb(MUTED)).child("sk-or-...")
                            })
                            .when(!masked.is_empty(), |el| el.child(masked)),
                    )
                    .child(
                        button("save-key", "Save".to_string(), true, true)
                            .on_click(cx.listener(|this, _event, _window, cx| this.save_key(cx))),
                    ),
            )
            .child(div().text_xs().text_color(rgb(color)).child(status))
    }

    fn render_activity(&self) -> impl IntoElement {
        let lines = logging::get_last_logs(ACTIVITY_LINES);
        div()
            .flex()
            .flex_col()
            .mt(px(24.))
            .gap(px(2.))
            .child(div().text_sm().child("Recent activity"))
            .children(lines.into_iter().rev().map(|line| {
                div()
                    .text_xs()
                    .text_color(rgb(MUTED))
                    .overflow_hidden()
                    .text_ellipsis()
                    .child(line)
            }))
    }
}

impl Render for WorkspaceWindow {
    fn render(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        self.sync_viewport(window);
        let now = Instant::now();
        let scroll_y = self.surface.content.viewport.scroll_y as f32;

        let content = div()
            .absolute()
            .top(px(-scroll_y))
            .left(px(0.))
            .w_full()
            .flex()
            .flex_col()
            .p(px(CONTENT_PADDING as f32))
            .child(
                div()
                    .h(px(HEADER_HEIGHT as f32))
                    .flex()
                    .flex_col()
                    .gap(px(4.))
                    .child(div().text_lg().child("Grammary"))
                    .child(div().text_xs().text_color(rgb(MUTED)).child(format!(
                        "Select text below, or select text anywhere and press {}",
                        self.hotkey
                    ))),
            )
            .child(self.render_field(window, cx))
            .child(self.render_notices(cx))
            .child(self.render_key_form(window, cx))
            .child(self.render_activity());

        div()
            .id("workspace")
            .relative()
            .size_full()
            .overflow_hidden()
            .bg(rgb(BACKGROUND))
            .text_color(rgb(TEXT))
            .on_mouse_down(
                MouseButton::Left,
                cx.listener(|this, _event: &MouseDownEvent, _window, cx| {
                    this.surface.pointer_down(false, Instant::now());
                    cx.notify();
                }),
            )
            .on_mouse_up(
                MouseButton::Left,
                cx.listener(|this, _event: &gpui::MouseUpEvent, _window, _cx| {
                    this.dragging = false;
                }),
            )
            .on_scroll_wheel(cx.listener(|this, event: &ScrollWheelEvent, _window, cx| {
                this.scroll(event, cx)
            }))
            .child(content)
            .children(self.render_menu(now, cx))
    }
}

/// Open the main window, or bring the open one to the front.
pub fn open_workspace(deps: &WorkspaceDeps, cx: &mut App) -> anyhow::Result<()> {
    let slot = WORKSPACE_WINDOW.get_or_init(|| Mutex::new(None));
    let mut guard = slot.lock();

    if let Some(handle) = *guard {
        let reused = handle
            .update(cx, |view, window, cx| {
                window.activate_window();
                window.focus(&view.field_focus);
                view.key_form.load(&view.backend);
                cx.notify();
            })
            .is_ok();
        if reused {
            cx.activate(true);
            logging::log("WORKSPACE", "Main window brought to front");
            return Ok(());
        }
        *guard = None;
    }

    let deps = deps.clone();
    let handle = cx.open_window(
        WindowOptions {
            window_bounds: Some(WindowBounds::Windowed(Bounds::centered(
                None,
                size(px(WINDOW_WIDTH), px(WINDOW_HEIGHT)),
                cx,
            ))),
            titlebar: Some(TitlebarOptions {
                title: Some("Grammary".into()),
                ..Default::default()
            }),
            kind: WindowKind::Normal,
            focus: true,
            show: true,
            ..Default::default()
        },
        |window, cx| cx.new(|cx| WorkspaceWindow::new(deps, window, cx)),
    )?;

    cx.activate(true);
    handle.update(cx, |view, window, _cx| {
        window.activate_window();
        window.focus(&view.field_focus);
    })?;
    *guard = Some(handle);
    info!("Main window opened");
    logging::log("WORKSPACE", "Main window opened");
    Ok(())
}
