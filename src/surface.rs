//! Controller for one rendering surface: observer, classifier, menu,
//! dispatcher and result application wired into a single owner.
//!
//! The surface's content ([`SurfaceContent`]) is plain data; the controller is
//! driven by explicit calls (`selection_changed`, `scrolled`, `on_frame`,
//! `click`, `poll_settlement`) instead of listeners mutating shared fields.

use std::sync::Arc;
use std::time::Instant;

use crate::apply::{Document, NodeId, ResultCard, TextField};
use crate::config::Config;
use crate::context::{classify, ActionKind, Language, Tone};
use crate::dispatcher::{spawn_dispatch, ResultStatus, Settlement};
use crate::error::GrammaryError;
use crate::geometry::{Rect, Size, Viewport};
use crate::menu::{MenuCommand, MenuController};
use crate::selection::{
    char_slice, FieldFont, Observation, RawSelection, Selection, SelectionObserver, TextMeasure,
};
use crate::transform::TextTransform;

/// Where the surface's current selection lives.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionSite {
    /// The text field's own selection offsets.
    Field,
    /// Characters `start..end` of one text node.
    Text {
        node: NodeId,
        start: usize,
        end: usize,
        bounds: Rect,
        editable: bool,
    },
}

#[derive(Debug, Clone)]
pub struct SurfaceContent {
    pub document: Document,
    pub field: TextField,
    pub field_rect: Rect,
    pub field_font: FieldFont,
    pub site: Option<SelectionSite>,
    pub viewport: Viewport,
}

impl SurfaceContent {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            document: Document::new(),
            field: TextField::default(),
            field_rect: Rect::default(),
            field_font: FieldFont::default(),
            site: None,
            viewport,
        }
    }

    /// What the surface reports to the observer right now.
    pub fn snapshot(&self) -> Option<RawSelection> {
        match self.site.as_ref()? {
            SelectionSite::Field => Some(RawSelection::FormField {
                value: self.field.value.clone(),
                start: self.field.selection_start,
                end: self.field.selection_end,
                field_rect: self.field_rect,
                font: self.field_font.clone(),
            }),
            SelectionSite::Text {
                node,
                start,
                end,
                bounds,
                editable,
            } => {
                let text = self.document.text(*node)?;
                Some(RawSelection::Range {
                    text: char_slice(text, *start, *end).to_string(),
                    bounds: *bounds,
                    editable: *editable,
                })
            }
        }
    }

    fn edit_target(&self) -> Option<EditTarget> {
        match self.site.as_ref()? {
            SelectionSite::Field => Some(EditTarget::Field {
                start: self.field.selection_start,
                end: self.field.selection_end,
                original: self.field.selected_text().to_string(),
            }),
            SelectionSite::Text {
                node,
                start,
                end,
                editable,
                ..
            } => {
                let original = char_slice(self.document.text(*node)?, *start, *end).to_string();
                Some(if *editable {
                    EditTarget::RichText {
                        node: *node,
                        start: *start,
                        end: *end,
                        original,
                    }
                } else {
                    EditTarget::ReadOnly { node: *node }
                })
            }
        }
    }
}

/// Where a result for the open menu will be applied. Taken when the menu is
/// shown and refreshed when an action is dispatched.
#[derive(Debug, Clone, PartialEq)]
enum EditTarget {
    Field {
        start: usize,
        end: usize,
        original: String,
    },
    RichText {
        node: NodeId,
        start: usize,
        end: usize,
        original: String,
    },
    ReadOnly {
        node: NodeId,
    },
}

/// User-visible failure notice, dismissible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
}

/// What applying a settlement did.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Replaced { caret: usize },
    Card(NodeId),
    Failed(Notice),
    /// Setup instructions shown as a notice; the surface is untouched.
    NeedsConfiguration(Notice),
}

pub struct SurfaceController {
    pub content: SurfaceContent,
    observer: SelectionObserver,
    menu: MenuController,
    measure: Box<dyn TextMeasure>,
    transform: Arc<dyn TextTransform>,
    default_tone: Tone,
    menu_size: Size,
    target: Option<EditTarget>,
    inflight: Option<async_channel::Receiver<Settlement>>,
    notices: Vec<Notice>,
}

impl SurfaceController {
    pub fn new(
        content: SurfaceContent,
        config: &Config,
        measure: Box<dyn TextMeasure>,
        transform: Arc<dyn TextTransform>,
    ) -> Self {
        Self {
            content,
            observer: SelectionObserver::new(config.menu.scroll_settle()),
            menu: MenuController::new(&config.menu),
            measure,
            transform,
            default_tone: config.transform.default_tone,
            menu_size: Size::new(220.0, 44.0),
            target: None,
            inflight: None,
            notices: Vec::new(),
        }
    }

    pub fn menu(&self) -> &MenuController {
        &self.menu
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn dismiss_notice(&mut self, index: usize) {
        if index < self.notices.len() {
            self.notices.remove(index);
        }
    }

    /// The renderer measured the menu element.
    pub fn set_menu_size(&mut self, size: Size) {
        self.menu_size = size;
    }

    pub fn selection_changed(&mut self) {
        self.observer.selection_changed();
    }

    pub fn scrolled(&mut self, viewport: Viewport, now: Instant) {
        self.content.viewport = viewport;
        if self.observer.scrolled(now, self.menu.is_open()) {
            self.menu.suspend(now);
        }
    }

    pub fn resized(&mut self, viewport: Viewport) {
        self.content.viewport = viewport;
        self.observer.resized(self.menu.is_open());
    }

    pub fn pointer_down(&mut self, inside_menu: bool, now: Instant) {
        let has_selection = self.content.snapshot().is_some();
        self.menu.pointer_down(inside_menu, has_selection, now);
        if !self.menu.is_open() {
            self.target = None;
        }
    }

    /// Paint-tick entry point.
    pub fn on_frame(&mut self, now: Instant) -> Observation {
        self.menu.tick(now);
        let content = &self.content;
        let observation = self
            .observer
            .on_frame(now, || content.snapshot(), self.measure.as_ref());

        match &observation {
            Observation::Show(selection) => self.show(selection.clone()),
            Observation::Reposition(selection) => {
                self.menu
                    .reposition(selection.clone(), self.content.viewport, self.menu_size);
            }
            Observation::Cleared => self.dismiss(now),
            Observation::Unchanged => {}
        }
        if self.menu.transition().is_shown() {
            self.menu.layout_done(now);
        }
        observation
    }

    fn show(&mut self, selection: Selection) {
        let classification = classify(&selection);
        self.target = self.content.edit_target();
        self.menu.show(
            selection,
            classification,
            self.content.viewport,
            self.menu_size,
        );
    }

    fn run(&mut self, command: MenuCommand) -> bool {
        match command {
            MenuCommand::Dispatch(request, ticket) => {
                // The same text may have been reselected elsewhere without a
                // new Show; apply to where the selection is now
                if let Some(target) = self.content.edit_target() {
                    self.target = Some(target);
                }
                self.inflight = Some(spawn_dispatch(
                    self.transform.clone(),
                    request,
                    ticket,
                    self.default_tone,
                ));
                true
            }
            MenuCommand::SubmenuToggled | MenuCommand::Ignored => false,
        }
    }

    /// Returns true when a dispatch started.
    pub fn click(&mut self, kind: ActionKind) -> bool {
        let command = self.menu.click(kind);
        self.run(command)
    }

    pub fn choose_tone(&mut self, tone: Tone) -> bool {
        let command = self.menu.choose_tone(tone);
        self.run(command)
    }

    pub fn choose_language(&mut self, language: Language) -> bool {
        let command = self.menu.choose_language(language);
        self.run(command)
    }

    pub fn dismiss(&mut self, now: Instant) {
        self.menu.dismiss(now);
        self.target = None;
        self.inflight = None;
    }

    /// Non-blocking check for a finished dispatch.
    pub fn poll_settlement(&mut self, now: Instant) -> Option<Applied> {
        let settlement = self.inflight.as_ref()?.try_recv().ok()?;
        self.inflight = None;
        self.settle(settlement, now)
    }

    /// Blocking variant for callers off the UI loop.
    pub fn wait_settlement(&mut self, now: Instant) -> Option<Applied> {
        let settlement = self.inflight.take()?.recv_blocking().ok()?;
        self.settle(settlement, now)
    }

    fn settle(&mut self, settlement: Settlement, now: Instant) -> Option<Applied> {
        let (settlement, selection) = self.menu.settle(settlement, now)?;
        let target = self.target.take();

        let outcome = match settlement.result.status {
            ResultStatus::NeedsConfiguration => {
                let notice = Notice {
                    message: settlement
                        .result
                        .message
                        .unwrap_or(settlement.result.text),
                };
                self.notices.push(notice.clone());
                return Some(Applied::NeedsConfiguration(notice));
            }
            ResultStatus::Error => Err(GrammaryError::service(
                settlement
                    .result
                    .message
                    .unwrap_or_else(|| "Action failed".to_string()),
            )),
            ResultStatus::Success => self.apply(
                target,
                settlement.request.kind,
                &selection,
                &settlement.result.text,
            ),
        };

        Some(match outcome {
            Ok(applied) => applied,
            Err(e) => {
                tracing::warn!(error = %e, "Result not applied");
                let notice = Notice {
                    message: match &e {
                        // Already a user-facing message from the dispatcher
                        GrammaryError::Service { message, .. } => message.clone(),
                        other => other.user_message(),
                    },
                };
                self.notices.push(notice.clone());
                Applied::Failed(notice)
            }
        })
    }

    fn apply(
        &mut self,
        target: Option<EditTarget>,
        kind: ActionKind,
        selection: &Selection,
        result: &str,
    ) -> crate::error::Result<Applied> {
        match target {
            Some(EditTarget::Field {
                start,
                end,
                original,
            }) => {
                let caret = self.content.field.replace_range(start, end, &original, result)?;
                self.content.site = None;
                Ok(Applied::Replaced { caret })
            }
            Some(EditTarget::RichText {
                node,
                start,
                end,
                original,
            }) => {
                let caret = self
                    .content
                    .document
                    .replace_text(node, start, end, &original, result)?;
                self.content.site = None;
                Ok(Applied::Replaced { caret })
            }
            Some(EditTarget::ReadOnly { node }) => {
                let card = ResultCard {
                    label: kind.result_label().to_string(),
                    original: selection.text.clone(),
                    result: result.to_string(),
                };
                Ok(Applied::Card(self.content.document.insert_result_card(node, card)?))
            }
            None => Err(GrammaryError::Application(
                "no selection target recorded".into(),
            )),
        }
    }
}

#[cfg(test)]
#[path = "surface_tests.rs"]
mod tests;
